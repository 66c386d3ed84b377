//! Spoken number parsing.
//!
//! Continuation skills such as "the second one" need to turn words into
//! numbers. The parser is optional on the [`SkillContext`](crate::SkillContext):
//! skills that rely on it only offer themselves when it is present.

use crate::utterance::Utterance;

/// Extracts a number from an utterance.
pub trait NumberParser: Send + Sync {
    /// The first number mentioned in `utterance`, cardinal or ordinal.
    fn first_number(&self, utterance: &Utterance) -> Option<u64>;
}

const CARDINALS: &[(&str, u64)] = &[
    ("zero", 0),
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
    ("eleven", 11),
    ("twelve", 12),
    ("thirteen", 13),
    ("fourteen", 14),
    ("fifteen", 15),
    ("sixteen", 16),
    ("seventeen", 17),
    ("eighteen", 18),
    ("nineteen", 19),
    ("twenty", 20),
];

const ORDINALS: &[(&str, u64)] = &[
    ("first", 1),
    ("second", 2),
    ("third", 3),
    ("fourth", 4),
    ("fifth", 5),
    ("sixth", 6),
    ("seventh", 7),
    ("eighth", 8),
    ("ninth", 9),
    ("tenth", 10),
    ("last", u64::MAX),
];

/// English number parser.
///
/// Understands cardinals up to twenty, ordinals up to "tenth", digit
/// strings and suffixed forms like `3rd`. "last" yields `u64::MAX` so a
/// caller can clamp it to the end of its list.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnglishNumberParser;

impl EnglishNumberParser {
    fn parse_token(token: &str) -> Option<u64> {
        if let Some(&(_, n)) = CARDINALS.iter().chain(ORDINALS).find(|(w, _)| *w == token) {
            return Some(n);
        }
        if let Ok(n) = token.parse::<u64>() {
            return Some(n);
        }
        ["st", "nd", "rd", "th"]
            .iter()
            .find_map(|suffix| token.strip_suffix(suffix))
            .and_then(|digits| digits.parse().ok())
    }
}

impl NumberParser for EnglishNumberParser {
    fn first_number(&self, utterance: &Utterance) -> Option<u64> {
        utterance
            .tokens()
            .iter()
            .find_map(|t| Self::parse_token(t))
    }
}
