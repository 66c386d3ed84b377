//! Recognizers: scoring an utterance against compiled sentences.
//!
//! [`StandardRecognizer`] aligns the utterance with every expanded sentence
//! path of one section and keeps the best confidence. The alignment is a
//! small dynamic program that maximizes
//!
//! ```text
//! 2 * matched_words + filled_captures - 2 * extra_tokens
//! ```
//!
//! where a capture consumes one or more contiguous tokens, a path word may
//! be left unmatched, and utterance tokens not covered by the path count
//! as extra. Ties prefer the alignment with more matched words. The
//! confidence of the chosen alignment is
//!
//! ```text
//! (matched + 0.5 * filled) / (words + 0.5 * captures + extra)
//! ```
//!
//! scaled by the section's [`Specificity`](chorus_sentences::Specificity)
//! weight. Scoring is a pure function of the utterance and the data.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use chorus_sentences::{PatternElement, RecognizerData};

use crate::error::RecognizerFault;
use crate::utterance::Utterance;

/// Slot values extracted from an utterance, keyed by slot name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Slots(BTreeMap<String, Vec<String>>);

impl Slots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a captured value for `name`.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.entry(name.into()).or_default().push(value.into());
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// The first value captured for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(|v| v.first()).map(String::as_str)
    }

    /// Every value captured for `name`.
    pub fn get_all(&self, name: &str) -> &[String] {
        self.0.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

/// A recognizer's verdict on one utterance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recognition {
    /// Confidence in `[0, 1]`; higher is better.
    pub score: f32,
    pub slots: Slots,
}

impl Recognition {
    pub fn new(score: f32, slots: Slots) -> Self {
        Self { score, slots }
    }

    /// A zero-confidence result.
    pub fn none() -> Self {
        Self::new(0.0, Slots::new())
    }
}

/// Scores utterances for one skill.
///
/// Implementations must be deterministic: the same utterance always
/// yields the same score and slots.
pub trait Recognizer: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Score `utterance`.
    fn score(&self, utterance: &Utterance) -> Result<Recognition, RecognizerFault>;
}

/// Recognizer backed by one compiled sentence section.
#[derive(Debug, Clone)]
pub struct StandardRecognizer {
    data: Arc<RecognizerData>,
}

impl StandardRecognizer {
    pub fn new(data: Arc<RecognizerData>) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &RecognizerData {
        &self.data
    }

    fn validate(&self) -> Result<(), RecognizerFault> {
        let section = || self.data.section_id.clone();
        if self.data.sentences.is_empty() {
            return Err(RecognizerFault::NoSentences { section: section() });
        }
        for (index, path) in self.data.sentences.iter().enumerate() {
            if path.is_empty() {
                return Err(RecognizerFault::EmptySentence {
                    section: section(),
                    index,
                });
            }
            if path
                .iter()
                .any(|e| matches!(e, PatternElement::Capture(name) if name.is_empty()))
            {
                return Err(RecognizerFault::UnnamedCapture {
                    section: section(),
                    index,
                });
            }
        }
        Ok(())
    }
}

impl Recognizer for StandardRecognizer {
    fn name(&self) -> &str {
        &self.data.section_id
    }

    fn score(&self, utterance: &Utterance) -> Result<Recognition, RecognizerFault> {
        self.validate()?;
        let weight = self.data.specificity.weight();

        let mut best: Option<Recognition> = None;
        for path in &self.data.sentences {
            let alignment = align(path, utterance.tokens());
            let score = alignment.confidence(path) * weight;
            if best.as_ref().is_none_or(|b| score > b.score) {
                best = Some(Recognition::new(score, alignment.slots(path, utterance)));
            }
        }
        Ok(best.unwrap_or_else(Recognition::none))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Start,
    WordMatch,
    WordSkip,
    CaptureSkip,
    CaptureFill { from: usize },
    Extra,
}

#[derive(Debug, Clone, Copy)]
struct Cell {
    objective: i32,
    matched: u32,
    filled: u32,
    extra: u32,
    step: Step,
}

impl Cell {
    fn key(&self) -> (i32, u32) {
        (self.objective, self.matched)
    }
}

/// Result of aligning one path with the utterance tokens.
struct Alignment {
    matched: u32,
    filled: u32,
    extra: u32,
    /// `(element index, token start, token end)` for each filled capture.
    captures: Vec<(usize, usize, usize)>,
}

impl Alignment {
    fn confidence(&self, path: &[PatternElement]) -> f32 {
        let captures = path.iter().filter(|e| e.is_capture()).count() as f32;
        let words = path.len() as f32 - captures;
        let denominator = words + 0.5 * captures + self.extra as f32;
        if denominator <= 0.0 {
            return 0.0;
        }
        (self.matched as f32 + 0.5 * self.filled as f32) / denominator
    }

    fn slots(&self, path: &[PatternElement], utterance: &Utterance) -> Slots {
        let mut slots = Slots::new();
        for &(element, start, end) in &self.captures {
            if let Some(PatternElement::Capture(name)) = path.get(element) {
                slots.insert(name.clone(), utterance.span(start, end));
            }
        }
        slots
    }
}

fn relax(table: &mut [Vec<Option<Cell>>], i: usize, j: usize, candidate: Cell) {
    let slot = &mut table[i][j];
    match slot {
        Some(current) if current.key() >= candidate.key() => {}
        _ => *slot = Some(candidate),
    }
}

fn align(path: &[PatternElement], tokens: &[String]) -> Alignment {
    let m = path.len();
    let n = tokens.len();
    let mut table: Vec<Vec<Option<Cell>>> = vec![vec![None; n + 1]; m + 1];
    table[0][0] = Some(Cell {
        objective: 0,
        matched: 0,
        filled: 0,
        extra: 0,
        step: Step::Start,
    });

    for i in 0..=m {
        for j in 0..=n {
            let Some(cell) = table[i][j] else { continue };

            if j < n {
                relax(
                    &mut table,
                    i,
                    j + 1,
                    Cell {
                        objective: cell.objective - 2,
                        extra: cell.extra + 1,
                        step: Step::Extra,
                        ..cell
                    },
                );
            }
            if i == m {
                continue;
            }

            match &path[i] {
                PatternElement::Word(word) => {
                    if j < n && tokens[j] == *word {
                        relax(
                            &mut table,
                            i + 1,
                            j + 1,
                            Cell {
                                objective: cell.objective + 2,
                                matched: cell.matched + 1,
                                step: Step::WordMatch,
                                ..cell
                            },
                        );
                    }
                    relax(&mut table, i + 1, j, Cell { step: Step::WordSkip, ..cell });
                }
                PatternElement::Capture(_) => {
                    relax(&mut table, i + 1, j, Cell { step: Step::CaptureSkip, ..cell });
                    for end in j + 1..=n {
                        relax(
                            &mut table,
                            i + 1,
                            end,
                            Cell {
                                objective: cell.objective + 1,
                                filled: cell.filled + 1,
                                step: Step::CaptureFill { from: j },
                                ..cell
                            },
                        );
                    }
                }
            }
        }
    }

    let Some(last) = table[m][n] else {
        return Alignment {
            matched: 0,
            filled: 0,
            extra: n as u32,
            captures: Vec::new(),
        };
    };

    let mut captures = Vec::new();
    let (mut i, mut j) = (m, n);
    while let Some(cell) = table[i][j] {
        match cell.step {
            Step::Start => break,
            Step::WordMatch => {
                i -= 1;
                j -= 1;
            }
            Step::WordSkip | Step::CaptureSkip => i -= 1,
            Step::CaptureFill { from } => {
                captures.push((i - 1, from, j));
                i -= 1;
                j = from;
            }
            Step::Extra => j -= 1,
        }
    }
    captures.reverse();

    Alignment {
        matched: last.matched,
        filled: last.filled,
        extra: last.extra,
        captures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chorus_sentences::Specificity;

    fn w(s: &str) -> PatternElement {
        PatternElement::Word(s.into())
    }

    fn c(s: &str) -> PatternElement {
        PatternElement::Capture(s.into())
    }

    fn recognizer(specificity: Specificity, sentences: Vec<Vec<PatternElement>>) -> StandardRecognizer {
        StandardRecognizer::new(Arc::new(RecognizerData {
            section_id: "test".into(),
            specificity,
            sentences,
        }))
    }

    fn telephone() -> StandardRecognizer {
        recognizer(
            Specificity::High,
            vec![vec![w("call"), c("contact")], vec![w("phone"), c("contact")]],
        )
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn exact_match_with_capture() {
        let r = telephone().score(&Utterance::new("call John")).unwrap();
        assert!(approx(r.score, 1.0));
        assert_eq!(r.slots.get("contact"), Some("John"));
    }

    #[test]
    fn multi_token_capture_keeps_case() {
        let r = telephone().score(&Utterance::new("phone Mary Ann Smith")).unwrap();
        assert!(approx(r.score, 1.0));
        assert_eq!(r.slots.get("contact"), Some("Mary Ann Smith"));
    }

    #[test]
    fn leading_extra_token_penalized() {
        let r = telephone().score(&Utterance::new("please call john")).unwrap();
        assert!(approx(r.score, 0.6), "score was {}", r.score);
        assert_eq!(r.slots.get("contact"), Some("john"));
    }

    #[test]
    fn gibberish_stays_below_threshold() {
        let r = telephone().score(&Utterance::new("asdkjasd")).unwrap();
        assert!(r.score < 0.5, "score was {}", r.score);
    }

    #[test]
    fn empty_utterance_scores_zero() {
        let r = telephone().score(&Utterance::new("")).unwrap();
        assert!(approx(r.score, 0.0));
        assert!(r.slots.is_empty());
    }

    #[test]
    fn specificity_scales_score() {
        let low = recognizer(Specificity::Low, vec![vec![w("what"), w("time"), w("is"), w("it")]]);
        let r = low.score(&Utterance::new("what time is it")).unwrap();
        assert!(approx(r.score, 0.9));
    }

    #[test]
    fn missing_words_reduce_score() {
        let r = recognizer(Specificity::High, vec![vec![w("what"), w("time"), w("is"), w("it")]])
            .score(&Utterance::new("what time"))
            .unwrap();
        assert!(approx(r.score, 0.5));
    }

    #[test]
    fn earliest_path_wins_ties() {
        let r = recognizer(
            Specificity::High,
            vec![vec![w("yes"), c("first")], vec![w("yes"), c("second")]],
        )
        .score(&Utterance::new("yes please"))
        .unwrap();
        assert!(r.slots.contains("first"));
        assert!(!r.slots.contains("second"));
    }

    #[test]
    fn deterministic() {
        let rec = telephone();
        let u = Utterance::new("could you call my brother Tom");
        let a = rec.score(&u).unwrap();
        let b = rec.score(&u).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn malformed_data_faults() {
        let empty = recognizer(Specificity::High, vec![]);
        assert!(matches!(
            empty.score(&Utterance::new("hi")),
            Err(RecognizerFault::NoSentences { .. })
        ));

        let blank_path = recognizer(Specificity::High, vec![vec![w("hi")], vec![]]);
        assert!(matches!(
            blank_path.score(&Utterance::new("hi")),
            Err(RecognizerFault::EmptySentence { index: 1, .. })
        ));

        let unnamed = recognizer(Specificity::High, vec![vec![w("hi"), c("")]]);
        assert!(matches!(
            unnamed.score(&Utterance::new("hi")),
            Err(RecognizerFault::UnnamedCapture { index: 0, .. })
        ));
    }

    #[test]
    fn slots_accessors() {
        let slots = Slots::new().with("who", "Ann").with("who", "Bob");
        assert_eq!(slots.get("who"), Some("Ann"));
        assert_eq!(slots.get_all("who").len(), 2);
        assert!(slots.get_all("missing").is_empty());
        assert_eq!(slots.len(), 1);
    }
}
