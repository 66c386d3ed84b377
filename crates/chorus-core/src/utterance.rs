//! Utterance normalization.

/// A single user turn's input, normalized for matching.
///
/// Tokens are split on every character that is neither alphanumeric nor
/// an apostrophe. Matching uses the lowercase tokens; slot values are
/// rebuilt from the original-case tokens so "call John" yields "John".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    text: String,
    tokens: Vec<String>,
    originals: Vec<String>,
}

impl Utterance {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let originals: Vec<String> = text
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .map(|t| t.trim_matches('\''))
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        let tokens = originals.iter().map(|t| t.to_lowercase()).collect();
        Self {
            text,
            tokens,
            originals,
        }
    }

    /// The raw text as received.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Lowercase tokens.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Tokens in their original case.
    pub fn original_tokens(&self) -> &[String] {
        &self.originals
    }

    /// Join the original tokens in `start..end` with single spaces.
    pub fn span(&self, start: usize, end: usize) -> String {
        self.originals
            .get(start..end)
            .map(|s| s.join(" "))
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl From<&str> for Utterance {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}
