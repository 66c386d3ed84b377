//! Compiled sentence data.
//!
//! A [`RecognizerData`] is the immutable output of compiling one section:
//! every sentence expanded into concrete paths of words and captures.
//! Only ordered containers are used, so serializing the same compiled
//! section always produces the same bytes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How specific a section's sentences are.
///
/// Specific sections get a slightly higher weight so that, for example,
/// "call mom" prefers a telephone section over a generic search section
/// that also matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Specificity {
    Low,
    Medium,
    High,
}

impl Specificity {
    /// Multiplier applied to raw alignment scores.
    pub fn weight(&self) -> f32 {
        match self {
            Self::Low => 0.9,
            Self::Medium => 0.95,
            Self::High => 1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Specificity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Specificity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!(
                "unknown specificity '{other}' (expected low, medium or high)"
            )),
        }
    }
}

/// One element of an expanded sentence path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternElement {
    /// A literal, lowercase word.
    Word(String),
    /// A capture slot consuming one or more utterance words.
    Capture(String),
}

impl PatternElement {
    pub fn is_capture(&self) -> bool {
        matches!(self, Self::Capture(_))
    }
}

/// Compiled recognizer data for one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizerData {
    /// Section identifier.
    pub section_id: String,

    /// Section specificity.
    pub specificity: Specificity,

    /// Expanded sentence paths, in source order.
    pub sentences: Vec<Vec<PatternElement>>,
}

impl RecognizerData {
    /// Names of all captures used by any sentence, sorted and deduplicated.
    pub fn capture_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .sentences
            .iter()
            .flatten()
            .filter_map(|e| match e {
                PatternElement::Capture(name) => Some(name.as_str()),
                PatternElement::Word(_) => None,
            })
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Serialize to canonical JSON bytes.
    pub fn to_canonical_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
