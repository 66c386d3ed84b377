//! Locale identifiers.
//!
//! Tags such as `en-US`, `en_us` or `EN` are normalized to a lowercase,
//! dash-separated form (`en-us`, `en`). Sentence tables are keyed by the
//! normalized tag, and lookups fall back from the full tag to its base
//! language.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ChorusError;

/// A normalized locale tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locale(String);

impl Locale {
    /// Parse and normalize a locale tag.
    ///
    /// # Errors
    ///
    /// Returns [`ChorusError::InvalidLocale`] if the tag is empty, the
    /// language subtag is not 2-8 ASCII letters, or any subtag contains
    /// characters other than ASCII alphanumerics.
    pub fn parse(tag: &str) -> Result<Self, ChorusError> {
        let invalid = || ChorusError::InvalidLocale {
            tag: tag.to_string(),
        };

        let normalized = tag.trim().replace('_', "-").to_ascii_lowercase();
        let mut parts = normalized.split('-');

        let language = parts.next().filter(|l| !l.is_empty()).ok_or_else(invalid)?;
        if !(2..=8).contains(&language.len())
            || !language.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(invalid());
        }
        for sub in parts {
            if sub.is_empty() || !sub.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(invalid());
            }
        }

        Ok(Self(normalized))
    }

    /// The normalized tag (e.g. `"en-us"`).
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The base language subtag (e.g. `"en"` for `"en-us"`).
    pub fn language(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }

    /// Whether this tag carries more than a base language.
    pub fn has_region(&self) -> bool {
        self.0.contains('-')
    }

    /// The lookup order for this locale: the full tag, then progressively
    /// shorter prefixes down to the base language.
    pub fn fallback_chain(&self) -> Vec<Locale> {
        let parts: Vec<&str> = self.0.split('-').collect();
        (1..=parts.len())
            .rev()
            .map(|n| Locale(parts[..n].join("-")))
            .collect()
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self("en".into())
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Locale {
    type Err = ChorusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Locale {
    type Error = ChorusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Locale> for String {
    fn from(value: Locale) -> Self {
        value.0
    }
}
