//! Error types local to the skill engine.
//!
//! Neither type escapes a dispatch: a [`RecognizerFault`] is scored as 0
//! for the offending candidate, a [`SkillError`] becomes a failure output.

use thiserror::Error;

/// A recognizer could not score an utterance because its data is malformed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RecognizerFault {
    /// The section has no sentences at all.
    #[error("section '{section}' has no sentences")]
    NoSentences { section: String },

    /// A sentence path has no elements.
    #[error("section '{section}': sentence {index} is empty")]
    EmptySentence { section: String, index: usize },

    /// A capture element has an empty name.
    #[error("section '{section}': sentence {index} has an unnamed capture")]
    UnnamedCapture { section: String, index: usize },

    /// A custom recognizer rejected its own state.
    #[error("recognizer '{recognizer}': {reason}")]
    Invalid { recognizer: String, reason: String },
}

/// A skill failed while executing.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SkillError {
    /// A slot the skill needs was not captured.
    #[error("missing slot '{0}'")]
    MissingSlot(String),

    /// An external provider (contacts, dialer, clock) failed.
    #[error("{provider} failed: {reason}")]
    Provider { provider: String, reason: String },

    /// A permission the skill needs was revoked after matching.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SkillError {
    /// Convenience constructor for [`SkillError::Provider`].
    pub fn provider(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            reason: reason.into(),
        }
    }
}
