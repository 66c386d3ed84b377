//! Error types for the chorus framework.
//!
//! Provides [`ChorusError`] as the top-level error type and [`CompileError`]
//! for per-file sentence compilation failures. Both are non-exhaustive to
//! allow future extension without breaking downstream.

use thiserror::Error;

/// Top-level error type for the chorus framework.
///
/// Note that "no skill matched" is deliberately absent: an unrecognized
/// utterance is a normal dispatch outcome, not an error.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ChorusError {
    /// Configuration is malformed or semantically invalid.
    #[error("invalid config: {reason}")]
    ConfigInvalid {
        /// What is wrong with the configuration.
        reason: String,
    },

    /// A locale tag could not be parsed.
    #[error("invalid locale tag: {tag}")]
    InvalidLocale {
        /// The rejected tag.
        tag: String,
    },

    /// Two skills were registered with the same id.
    #[error("duplicate skill id: {id}")]
    DuplicateSkill {
        /// The conflicting id.
        id: String,
    },

    /// A skill id was referenced that is not registered.
    #[error("unknown skill: {id}")]
    UnknownSkill {
        /// The unknown id.
        id: String,
    },

    /// A new turn was requested while another one is still being processed.
    #[error("a dialogue turn is already in flight")]
    TurnInFlight,

    /// The enablement preference store failed.
    #[error("preference store error: {0}")]
    Preferences(String),

    /// A sentence file failed to compile.
    #[error("sentence compilation failed: {0}")]
    Compile(#[from] CompileError),

    /// Underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization / deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A failure to compile one sentence file.
///
/// Compile errors are recoverable at the batch level: the offending file
/// is excluded from the pattern table and compilation of the other files
/// continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CompileError {
    /// The file contains a syntax error.
    #[error("{file}:{line}: {reason}")]
    Syntax {
        /// Source file name.
        file: String,
        /// 1-based line number.
        line: usize,
        /// Human-readable description.
        reason: String,
    },

    /// A section id was declared twice.
    #[error("{file}:{line}: duplicate section id '{section}'")]
    DuplicateSection {
        /// Source file name.
        file: String,
        /// 1-based line number of the second declaration.
        line: usize,
        /// The repeated section id.
        section: String,
    },

    /// A sentence expands into too many alternatives.
    #[error("{file}:{line}: sentence expands to more than {limit} alternatives")]
    TooManyAlternatives {
        /// Source file name.
        file: String,
        /// 1-based line number.
        line: usize,
        /// The expansion limit that was exceeded.
        limit: usize,
    },

    /// The file declares no sections, or a section has no sentences.
    #[error("{file}: {reason}")]
    Empty {
        /// Source file name.
        file: String,
        /// What is missing.
        reason: String,
    },

    /// The file could not be read.
    #[error("{file}: {reason}")]
    Unreadable {
        /// Source file name.
        file: String,
        /// The underlying I/O failure, rendered.
        reason: String,
    },
}

impl CompileError {
    /// Name of the file this error refers to.
    pub fn file(&self) -> &str {
        match self {
            Self::Syntax { file, .. }
            | Self::DuplicateSection { file, .. }
            | Self::TooManyAlternatives { file, .. }
            | Self::Empty { file, .. }
            | Self::Unreadable { file, .. } => file,
        }
    }
}

/// A convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ChorusError>;
