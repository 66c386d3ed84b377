//! Configuration schema types.
//!
//! All structs accept both `snake_case` and `camelCase` field names in
//! JSON (the loader normalizes keys, and the most common fields carry
//! `#[serde(alias)]` as well). Unknown fields are silently ignored for
//! forward compatibility, and every field has a default so `{}` is a
//! valid configuration.
//!
//! # Module Structure
//!
//! - [`telephone`] -- Telephone skill settings and the static contact list

pub mod telephone;

pub use telephone::*;

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ChorusError;
use crate::locale::Locale;
use crate::skill::Permission;

/// Shared default function: returns `true`.
pub(crate) fn default_true() -> bool {
    true
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(raw)
}

// ── Root config ──────────────────────────────────────────────────────────

/// Root configuration for chorus.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Active locale.
    #[serde(default)]
    pub locale: LocaleConfig,

    /// Dispatcher thresholds and timeouts.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Extra sentence sources.
    #[serde(default)]
    pub sentences: SentencesConfig,

    /// Skill enablement.
    #[serde(default)]
    pub skills: SkillsConfig,

    /// Granted device permissions.
    #[serde(default)]
    pub permissions: PermissionsConfig,

    /// Telephone skill settings.
    #[serde(default)]
    pub telephone: TelephoneConfig,
}

impl Config {
    /// Check semantic constraints that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ChorusError::ConfigInvalid`] if the threshold is outside
    /// `[0.0, 1.0)` or the execution timeout is zero, and
    /// [`ChorusError::InvalidLocale`] if the locale tag is malformed.
    pub fn validate(&self) -> Result<(), ChorusError> {
        self.locale.parsed()?;
        let threshold = self.dispatch.threshold;
        if !(0.0..1.0).contains(&threshold) || threshold.is_nan() {
            return Err(ChorusError::ConfigInvalid {
                reason: format!("dispatch.threshold must be in [0, 1), got {threshold}"),
            });
        }
        if self.dispatch.execution_timeout_secs == 0 {
            return Err(ChorusError::ConfigInvalid {
                reason: "dispatch.execution_timeout_secs must be positive".into(),
            });
        }
        Ok(())
    }
}

// ── Locale ───────────────────────────────────────────────────────────────

/// Locale selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocaleConfig {
    /// Locale tag (e.g. `"en"`, `"en-US"`, `"it_IT"`).
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "en".into()
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
        }
    }
}

impl LocaleConfig {
    /// Parse the configured tag.
    pub fn parsed(&self) -> Result<Locale, ChorusError> {
        Locale::parse(&self.language)
    }
}

// ── Dispatch ─────────────────────────────────────────────────────────────

/// Dispatcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Minimum confidence a recognizer must strictly exceed to win.
    #[serde(default = "default_threshold")]
    pub threshold: f32,

    /// Seconds a pending question stays answerable. `0` disables expiry.
    #[serde(
        default = "default_continuation_timeout_secs",
        alias = "continuationTimeoutSecs"
    )]
    pub continuation_timeout_secs: u64,

    /// Upper bound on a single skill execution.
    #[serde(
        default = "default_execution_timeout_secs",
        alias = "executionTimeoutSecs"
    )]
    pub execution_timeout_secs: u64,

    /// Score candidates on the rayon thread pool.
    #[serde(default = "default_true", alias = "parallelScoring")]
    pub parallel_scoring: bool,
}

fn default_threshold() -> f32 {
    0.5
}
fn default_continuation_timeout_secs() -> u64 {
    120
}
fn default_execution_timeout_secs() -> u64 {
    30
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            continuation_timeout_secs: default_continuation_timeout_secs(),
            execution_timeout_secs: default_execution_timeout_secs(),
            parallel_scoring: true,
        }
    }
}

impl DispatchConfig {
    /// Continuation lifetime, or `None` when pending questions never expire.
    pub fn continuation_timeout(&self) -> Option<Duration> {
        (self.continuation_timeout_secs > 0)
            .then(|| Duration::from_secs(self.continuation_timeout_secs))
    }

    /// Execution time limit.
    pub fn execution_timeout(&self) -> Duration {
        Duration::from_secs(self.execution_timeout_secs)
    }
}

// ── Sentences ────────────────────────────────────────────────────────────

/// Additional sentence sources compiled at startup.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SentencesConfig {
    /// Directory laid out as `<dir>/<locale>/*.sentences`. Sections found
    /// here replace built-in sections with the same id.
    #[serde(default)]
    pub dir: Option<String>,
}

impl SentencesConfig {
    /// The expanded sentence directory, if configured.
    pub fn dir_path(&self) -> Option<PathBuf> {
        self.dir.as_deref().map(expand_home)
    }
}

// ── Skills ───────────────────────────────────────────────────────────────

/// Skill enablement settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillsConfig {
    /// Initial enablement per skill id. Skills absent here are enabled.
    #[serde(default)]
    pub enabled: HashMap<String, bool>,

    /// Where user enablement changes are persisted.
    #[serde(default = "default_state_file", alias = "stateFile")]
    pub state_file: String,
}

fn default_state_file() -> String {
    "~/.chorus/skills.json".into()
}

impl Default for SkillsConfig {
    fn default() -> Self {
        Self {
            enabled: HashMap::new(),
            state_file: default_state_file(),
        }
    }
}

impl SkillsConfig {
    /// The expanded state file path.
    pub fn state_path(&self) -> PathBuf {
        expand_home(&self.state_file)
    }
}

// ── Permissions ──────────────────────────────────────────────────────────

/// Permissions the host reports as granted.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PermissionsConfig {
    /// Granted permissions.
    #[serde(default)]
    pub granted: Vec<Permission>,
}
