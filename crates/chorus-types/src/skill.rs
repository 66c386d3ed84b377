//! Skill metadata and device permissions.
//!
//! [`SkillInfo`] is the static, human-facing description of a skill: what
//! it is called, an example sentence for the settings list, its icon and
//! which device permissions it needs before it can be offered.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A device capability a skill may require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Read the user's address book.
    ReadContacts,
    /// Place phone calls.
    CallPhone,
    /// Capture microphone audio.
    RecordAudio,
    /// Access the device location.
    Location,
}

impl Permission {
    /// All known permissions, in declaration order.
    pub const ALL: [Permission; 4] = [
        Permission::ReadContacts,
        Permission::CallPhone,
        Permission::RecordAudio,
        Permission::Location,
    ];

    /// Stable snake_case name used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReadContacts => "read_contacts",
            Self::CallPhone => "call_phone",
            Self::RecordAudio => "record_audio",
            Self::Location => "location",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown permission: {s}"))
    }
}

/// Static metadata describing a skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillInfo {
    /// Stable identifier, also the key for enablement preferences.
    pub id: String,

    /// Display name.
    pub name: String,

    /// An example sentence shown in skill listings.
    #[serde(default)]
    pub sentence_example: String,

    /// Icon name for the rendering layer.
    #[serde(default)]
    pub icon: String,

    /// Permissions that must all be granted for the skill to be available.
    #[serde(default)]
    pub needed_permissions: Vec<Permission>,

    /// Whether the skill exposes its own preferences screen.
    #[serde(default)]
    pub has_preferences: bool,
}

impl SkillInfo {
    /// Create metadata with only an id and a display name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            sentence_example: String::new(),
            icon: String::new(),
            needed_permissions: Vec::new(),
            has_preferences: false,
        }
    }

    /// Set the example sentence.
    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.sentence_example = example.into();
        self
    }

    /// Set the icon name.
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    /// Set the needed permissions.
    pub fn with_permissions(mut self, permissions: impl IntoIterator<Item = Permission>) -> Self {
        self.needed_permissions = permissions.into_iter().collect();
        self
    }
}
