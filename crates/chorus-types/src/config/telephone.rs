//! Telephone skill configuration.

use serde::{Deserialize, Serialize};

/// Telephone skill settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelephoneConfig {
    /// Ask "are you sure?" before dialing a chosen contact.
    #[serde(default, alias = "confirmBeforeCall")]
    pub confirm_before_call: bool,

    /// Maximum number of contacts listed for one query.
    #[serde(default = "default_max_results", alias = "maxResults")]
    pub max_results: usize,

    /// Address book used by the static contacts provider.
    #[serde(default)]
    pub contacts: Vec<ContactEntry>,
}

fn default_max_results() -> usize {
    5
}

impl Default for TelephoneConfig {
    fn default() -> Self {
        Self {
            confirm_before_call: false,
            max_results: default_max_results(),
            contacts: Vec::new(),
        }
    }
}

/// One address book entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactEntry {
    /// Display name.
    pub name: String,

    /// Phone numbers, preferred first.
    #[serde(default)]
    pub numbers: Vec<String>,
}
