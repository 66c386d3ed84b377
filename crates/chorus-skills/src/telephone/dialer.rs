//! Placing calls.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use chorus_core::SkillError;

/// A contact name paired with the one number to dial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallTarget {
    pub name: String,
    pub number: String,
}

impl CallTarget {
    pub fn new(name: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            number: number.into(),
        }
    }
}

/// Starts a phone call on the host device.
#[async_trait]
pub trait Dialer: Send + Sync + fmt::Debug {
    async fn dial(&self, target: &CallTarget) -> Result<(), SkillError>;
}

/// A dialer that only records the call in the log.
///
/// Used by the CLI, which has no telephony.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingDialer;

#[async_trait]
impl Dialer for LoggingDialer {
    async fn dial(&self, target: &CallTarget) -> Result<(), SkillError> {
        info!(name = %target.name, number = %target.number, "dialing");
        Ok(())
    }
}
