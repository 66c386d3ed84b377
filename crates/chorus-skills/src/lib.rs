//! Built-in skills for chorus.
//!
//! - **[`current_time`]** -- "what time is it"
//! - **[`telephone`]** -- "call John", with contact choosers and an
//!   optional call confirmation
//! - **[`fallback`]** -- the catch-all run when nothing matches
//! - **[`sentences`]** -- the sentence files these skills are recognized by
//!
//! [`Builtins`] wires the skills to their collaborators and registers them
//! in a [`SkillRegistry`].

pub mod current_time;
pub mod fallback;
pub mod sentences;
pub mod telephone;

use std::sync::Arc;

use chorus_core::{Skill, SkillRegistry};
use chorus_types::config::TelephoneConfig;

pub use current_time::{Clock, CurrentTimeSkill, SystemClock};
pub use fallback::FallbackSkill;
pub use sentences::builtin_table;
pub use telephone::{
    CallSettings, ContactsProvider, Dialer, LoggingDialer, StaticContacts, TelephoneSkill,
};

/// Collaborators of the built-in skills.
#[derive(Clone)]
pub struct Builtins {
    pub contacts: Arc<dyn ContactsProvider>,
    pub dialer: Arc<dyn Dialer>,
    pub clock: Arc<dyn Clock>,
    pub confirm_before_call: bool,
    pub max_results: usize,
}

impl Builtins {
    /// Static contacts from configuration, a logging dialer and the
    /// system clock.
    pub fn from_config(config: &TelephoneConfig) -> Self {
        Self {
            contacts: Arc::new(StaticContacts::from_entries(&config.contacts)),
            dialer: Arc::new(LoggingDialer),
            clock: Arc::new(SystemClock),
            confirm_before_call: config.confirm_before_call,
            max_results: config.max_results,
        }
    }

    /// Every built-in skill except the fallback, in registration order.
    pub fn skills(&self) -> Vec<Arc<dyn Skill>> {
        vec![
            Arc::new(CurrentTimeSkill::new(Arc::clone(&self.clock))),
            Arc::new(TelephoneSkill::new(
                Arc::clone(&self.contacts),
                CallSettings {
                    dialer: Arc::clone(&self.dialer),
                    confirm_before_call: self.confirm_before_call,
                },
                self.max_results,
            )),
        ]
    }

    /// Register [`skills`](Self::skills) in `registry`.
    pub fn register(&self, registry: &mut SkillRegistry) -> chorus_types::Result<()> {
        for skill in self.skills() {
            registry.register(skill)?;
        }
        Ok(())
    }
}
