//! "What time is it?"

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use serde_json::{Value, json};

use chorus_core::{Skill, SkillContext, SkillError, SkillOutput, Slots, localized};
use chorus_types::SkillInfo;

/// Source of the current local time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// The host's local clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

pub struct CurrentTimeSkill {
    info: SkillInfo,
    clock: Arc<dyn Clock>,
}

impl CurrentTimeSkill {
    pub const ID: &'static str = "current_time";

    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            info: SkillInfo::new(Self::ID, "Current time")
                .with_example("what time is it")
                .with_icon("schedule"),
            clock,
        }
    }
}

#[async_trait]
impl Skill for CurrentTimeSkill {
    fn info(&self) -> &SkillInfo {
        &self.info
    }

    fn section_id(&self) -> Option<&str> {
        Some(Self::ID)
    }

    async fn execute(
        &self,
        _slots: &Slots,
        _ctx: &SkillContext,
    ) -> Result<Box<dyn SkillOutput>, SkillError> {
        Ok(Box::new(CurrentTimeOutput {
            time: self.clock.now(),
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentTimeOutput {
    pub time: NaiveDateTime,
}

impl SkillOutput for CurrentTimeOutput {
    fn speech_output(&self, ctx: &SkillContext) -> String {
        let hhmm = self.time.format("%H:%M");
        localized(ctx, format!("It is {hhmm}"), format!("Sono le {hhmm}"))
    }

    fn presentation(&self, ctx: &SkillContext) -> Value {
        json!({
            "kind": "current_time",
            "time": self.time.format("%H:%M:%S").to_string(),
            "speech": self.speech_output(ctx),
        })
    }
}
