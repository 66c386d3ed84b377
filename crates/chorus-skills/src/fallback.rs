//! Catch-all skill run when nothing else matches.

use async_trait::async_trait;
use serde_json::{Value, json};

use chorus_core::{Skill, SkillContext, SkillError, SkillOutput, Slots, UTTERANCE_SLOT, localized};
use chorus_types::SkillInfo;

/// Answers "I could not understand" and echoes what was heard.
///
/// Has no recognizers; the dispatcher runs it directly.
pub struct FallbackSkill {
    info: SkillInfo,
}

impl FallbackSkill {
    pub const ID: &'static str = "fallback";

    pub fn new() -> Self {
        Self {
            info: SkillInfo::new(Self::ID, "Fallback").with_icon("help"),
        }
    }
}

impl Default for FallbackSkill {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Skill for FallbackSkill {
    fn info(&self) -> &SkillInfo {
        &self.info
    }

    async fn execute(
        &self,
        slots: &Slots,
        _ctx: &SkillContext,
    ) -> Result<Box<dyn SkillOutput>, SkillError> {
        Ok(Box::new(FallbackOutput {
            heard: slots.get(UTTERANCE_SLOT).unwrap_or_default().to_string(),
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackOutput {
    pub heard: String,
}

impl SkillOutput for FallbackOutput {
    fn speech_output(&self, ctx: &SkillContext) -> String {
        if self.heard.trim().is_empty() {
            return localized(ctx, "I did not hear anything".into(), "Non ho sentito nulla".into());
        }
        localized(
            ctx,
            format!("I could not understand \"{}\"", self.heard),
            format!("Non sono riuscito a capire \"{}\"", self.heard),
        )
    }

    fn presentation(&self, ctx: &SkillContext) -> Value {
        json!({
            "kind": "fallback",
            "heard": self.heard,
            "speech": self.speech_output(ctx),
        })
    }
}
