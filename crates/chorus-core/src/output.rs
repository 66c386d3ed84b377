//! Skill outputs.
//!
//! Every turn yields exactly one [`SkillOutput`]. Besides what skills
//! produce, the engine itself produces three outputs: [`UnrecognizedOutput`]
//! when nothing matched, [`SkillFailedOutput`] when execution failed and
//! [`CancelledOutput`] when execution was cancelled.

use std::fmt;
use std::sync::Arc;

use serde_json::{Value, json};

use crate::skill::{Skill, SkillContext};

/// The result of executing a skill.
pub trait SkillOutput: Send + Sync + fmt::Debug {
    /// Text to speak or print.
    fn speech_output(&self, ctx: &SkillContext) -> String;

    /// Skills offered as continuations for the next turn.
    fn next_skills(&self, _ctx: &SkillContext) -> Vec<Arc<dyn Skill>> {
        Vec::new()
    }

    /// Structured data for a rendering layer.
    fn presentation(&self, ctx: &SkillContext) -> Value {
        json!({ "speech": self.speech_output(ctx) })
    }
}

/// Pick the Italian text when the context locale is Italian, English
/// otherwise.
pub fn localized(ctx: &SkillContext, en: String, it: String) -> String {
    match ctx.locale().language() {
        "it" => it,
        _ => en,
    }
}

/// A plain message with no continuation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageOutput {
    message: String,
}

impl MessageOutput {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl SkillOutput for MessageOutput {
    fn speech_output(&self, _ctx: &SkillContext) -> String {
        self.message.clone()
    }
}

/// Nothing cleared the threshold and no fallback skill is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnrecognizedOutput {
    pub utterance: String,
}

impl SkillOutput for UnrecognizedOutput {
    fn speech_output(&self, ctx: &SkillContext) -> String {
        localized(
            ctx,
            format!("Sorry, I did not understand \"{}\"", self.utterance),
            format!("Scusa, non ho capito \"{}\"", self.utterance),
        )
    }

    fn presentation(&self, ctx: &SkillContext) -> Value {
        json!({
            "kind": "unrecognized",
            "utterance": self.utterance,
            "speech": self.speech_output(ctx),
        })
    }
}

/// A skill returned an error or timed out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillFailedOutput {
    pub skill_id: String,
    pub reason: String,
}

impl SkillOutput for SkillFailedOutput {
    fn speech_output(&self, ctx: &SkillContext) -> String {
        localized(
            ctx,
            format!("Something went wrong: {}", self.reason),
            format!("Qualcosa è andato storto: {}", self.reason),
        )
    }

    fn presentation(&self, ctx: &SkillContext) -> Value {
        json!({
            "kind": "failed",
            "skill": self.skill_id,
            "reason": self.reason,
            "speech": self.speech_output(ctx),
        })
    }
}

/// Execution was cancelled before it finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelledOutput {
    pub skill_id: String,
}

impl SkillOutput for CancelledOutput {
    fn speech_output(&self, ctx: &SkillContext) -> String {
        localized(ctx, "Cancelled".into(), "Annullato".into())
    }

    fn presentation(&self, ctx: &SkillContext) -> Value {
        json!({
            "kind": "cancelled",
            "skill": self.skill_id,
            "speech": self.speech_output(ctx),
        })
    }
}
