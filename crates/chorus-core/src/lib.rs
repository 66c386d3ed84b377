//! Core engine for chorus.
//!
//! Turns utterances into skill executions:
//!
//! - **[`utterance`]** -- input normalization
//! - **[`recognizer`]** -- scoring utterances against compiled sentences
//! - **[`skill`]** -- the [`Skill`] trait and [`SkillContext`]
//! - **[`output`]** -- the [`SkillOutput`] trait and engine-produced outputs
//! - **[`registry`]** -- ordered skill registry with enablement filtering
//! - **[`dispatch`]** -- the two-phase matching engine
//! - **[`conversation`]** -- turn serialization, cancellation and pending
//!   question ownership
//! - **[`numbers`]** -- spoken number parsing for choosers

pub mod conversation;
pub mod dispatch;
pub mod error;
pub mod numbers;
pub mod output;
pub mod recognizer;
pub mod registry;
pub mod skill;
pub mod utterance;

pub use conversation::{Conversation, PendingSnapshot};
pub use dispatch::{
    DispatchOptions, Dispatcher, MatchResult, PendingQuestion, TurnKind, TurnOutcome,
    UTTERANCE_SLOT,
};
pub use error::{RecognizerFault, SkillError};
pub use numbers::{EnglishNumberParser, NumberParser};
pub use output::{
    CancelledOutput, MessageOutput, SkillFailedOutput, SkillOutput, UnrecognizedOutput, localized,
};
pub use recognizer::{Recognition, Recognizer, Slots, StandardRecognizer};
pub use registry::{SkillRegistry, SkillStatus};
pub use skill::{Skill, SkillContext};
pub use utterance::Utterance;
