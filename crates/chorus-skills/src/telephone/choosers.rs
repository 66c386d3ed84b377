//! Continuation skills offered after a contact search.
//!
//! [`ContactChooser`] picks one of the listed numbers, either by name
//! ("Jonathan") or by position ("the second one"). [`CallConfirmation`]
//! asks for a yes/no before dialing when `confirm_before_call` is set.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use chorus_core::{
    MessageOutput, NumberParser, Recognition, Recognizer, RecognizerFault, Skill, SkillContext,
    SkillError, SkillOutput, Slots, StandardRecognizer, Utterance, localized,
};
use chorus_types::{Permission, SkillInfo};

use super::contacts::{MAX_NAME_DISTANCE, name_distance};
use super::dialer::{CallTarget, Dialer};

/// Slot holding the zero-based position of the chosen target.
pub const INDEX_SLOT: &str = "index";

/// Slot holding `yes` or `no` for a confirmation.
pub const ANSWER_SLOT: &str = "answer";

const YES_SECTION: &str = "util_yes";
const NO_SECTION: &str = "util_no";

/// Words ignored around a spoken contact name.
const NAME_FILLERS: &[&str] = &[
    "the", "one", "call", "phone", "dial", "ring", "please", "contact", "to", "chiama",
    "telefona", "a", "il", "la", "lo", "quello", "per", "favore",
];

/// Words accepted around a spoken position.
const INDEX_FILLERS: &[&str] = &[
    "the", "number", "contact", "option", "call", "please", "il", "la", "numero", "chiama",
];

/// How a chosen target gets called.
#[derive(Debug, Clone)]
pub struct CallSettings {
    pub dialer: Arc<dyn Dialer>,
    pub confirm_before_call: bool,
}

impl CallSettings {
    /// Dial `target` now, or ask for confirmation first.
    pub(crate) async fn place(
        &self,
        target: CallTarget,
    ) -> Result<Box<dyn SkillOutput>, SkillError> {
        if self.confirm_before_call {
            return Ok(Box::new(ConfirmCallOutput {
                target,
                settings: self.clone(),
            }));
        }
        self.dialer.dial(&target).await?;
        Ok(Box::new(CallOutput { target }))
    }
}

/// How a [`ContactChooser`] recognizes the choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChooserMode {
    /// By contact name; one number per contact.
    Name,
    /// By position in the flattened (contact, number) list.
    Index,
}

/// Picks one of the targets listed by the telephone skill.
pub struct ContactChooser {
    info: SkillInfo,
    mode: ChooserMode,
    targets: Arc<[CallTarget]>,
    settings: CallSettings,
}

impl ContactChooser {
    pub const NAME_ID: &'static str = "contact_chooser_name";
    pub const INDEX_ID: &'static str = "contact_chooser_index";

    pub fn new(mode: ChooserMode, targets: Vec<CallTarget>, settings: CallSettings) -> Self {
        let id = match mode {
            ChooserMode::Name => Self::NAME_ID,
            ChooserMode::Index => Self::INDEX_ID,
        };
        Self {
            info: SkillInfo::new(id, "Contact chooser").with_permissions([Permission::CallPhone]),
            mode,
            targets: targets.into(),
            settings,
        }
    }

    pub fn mode(&self) -> ChooserMode {
        self.mode
    }

    pub fn targets(&self) -> &[CallTarget] {
        &self.targets
    }
}

#[async_trait]
impl Skill for ContactChooser {
    fn info(&self) -> &SkillInfo {
        &self.info
    }

    fn recognizers(&self, ctx: &SkillContext) -> Vec<Arc<dyn Recognizer>> {
        match self.mode {
            ChooserMode::Name => vec![Arc::new(NameRecognizer {
                targets: Arc::clone(&self.targets),
            })],
            ChooserMode::Index => ctx
                .number_parser()
                .map(|parser| {
                    vec![Arc::new(IndexRecognizer {
                        parser: Arc::clone(parser),
                        len: self.targets.len(),
                    }) as Arc<dyn Recognizer>]
                })
                .unwrap_or_default(),
        }
    }

    fn is_available(&self, ctx: &SkillContext) -> bool {
        ctx.permissions().all_granted(&self.info.needed_permissions)
            && (self.mode == ChooserMode::Name || ctx.number_parser().is_some())
    }

    async fn execute(
        &self,
        slots: &Slots,
        _ctx: &SkillContext,
    ) -> Result<Box<dyn SkillOutput>, SkillError> {
        let target = slots
            .get(INDEX_SLOT)
            .and_then(|i| i.parse::<usize>().ok())
            .and_then(|i| self.targets.get(i))
            .cloned()
            .ok_or_else(|| SkillError::MissingSlot(INDEX_SLOT.into()))?;
        self.settings.place(target).await
    }
}

/// Scores how closely the utterance names one of the targets.
///
/// Filler words are dropped; the rest is compared with each name and the
/// closest one within [`MAX_NAME_DISTANCE`] wins, earliest on ties.
#[derive(Debug)]
struct NameRecognizer {
    targets: Arc<[CallTarget]>,
}

impl Recognizer for NameRecognizer {
    fn name(&self) -> &str {
        "contact_name"
    }

    fn score(&self, utterance: &Utterance) -> Result<Recognition, RecognizerFault> {
        let spoken = utterance
            .tokens()
            .iter()
            .filter(|t| !NAME_FILLERS.contains(&t.as_str()))
            .cloned()
            .collect::<Vec<_>>()
            .join(" ");
        if spoken.is_empty() {
            return Ok(Recognition::none());
        }

        let mut best: Option<(usize, usize)> = None;
        for (i, target) in self.targets.iter().enumerate() {
            let d = name_distance(&spoken, &target.name);
            if d <= MAX_NAME_DISTANCE && best.is_none_or(|(_, bd)| d < bd) {
                best = Some((i, d));
            }
        }
        let Some((index, distance)) = best else {
            return Ok(Recognition::none());
        };

        // Normalized by what was said: a distance as long as the
        // utterance itself scores 0.
        let spoken_len = spoken.chars().count().max(1);
        let score = 1.0 - distance as f32 / spoken_len as f32;
        Ok(Recognition::new(
            score.clamp(0.0, 1.0),
            Slots::new().with(INDEX_SLOT, index.to_string()),
        ))
    }
}

/// Scores "the second one" style answers.
///
/// The score is the share of tokens that are numbers or known filler
/// words, and 0 when the number is outside the list.
struct IndexRecognizer {
    parser: Arc<dyn NumberParser>,
    len: usize,
}

impl Recognizer for IndexRecognizer {
    fn name(&self) -> &str {
        "contact_index"
    }

    fn score(&self, utterance: &Utterance) -> Result<Recognition, RecognizerFault> {
        if utterance.is_empty() || self.len == 0 {
            return Ok(Recognition::none());
        }
        let Some(n) = self.parser.first_number(utterance) else {
            return Ok(Recognition::none());
        };
        let index = match n {
            u64::MAX => self.len - 1,
            0 => return Ok(Recognition::none()),
            n => match usize::try_from(n - 1) {
                Ok(i) if i < self.len => i,
                _ => return Ok(Recognition::none()),
            },
        };

        let understood = utterance
            .tokens()
            .iter()
            .filter(|t| {
                INDEX_FILLERS.contains(&t.as_str())
                    || self
                        .parser
                        .first_number(&Utterance::new(t.as_str()))
                        .is_some()
            })
            .count();
        let score = understood as f32 / utterance.len() as f32;
        Ok(Recognition::new(
            score,
            Slots::new().with(INDEX_SLOT, index.to_string()),
        ))
    }
}

/// A call was placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallOutput {
    pub target: CallTarget,
}

impl SkillOutput for CallOutput {
    fn speech_output(&self, ctx: &SkillContext) -> String {
        localized(
            ctx,
            format!("Calling {}", self.target.name),
            format!("Chiamo {}", self.target.name),
        )
    }

    fn presentation(&self, ctx: &SkillContext) -> Value {
        json!({
            "kind": "call",
            "name": self.target.name,
            "number": self.target.number,
            "speech": self.speech_output(ctx),
        })
    }
}

/// Asks whether to call the chosen target.
#[derive(Debug)]
pub struct ConfirmCallOutput {
    pub target: CallTarget,
    settings: CallSettings,
}

impl SkillOutput for ConfirmCallOutput {
    fn speech_output(&self, ctx: &SkillContext) -> String {
        localized(
            ctx,
            format!("Should I call {} at {}?", self.target.name, self.target.number),
            format!("Chiamo {} al numero {}?", self.target.name, self.target.number),
        )
    }

    fn next_skills(&self, _ctx: &SkillContext) -> Vec<Arc<dyn Skill>> {
        vec![Arc::new(CallConfirmation::new(
            self.target.clone(),
            self.settings.dialer.clone(),
        ))]
    }

    fn presentation(&self, ctx: &SkillContext) -> Value {
        json!({
            "kind": "confirm_call",
            "name": self.target.name,
            "number": self.target.number,
            "speech": self.speech_output(ctx),
        })
    }
}

/// Yes/no continuation that dials on "yes".
pub struct CallConfirmation {
    info: SkillInfo,
    target: CallTarget,
    dialer: Arc<dyn Dialer>,
}

impl CallConfirmation {
    pub const ID: &'static str = "call_confirmation";

    pub fn new(target: CallTarget, dialer: Arc<dyn Dialer>) -> Self {
        Self {
            info: SkillInfo::new(Self::ID, "Call confirmation")
                .with_permissions([Permission::CallPhone]),
            target,
            dialer,
        }
    }
}

#[async_trait]
impl Skill for CallConfirmation {
    fn info(&self) -> &SkillInfo {
        &self.info
    }

    fn recognizers(&self, ctx: &SkillContext) -> Vec<Arc<dyn Recognizer>> {
        [(YES_SECTION, "yes"), (NO_SECTION, "no")]
            .into_iter()
            .filter_map(|(section, answer)| {
                ctx.section(section).map(|data| {
                    Arc::new(AnswerRecognizer {
                        inner: StandardRecognizer::new(data),
                        answer,
                    }) as Arc<dyn Recognizer>
                })
            })
            .collect()
    }

    fn is_available(&self, ctx: &SkillContext) -> bool {
        ctx.permissions().all_granted(&self.info.needed_permissions)
            && ctx.has_section(YES_SECTION)
            && ctx.has_section(NO_SECTION)
    }

    async fn execute(
        &self,
        slots: &Slots,
        ctx: &SkillContext,
    ) -> Result<Box<dyn SkillOutput>, SkillError> {
        match slots.get(ANSWER_SLOT) {
            Some("yes") => {
                self.dialer.dial(&self.target).await?;
                Ok(Box::new(CallOutput {
                    target: self.target.clone(),
                }))
            }
            Some(_) => Ok(Box::new(MessageOutput::new(localized(
                ctx,
                format!("Okay, I won't call {}", self.target.name),
                format!("Va bene, non chiamo {}", self.target.name),
            )))),
            None => Err(SkillError::MissingSlot(ANSWER_SLOT.into())),
        }
    }
}

/// A sentence recognizer that also reports which answer it stands for.
struct AnswerRecognizer {
    inner: StandardRecognizer,
    answer: &'static str,
}

impl Recognizer for AnswerRecognizer {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn score(&self, utterance: &Utterance) -> Result<Recognition, RecognizerFault> {
        let mut recognition = self.inner.score(utterance)?;
        recognition.slots.insert(ANSWER_SLOT, self.answer);
        Ok(recognition)
    }
}
