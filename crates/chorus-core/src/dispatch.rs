//! The skill matching engine.
//!
//! One call to [`Dispatcher::dispatch`] is one dialogue turn:
//!
//! 1. **Continuation phase.** If a [`PendingQuestion`] is passed in and
//!    has not expired, its skills are scored first. A match above the
//!    threshold wins outright.
//! 2. **Global phase.** Otherwise every enabled and available registered
//!    skill is scored and the best match strictly above the threshold
//!    wins. Equal scores resolve to the earliest registered skill.
//! 3. **Execution.** The winner runs, raced against the turn's
//!    [`CancellationToken`] and the execution timeout. Its output's
//!    `next_skills` become the new pending question.
//!
//! The pending question is explicit state: it is passed in and the new
//! one is returned, so the caller decides where it lives. Every path
//! through `dispatch` returns exactly one output.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeDelta, Utc};
use rayon::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use chorus_platform::preferences::EnablementStore;
use chorus_types::config::DispatchConfig;

use crate::output::{CancelledOutput, SkillFailedOutput, SkillOutput, UnrecognizedOutput};
use crate::recognizer::{Recognition, Slots};
use crate::registry::SkillRegistry;
use crate::skill::{Skill, SkillContext};
use crate::utterance::Utterance;

/// Slot under which the fallback skill receives the raw utterance.
pub const UTTERANCE_SLOT: &str = "utterance";

/// Tunables for a [`Dispatcher`].
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOptions {
    /// A match must score strictly above this.
    pub threshold: f32,
    /// Pending questions older than this are dropped; `None` never expires.
    pub continuation_timeout: Option<Duration>,
    /// Upper bound on one skill execution.
    pub execution_timeout: Duration,
    /// Score candidates on the rayon pool.
    pub parallel_scoring: bool,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self::from(&DispatchConfig::default())
    }
}

impl From<&DispatchConfig> for DispatchOptions {
    fn from(config: &DispatchConfig) -> Self {
        Self {
            threshold: config.threshold,
            continuation_timeout: config.continuation_timeout(),
            execution_timeout: config.execution_timeout(),
            parallel_scoring: config.parallel_scoring,
        }
    }
}

/// Skills offered as follow-ups for the next turn.
#[derive(Clone)]
pub struct PendingQuestion {
    skills: Vec<Arc<dyn Skill>>,
    offered_at: Instant,
    offered_time: DateTime<Utc>,
}

impl PendingQuestion {
    pub fn new(skills: Vec<Arc<dyn Skill>>) -> Self {
        Self::offered_at(skills, Instant::now())
    }

    /// Build a pending question with an explicit offer time.
    pub fn offered_at(skills: Vec<Arc<dyn Skill>>, offered_at: Instant) -> Self {
        let age = TimeDelta::from_std(offered_at.elapsed()).unwrap_or(TimeDelta::zero());
        Self {
            skills,
            offered_at,
            offered_time: Utc::now() - age,
        }
    }

    pub fn skills(&self) -> &[Arc<dyn Skill>] {
        &self.skills
    }

    pub fn skill_ids(&self) -> Vec<String> {
        self.skills.iter().map(|s| s.id().to_string()).collect()
    }

    pub fn offered_instant(&self) -> Instant {
        self.offered_at
    }

    /// Wall-clock time the question was offered.
    pub fn offered_time(&self) -> DateTime<Utc> {
        self.offered_time
    }

    /// Whether the question is older than `ttl`.
    pub fn is_expired(&self, ttl: Option<Duration>) -> bool {
        ttl.is_some_and(|ttl| self.offered_at.elapsed() > ttl)
    }
}

impl std::fmt::Debug for PendingQuestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingQuestion")
            .field("skills", &self.skill_ids())
            .field("offered_at", &self.offered_at)
            .finish()
    }
}

/// The winning candidate of a scoring pass.
#[derive(Clone)]
pub struct MatchResult {
    pub skill: Arc<dyn Skill>,
    pub recognition: Recognition,
}

impl MatchResult {
    pub fn score(&self) -> f32 {
        self.recognition.score
    }

    pub fn slots(&self) -> &Slots {
        &self.recognition.slots
    }
}

/// How a turn ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnKind {
    /// A skill matched and executed.
    Matched {
        skill_id: String,
        score: f32,
        via_continuation: bool,
    },
    /// Nothing cleared the threshold. `fallback` names the fallback skill
    /// that produced the output, if one ran.
    Unrecognized { fallback: Option<String> },
    /// The skill returned an error or timed out.
    Failed { skill_id: String, reason: String },
    /// Execution was cancelled.
    Cancelled { skill_id: String },
}

/// The single output of one dialogue turn.
#[derive(Debug)]
pub struct TurnOutcome {
    pub turn_id: Uuid,
    pub utterance: String,
    pub kind: TurnKind,
    pub output: Box<dyn SkillOutput>,
}

impl TurnOutcome {
    /// Id of the skill that handled the turn, if any.
    pub fn skill_id(&self) -> Option<&str> {
        match &self.kind {
            TurnKind::Matched { skill_id, .. }
            | TurnKind::Failed { skill_id, .. }
            | TurnKind::Cancelled { skill_id } => Some(skill_id),
            TurnKind::Unrecognized { fallback } => fallback.as_deref(),
        }
    }

    pub fn speech(&self, ctx: &SkillContext) -> String {
        self.output.speech_output(ctx)
    }
}

enum Execution {
    Done(Box<dyn SkillOutput>),
    Failed(String),
    Cancelled,
}

/// Matches utterances to skills and runs the winner.
pub struct Dispatcher {
    registry: Arc<SkillRegistry>,
    preferences: Arc<dyn EnablementStore>,
    options: DispatchOptions,
    fallback: Option<Arc<dyn Skill>>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<SkillRegistry>,
        preferences: Arc<dyn EnablementStore>,
        options: DispatchOptions,
    ) -> Self {
        Self {
            registry,
            preferences,
            options,
            fallback: None,
        }
    }

    /// Run `skill` when nothing matches instead of returning an
    /// [`UnrecognizedOutput`].
    pub fn with_fallback(mut self, skill: Arc<dyn Skill>) -> Self {
        self.fallback = Some(skill);
        self
    }

    pub fn registry(&self) -> &SkillRegistry {
        &self.registry
    }

    pub fn preferences(&self) -> &dyn EnablementStore {
        self.preferences.as_ref()
    }

    pub fn options(&self) -> &DispatchOptions {
        &self.options
    }

    /// Best recognition of one skill. Faults count as a zero score.
    fn score_skill(skill: &dyn Skill, utterance: &Utterance, ctx: &SkillContext) -> Recognition {
        let mut best = Recognition::none();
        for recognizer in skill.recognizers(ctx) {
            match recognizer.score(utterance) {
                Ok(recognition) if recognition.score > best.score => best = recognition,
                Ok(_) => {}
                Err(fault) => {
                    warn!(
                        skill = %skill.id(),
                        recognizer = %recognizer.name(),
                        error = %fault,
                        "recognizer fault, scoring as 0"
                    );
                }
            }
        }
        best
    }

    /// Score `candidates` and pick the winner.
    ///
    /// The winner is the highest score strictly above the threshold; among
    /// equal scores the earliest candidate wins. Parallel scoring only
    /// changes where scores are computed, not which candidate is picked.
    pub fn select(
        &self,
        candidates: &[Arc<dyn Skill>],
        utterance: &Utterance,
        ctx: &SkillContext,
    ) -> Option<MatchResult> {
        let scores: Vec<Recognition> = if self.options.parallel_scoring && candidates.len() > 1 {
            candidates
                .par_iter()
                .map(|skill| Self::score_skill(skill.as_ref(), utterance, ctx))
                .collect()
        } else {
            candidates
                .iter()
                .map(|skill| Self::score_skill(skill.as_ref(), utterance, ctx))
                .collect()
        };

        let mut best: Option<MatchResult> = None;
        for (skill, recognition) in candidates.iter().zip(scores) {
            debug!(skill = %skill.id(), score = recognition.score, "scored candidate");
            if recognition.score <= self.options.threshold {
                continue;
            }
            if best.as_ref().is_none_or(|b| recognition.score > b.score()) {
                best = Some(MatchResult {
                    skill: Arc::clone(skill),
                    recognition,
                });
            }
        }
        best
    }

    async fn execute(
        &self,
        skill: &dyn Skill,
        slots: &Slots,
        ctx: &SkillContext,
        cancel: &CancellationToken,
    ) -> Execution {
        let timeout = self.options.execution_timeout;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Execution::Cancelled,
            result = tokio::time::timeout(timeout, skill.execute(slots, ctx)) => match result {
                Ok(Ok(output)) => Execution::Done(output),
                Ok(Err(e)) => Execution::Failed(e.to_string()),
                Err(_) => Execution::Failed(format!("timed out after {}s", timeout.as_secs_f32())),
            },
        }
    }

    /// Run one dialogue turn.
    ///
    /// Returns the turn's outcome and the pending question for the next
    /// turn. Cancellation, failure and an unrecognized utterance all clear
    /// the pending question.
    pub async fn dispatch(
        &self,
        utterance: &Utterance,
        pending: Option<PendingQuestion>,
        ctx: &SkillContext,
        cancel: &CancellationToken,
    ) -> (TurnOutcome, Option<PendingQuestion>) {
        let turn_id = Uuid::new_v4();

        let pending = pending.filter(|p| {
            let expired = p.is_expired(self.options.continuation_timeout);
            if expired {
                debug!(%turn_id, skills = ?p.skill_ids(), "pending question expired");
            }
            !expired
        });

        let mut via_continuation = false;
        let mut winner = None;
        if let Some(question) = &pending {
            let candidates: Vec<Arc<dyn Skill>> = question
                .skills()
                .iter()
                .filter(|s| s.is_available(ctx))
                .cloned()
                .collect();
            winner = self.select(&candidates, utterance, ctx);
            via_continuation = winner.is_some();
        }
        if winner.is_none() {
            let candidates = self
                .registry
                .list_enabled_available(ctx, self.preferences.as_ref())
                .await;
            winner = self.select(&candidates, utterance, ctx);
        }

        let Some(winner) = winner else {
            return (self.unrecognized(turn_id, utterance, ctx, cancel).await, None);
        };

        let skill_id = winner.skill.id().to_string();
        let score = winner.score();
        debug!(%turn_id, skill = %skill_id, score, via_continuation, "selected skill");

        match self
            .execute(winner.skill.as_ref(), winner.slots(), ctx, cancel)
            .await
        {
            Execution::Done(output) => {
                let next = output.next_skills(ctx);
                let next_pending = (!next.is_empty()).then(|| PendingQuestion::new(next));
                let outcome = TurnOutcome {
                    turn_id,
                    utterance: utterance.text().to_string(),
                    kind: TurnKind::Matched {
                        skill_id,
                        score,
                        via_continuation,
                    },
                    output,
                };
                (outcome, next_pending)
            }
            Execution::Failed(reason) => {
                warn!(%turn_id, skill = %skill_id, %reason, "skill execution failed");
                (failed(turn_id, utterance, skill_id, reason), None)
            }
            Execution::Cancelled => {
                info!(%turn_id, skill = %skill_id, "skill execution cancelled");
                (cancelled(turn_id, utterance, skill_id), None)
            }
        }
    }

    async fn unrecognized(
        &self,
        turn_id: Uuid,
        utterance: &Utterance,
        ctx: &SkillContext,
        cancel: &CancellationToken,
    ) -> TurnOutcome {
        info!(%turn_id, utterance = %utterance.text(), "no skill matched");

        let Some(fallback) = &self.fallback else {
            return TurnOutcome {
                turn_id,
                utterance: utterance.text().to_string(),
                kind: TurnKind::Unrecognized { fallback: None },
                output: Box::new(UnrecognizedOutput {
                    utterance: utterance.text().to_string(),
                }),
            };
        };

        let skill_id = fallback.id().to_string();
        let slots = Slots::new().with(UTTERANCE_SLOT, utterance.text());
        match self.execute(fallback.as_ref(), &slots, ctx, cancel).await {
            Execution::Done(output) => TurnOutcome {
                turn_id,
                utterance: utterance.text().to_string(),
                kind: TurnKind::Unrecognized {
                    fallback: Some(skill_id),
                },
                output,
            },
            Execution::Failed(reason) => {
                warn!(%turn_id, skill = %skill_id, %reason, "fallback skill failed");
                failed(turn_id, utterance, skill_id, reason)
            }
            Execution::Cancelled => {
                info!(%turn_id, skill = %skill_id, "fallback skill cancelled");
                cancelled(turn_id, utterance, skill_id)
            }
        }
    }
}

fn failed(turn_id: Uuid, utterance: &Utterance, skill_id: String, reason: String) -> TurnOutcome {
    TurnOutcome {
        turn_id,
        utterance: utterance.text().to_string(),
        output: Box::new(SkillFailedOutput {
            skill_id: skill_id.clone(),
            reason: reason.clone(),
        }),
        kind: TurnKind::Failed { skill_id, reason },
    }
}

fn cancelled(turn_id: Uuid, utterance: &Utterance, skill_id: String) -> TurnOutcome {
    TurnOutcome {
        turn_id,
        utterance: utterance.text().to_string(),
        output: Box::new(CancelledOutput {
            skill_id: skill_id.clone(),
        }),
        kind: TurnKind::Cancelled { skill_id },
    }
}
