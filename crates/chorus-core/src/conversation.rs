//! Turn serialization and pending question ownership.
//!
//! A [`Conversation`] is the single writer of the pending question. It
//! holds the question behind an async mutex for the whole turn, so at most
//! one dispatch is in flight: [`process`](Conversation::process) waits its
//! turn, [`try_process`](Conversation::try_process) refuses. Readers (a
//! rendering layer) watch a [`PendingSnapshot`] instead of the question
//! itself.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard, mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use chorus_types::{ChorusError, Result};

use crate::dispatch::{Dispatcher, PendingQuestion, TurnOutcome};
use crate::skill::SkillContext;
use crate::utterance::Utterance;

/// Read-only view of the pending question for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PendingSnapshot {
    /// Ids of the offered continuation skills, empty when none.
    pub skill_ids: Vec<String>,
    /// When the question was offered.
    pub offered_at: Option<DateTime<Utc>>,
}

impl PendingSnapshot {
    pub fn is_empty(&self) -> bool {
        self.skill_ids.is_empty()
    }
}

/// A dialogue session over one [`Dispatcher`].
pub struct Conversation {
    dispatcher: Arc<Dispatcher>,
    ctx: SkillContext,
    pending: Mutex<Option<PendingQuestion>>,
    current: std::sync::Mutex<Option<CancellationToken>>,
    snapshot_tx: watch::Sender<PendingSnapshot>,
}

impl Conversation {
    pub fn new(dispatcher: Arc<Dispatcher>, ctx: SkillContext) -> Self {
        let (snapshot_tx, _) = watch::channel(PendingSnapshot::default());
        Self {
            dispatcher,
            ctx,
            pending: Mutex::new(None),
            current: std::sync::Mutex::new(None),
            snapshot_tx,
        }
    }

    pub fn context(&self) -> &SkillContext {
        &self.ctx
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Subscribe to pending question changes.
    pub fn subscribe(&self) -> watch::Receiver<PendingSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// The latest published snapshot.
    pub fn pending_snapshot(&self) -> PendingSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Process one utterance, waiting for any in-flight turn to finish.
    pub async fn process(&self, text: &str) -> TurnOutcome {
        let guard = self.pending.lock().await;
        self.run_turn(guard, text).await
    }

    /// Process one utterance unless another turn is in flight.
    ///
    /// # Errors
    ///
    /// Returns [`ChorusError::TurnInFlight`] if a turn is being processed.
    pub async fn try_process(&self, text: &str) -> Result<TurnOutcome> {
        let guard = self
            .pending
            .try_lock()
            .map_err(|_| ChorusError::TurnInFlight)?;
        Ok(self.run_turn(guard, text).await)
    }

    /// Cancel the in-flight turn's skill execution, if any.
    ///
    /// Returns `true` if there was a turn to cancel.
    pub fn cancel_current(&self) -> bool {
        let token = self.current.lock().ok().and_then(|slot| slot.clone());
        match token {
            Some(token) => {
                info!("cancelling in-flight turn");
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Drop the pending question, waiting for any in-flight turn.
    pub async fn clear_pending(&self) {
        let mut guard = self.pending.lock().await;
        *guard = None;
        self.publish(None);
    }

    async fn run_turn(
        &self,
        mut guard: MutexGuard<'_, Option<PendingQuestion>>,
        text: &str,
    ) -> TurnOutcome {
        let token = CancellationToken::new();
        self.set_current(Some(token.clone()));

        // Taken up front: if this future is dropped mid-turn, no stale
        // question survives.
        let pending = guard.take();
        if pending.is_some() {
            self.publish(None);
        }

        let utterance = Utterance::new(text);
        let (outcome, next) = self
            .dispatcher
            .dispatch(&utterance, pending, &self.ctx, &token)
            .await;

        self.publish(next.as_ref());
        *guard = next;
        self.set_current(None);

        debug!(turn_id = %outcome.turn_id, kind = ?outcome.kind, "turn complete");
        outcome
    }

    fn set_current(&self, token: Option<CancellationToken>) {
        if let Ok(mut slot) = self.current.lock() {
            *slot = token;
        }
    }

    fn publish(&self, pending: Option<&PendingQuestion>) {
        let snapshot = match pending {
            Some(question) => PendingSnapshot {
                skill_ids: question.skill_ids(),
                offered_at: Some(question.offered_time()),
            },
            None => PendingSnapshot::default(),
        };
        self.snapshot_tx.send_replace(snapshot);
    }

    /// Consume utterances from `rx` and send one outcome per utterance to
    /// `tx`, until `rx` closes, `tx` closes or `shutdown` fires.
    ///
    /// Shutdown during a turn cancels its execution; the cancelled outcome
    /// is still delivered.
    pub async fn run(
        self: Arc<Self>,
        mut rx: mpsc::Receiver<String>,
        tx: mpsc::Sender<TurnOutcome>,
        shutdown: CancellationToken,
    ) {
        loop {
            let text = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("conversation loop shutting down");
                    break;
                }
                msg = rx.recv() => match msg {
                    Some(text) => text,
                    None => {
                        debug!("utterance channel closed");
                        break;
                    }
                },
            };

            let turn = self.process(&text);
            tokio::pin!(turn);
            let outcome = tokio::select! {
                outcome = &mut turn => outcome,
                _ = shutdown.cancelled() => {
                    self.cancel_current();
                    turn.await
                }
            };

            if tx.send(outcome).await.is_err() {
                debug!("outcome channel closed");
                break;
            }
        }
    }
}
