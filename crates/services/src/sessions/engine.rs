//! The session engine: the single orchestrator behind the delivery boundary.
//!
//! All user-facing flows funnel through three entry points: `start`,
//! `answer`, and `timeout`. Per-user transitions are serialized with an
//! async lock, so an answer and a timer expiry for the same user never
//! interleave; the loser of the race observes the already-updated snapshot
//! and is absorbed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use chrono::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use quiz_core::Clock;
use quiz_core::distributor;
use quiz_core::model::{Question, QuizConfig, ResultRecord, TestOutcome, UserId, UserIdentity};
use quiz_core::session::{QuizMode, SessionState, Transition};
use storage::repository::{
    QuestionRepository, ResultSink, SessionStore, Storage, StorageError,
};

use crate::error::EngineError;

use super::view::{
    AnswerFeedback, AnswerOutcome, QuestionPrompt, SessionRules, StartedSession,
    TerminationResult, TimeoutOutcome,
};

/// Padding added to every stored TTL on top of the remaining answer time.
/// Absorbs delivery latency so the snapshot outlives a slow last question.
const DEFAULT_SAFETY_PADDING_SECS: i64 = 300;

/// Orchestrates quiz attempts against the storage adapters.
#[derive(Clone)]
pub struct QuizEngine {
    clock: Clock,
    bank: Arc<dyn QuestionRepository>,
    results: Arc<dyn ResultSink>,
    sessions: Arc<dyn SessionStore>,
    safety_padding: Duration,
    locks: Arc<StdMutex<HashMap<UserId, Arc<Mutex<()>>>>>,
}

impl QuizEngine {
    #[must_use]
    pub fn new(clock: Clock, storage: Storage) -> Self {
        Self {
            clock,
            bank: storage.bank,
            results: storage.results,
            sessions: storage.sessions,
            safety_padding: Duration::seconds(DEFAULT_SAFETY_PADDING_SECS),
            locks: Arc::new(StdMutex::new(HashMap::new())),
        }
    }

    /// Override the TTL padding. Mostly useful for tests that want expiry
    /// to land at a predictable instant.
    #[must_use]
    pub fn with_safety_padding(mut self, padding: Duration) -> Self {
        self.safety_padding = padding;
        self
    }

    /// Whether the user currently has a live snapshot.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Storage` if the session store cannot be read.
    pub async fn has_active_session(&self, user_id: UserId) -> Result<bool, EngineError> {
        Ok(self.sessions.exists(user_id).await?)
    }

    /// Start a new attempt for the user.
    ///
    /// Settings are loaded fresh, the bank is checked against the required
    /// question count, and in testing mode the cooldown gate is enforced
    /// against the user's most recent recorded attempt. On success the
    /// initial snapshot is persisted and the first question returned.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::AlreadyActive` if a live session exists,
    /// `EngineError::Configuration` for missing or invalid settings,
    /// `EngineError::InsufficientQuestions` when the bank is too small,
    /// `EngineError::CooldownActive` when a testing retry comes too early,
    /// or `EngineError::Storage` for adapter failures.
    pub async fn start(
        &self,
        identity: UserIdentity,
        mode: QuizMode,
    ) -> Result<StartedSession, EngineError> {
        let user_id = identity.user_id;
        let lock = self.user_lock(user_id)?;
        let _guard = lock.lock().await;

        if self.sessions.exists(user_id).await? {
            return Err(EngineError::AlreadyActive);
        }

        let config = self.bank.load_config().await.map_err(|e| match e {
            StorageError::InvalidConfig(reason) => {
                warn!(%reason, "quiz settings rejected");
                EngineError::Configuration { reason }
            }
            other => EngineError::Storage(other),
        })?;

        let questions = self.bank.list_questions().await?;
        let required = config.question_count() as usize;
        if questions.len() < required {
            return Err(EngineError::InsufficientQuestions {
                available: questions.len(),
                required,
            });
        }

        if mode == QuizMode::Testing {
            self.check_cooldown(user_id, &config).await?;
        }

        let selected = distributor::select(&questions, required, &mut rand::rng());
        if selected.len() < required {
            return Err(EngineError::InsufficientQuestions {
                available: selected.len(),
                required,
            });
        }

        let state = SessionState::new(identity, mode, selected, config, self.clock.now())?;
        self.sessions.save(&state, self.session_ttl(&state)).await?;
        info!(
            user = %user_id,
            mode = ?state.mode(),
            questions = state.total(),
            "session started"
        );

        Ok(StartedSession {
            rules: SessionRules {
                question_count: state.total(),
                seconds_per_question: state.config().seconds_per_question(),
                max_errors: state.config().max_errors(),
            },
            prompt: prompt(&state)?,
        })
    }

    /// Apply the user's answer to the current question.
    ///
    /// `elapsed_seconds` is measured by the delivery layer from the moment
    /// the question was presented; past the per-question limit the answer
    /// counts as a timeout regardless of the selected option.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::SessionExpired` when no live snapshot exists,
    /// `EngineError::Session` for answers against a terminated session, or
    /// `EngineError::Storage` for adapter failures.
    pub async fn answer(
        &self,
        user_id: UserId,
        selected: usize,
        elapsed_seconds: u32,
    ) -> Result<AnswerOutcome, EngineError> {
        let lock = self.user_lock(user_id)?;
        let _guard = lock.lock().await;

        let Some(mut state) = self.sessions.load(user_id).await? else {
            return Err(EngineError::SessionExpired);
        };

        let answered = state.current_question().cloned();
        match state.apply_answer(selected, elapsed_seconds)? {
            Transition::Next { correct } => {
                let feedback = feedback(&state, answered.as_ref(), correct);
                self.sessions.save(&state, self.session_ttl(&state)).await?;
                Ok(AnswerOutcome::Next {
                    feedback,
                    prompt: prompt(&state)?,
                })
            }
            Transition::Finished {
                outcome,
                notes,
                correct,
            } => {
                let feedback = feedback(&state, answered.as_ref(), correct);
                let result = self.finalize(&state, outcome, notes).await?;
                Ok(AnswerOutcome::Finished { feedback, result })
            }
        }
    }

    /// Handle a per-question timer expiry for `question_index` (0-based).
    ///
    /// Stale timers (the session advanced, terminated, or disappeared) are
    /// absorbed with `TimeoutOutcome::Stale`, so duplicate timer events are
    /// harmless and produce no user-visible effect.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Storage` for adapter failures.
    pub async fn timeout(
        &self,
        user_id: UserId,
        question_index: usize,
    ) -> Result<TimeoutOutcome, EngineError> {
        let lock = self.user_lock(user_id)?;
        let _guard = lock.lock().await;

        let Some(mut state) = self.sessions.load(user_id).await? else {
            debug!(user = %user_id, question_index, "timer fired with no live session");
            return Ok(TimeoutOutcome::Stale);
        };

        match state.apply_timeout(question_index) {
            Some(Transition::Finished { outcome, notes, .. }) => {
                let result = self.finalize(&state, outcome, notes).await?;
                Ok(TimeoutOutcome::Finished(result))
            }
            _ => {
                debug!(
                    user = %user_id,
                    question_index,
                    current = state.current_index(),
                    "stale timer absorbed"
                );
                Ok(TimeoutOutcome::Stale)
            }
        }
    }

    /// Single termination path: append the result row, then drop the
    /// snapshot. If the append fails the snapshot stays live, so the prior
    /// state remains authoritative and the event can be retried.
    async fn finalize(
        &self,
        state: &SessionState,
        outcome: TestOutcome,
        notes: Option<String>,
    ) -> Result<TerminationResult, EngineError> {
        let record = ResultRecord::new(
            state.identity(),
            self.clock.now_report(),
            outcome,
            state.correct_count(),
            notes.clone(),
        );
        self.results.append_result(&record).await?;
        self.sessions.delete(state.user_id()).await?;
        info!(
            user = %state.user_id(),
            %outcome,
            correct = state.correct_count(),
            total = state.total(),
            "session finished"
        );

        Ok(TerminationResult {
            outcome,
            correct_count: state.correct_count(),
            total: state.total(),
            notes,
        })
    }

    async fn check_cooldown(
        &self,
        user_id: UserId,
        config: &QuizConfig,
    ) -> Result<(), EngineError> {
        let Some(last) = self.results.last_attempt_time(user_id).await? else {
            return Ok(());
        };
        let cooldown = config.cooldown();
        let elapsed = self.clock.now() - last;
        if elapsed < cooldown {
            return Err(EngineError::CooldownActive {
                remaining: cooldown - elapsed,
            });
        }
        Ok(())
    }

    /// TTL for a stored snapshot: time to answer everything that is left,
    /// plus the fixed padding.
    fn session_ttl(&self, state: &SessionState) -> Duration {
        let answer_time =
            (state.remaining() as i64) * i64::from(state.config().seconds_per_question());
        Duration::seconds(answer_time) + self.safety_padding
    }

    fn user_lock(&self, user_id: UserId) -> Result<Arc<Mutex<()>>, EngineError> {
        let mut guard = self
            .locks
            .lock()
            .map_err(|e| EngineError::Storage(StorageError::Connection(e.to_string())))?;
        Ok(Arc::clone(guard.entry(user_id).or_default()))
    }
}

fn prompt(state: &SessionState) -> Result<QuestionPrompt, EngineError> {
    let question = state.current_question().ok_or(EngineError::SessionExpired)?;
    Ok(QuestionPrompt {
        number: state.current_index() + 1,
        total: state.total(),
        seconds_to_answer: state.config().seconds_per_question(),
        question: question.clone(),
    })
}

/// Explanations accompany wrong answers in training mode only.
fn feedback(state: &SessionState, question: Option<&Question>, correct: bool) -> AnswerFeedback {
    let explanation = match (state.mode(), correct) {
        (QuizMode::Training, false) => {
            question.and_then(|q| q.explanation().map(str::to_owned))
        }
        _ => None,
    };
    AnswerFeedback {
        correct,
        explanation,
    }
}
