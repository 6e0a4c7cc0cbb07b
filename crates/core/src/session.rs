//! Session snapshot and the pure per-question transition rules.
//!
//! `SessionState` is the complete, externally persisted snapshot of one
//! user's in-progress attempt. All mutation happens through `apply_answer`
//! and `apply_timeout`; the orchestration layer owns loading, persisting,
//! and result emission.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Question, QuizConfig, TestOutcome, UserId, UserIdentity};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionStateError {
    #[error("session has no questions")]
    Empty,

    #[error("session already terminated")]
    Terminated,
}

//
// ─── MODE ──────────────────────────────────────────────────────────────────────
//

/// Behavioral mode of an attempt.
///
/// Training surfaces explanations after wrong answers and skips the
/// cooldown gate; the transition rules are otherwise identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizMode {
    Training,
    Testing,
}

//
// ─── TRANSITION ────────────────────────────────────────────────────────────────
//

/// Result of applying one answer or timeout event.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// The session moved on to the next question.
    Next { correct: bool },
    /// The session reached a terminal state.
    Finished {
        outcome: TestOutcome,
        notes: Option<String>,
        correct: bool,
    },
}

impl Transition {
    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self, Transition::Finished { .. })
    }
}

//
// ─── SESSION STATE ─────────────────────────────────────────────────────────────
//

/// Snapshot of one user's in-progress attempt.
///
/// Always persisted whole; a process restart resumes from the last
/// committed snapshot with no interpretation ambiguity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    identity: UserIdentity,
    mode: QuizMode,
    questions: Vec<Question>,
    current_index: usize,
    correct_count: u32,
    error_count: u32,
    config: QuizConfig,
    started_at: DateTime<Utc>,
    #[serde(default)]
    terminated: bool,
}

impl SessionState {
    /// Build the initial snapshot for a freshly distributed question list.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::Empty` if `questions` is empty.
    pub fn new(
        identity: UserIdentity,
        mode: QuizMode,
        questions: Vec<Question>,
        config: QuizConfig,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionStateError> {
        if questions.is_empty() {
            return Err(SessionStateError::Empty);
        }

        Ok(Self {
            identity,
            mode,
            questions,
            current_index: 0,
            correct_count: 0,
            error_count: 0,
            config,
            started_at,
            terminated: false,
        })
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.identity.user_id
    }

    /// Identity captured at session start; result rows are built from this
    /// snapshot rather than a fresh lookup.
    #[must_use]
    pub fn identity(&self) -> &UserIdentity {
        &self.identity
    }

    #[must_use]
    pub fn mode(&self) -> QuizMode {
        self.mode
    }

    #[must_use]
    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    /// Total number of questions in this attempt.
    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    /// Number of questions not yet answered, timeout padding included by the
    /// caller when computing TTLs.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.questions.len().saturating_sub(self.current_index)
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.terminated {
            return None;
        }
        self.questions.get(self.current_index)
    }

    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Apply a user's answer to the current question.
    ///
    /// A late answer (`elapsed_seconds` past the per-question limit) is
    /// treated as a timeout regardless of the selected option.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::Terminated` if the session already
    /// reached a terminal state.
    pub fn apply_answer(
        &mut self,
        selected: usize,
        elapsed_seconds: u32,
    ) -> Result<Transition, SessionStateError> {
        if self.terminated {
            return Err(SessionStateError::Terminated);
        }
        let Some(question) = self.questions.get(self.current_index) else {
            return Err(SessionStateError::Terminated);
        };

        let number = self.current_index + 1;
        if elapsed_seconds > self.config.seconds_per_question() {
            return Ok(self.finish(
                TestOutcome::Failed,
                Some(format!("timeout on question #{number}")),
                false,
            ));
        }

        if question.is_correct(selected) {
            self.correct_count += 1;
            return Ok(self.advance(true));
        }

        if question.is_critical() {
            return Ok(self.finish(
                TestOutcome::Failed,
                Some(format!("critical question #{number}")),
                false,
            ));
        }

        self.error_count += 1;
        if self.error_count > self.config.max_errors() {
            return Ok(self.finish(
                TestOutcome::Failed,
                Some(format!("errors exhausted at question #{number}")),
                false,
            ));
        }

        Ok(self.advance(false))
    }

    /// Apply a per-question timer expiry.
    ///
    /// Returns `None` when the timer is stale: the session already moved
    /// past `question_index` or terminated. Duplicate timer events are
    /// therefore idempotent.
    pub fn apply_timeout(&mut self, question_index: usize) -> Option<Transition> {
        if self.terminated
            || self.current_index != question_index
            || self.current_index >= self.questions.len()
        {
            return None;
        }

        let number = question_index + 1;
        Some(self.finish(
            TestOutcome::Failed,
            Some(format!("timeout on question #{number}")),
            false,
        ))
    }

    fn advance(&mut self, correct: bool) -> Transition {
        self.current_index += 1;
        if self.current_index >= self.questions.len() {
            let outcome = if self.error_count <= self.config.max_errors() {
                TestOutcome::Passed
            } else {
                TestOutcome::Failed
            };
            return self.finish(outcome, None, correct);
        }
        Transition::Next { correct }
    }

    fn finish(&mut self, outcome: TestOutcome, notes: Option<String>, correct: bool) -> Transition {
        self.terminated = true;
        Transition::Finished {
            outcome,
            notes,
            correct,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OPTION_COUNT, QuestionId};
    use crate::time::fixed_now;

    fn build_question(id: u32, critical: bool) -> Question {
        let options: [String; OPTION_COUNT] = ["a", "b", "c", "d"].map(str::to_owned);
        Question::new(
            QuestionId::new(id),
            "general",
            format!("question {id}"),
            options,
            0,
            critical,
            None,
        )
        .unwrap()
    }

    fn build_identity() -> UserIdentity {
        UserIdentity {
            user_id: UserId::new(1),
            username: Some("alex".to_owned()),
            first_name: "Alex".to_owned(),
            last_name: None,
            full_name: "Alex".to_owned(),
        }
    }

    fn build_state(question_count: u32, max_errors: u32) -> SessionState {
        let questions = (0..question_count)
            .map(|id| build_question(id, false))
            .collect();
        let config = QuizConfig::new(question_count, max_errors, 24.0, 30).unwrap();
        SessionState::new(
            build_identity(),
            QuizMode::Testing,
            questions,
            config,
            fixed_now(),
        )
        .unwrap()
    }

    #[test]
    fn empty_question_list_is_rejected() {
        let config = QuizConfig::new(5, 1, 24.0, 30).unwrap();
        let err = SessionState::new(
            build_identity(),
            QuizMode::Testing,
            Vec::new(),
            config,
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, SessionStateError::Empty);
    }

    #[test]
    fn all_correct_answers_pass() {
        let mut state = build_state(3, 1);

        assert_eq!(
            state.apply_answer(0, 5).unwrap(),
            Transition::Next { correct: true }
        );
        assert_eq!(
            state.apply_answer(0, 5).unwrap(),
            Transition::Next { correct: true }
        );
        let last = state.apply_answer(0, 5).unwrap();
        assert_eq!(
            last,
            Transition::Finished {
                outcome: TestOutcome::Passed,
                notes: None,
                correct: true,
            }
        );
        assert_eq!(state.correct_count(), 3);
        assert!(state.is_terminated());
    }

    #[test]
    fn wrong_answers_within_budget_advance() {
        let mut state = build_state(5, 2);

        assert_eq!(
            state.apply_answer(3, 5).unwrap(),
            Transition::Next { correct: false }
        );
        assert_eq!(state.error_count(), 1);
        assert_eq!(state.current_index(), 1);
    }

    #[test]
    fn third_error_with_budget_of_two_terminates() {
        let mut state = build_state(5, 2);

        state.apply_answer(3, 5).unwrap();
        state.apply_answer(3, 5).unwrap();
        let t = state.apply_answer(3, 5).unwrap();
        assert_eq!(
            t,
            Transition::Finished {
                outcome: TestOutcome::Failed,
                notes: Some("errors exhausted at question #3".to_owned()),
                correct: false,
            }
        );
    }

    #[test]
    fn critical_question_terminates_immediately() {
        let questions = vec![build_question(0, true), build_question(1, false)];
        let config = QuizConfig::new(2, 5, 24.0, 30).unwrap();
        let mut state = SessionState::new(
            build_identity(),
            QuizMode::Testing,
            questions,
            config,
            fixed_now(),
        )
        .unwrap();

        let t = state.apply_answer(2, 5).unwrap();
        assert_eq!(
            t,
            Transition::Finished {
                outcome: TestOutcome::Failed,
                notes: Some("critical question #1".to_owned()),
                correct: false,
            }
        );
    }

    #[test]
    fn late_answer_times_out_even_when_correct() {
        let mut state = build_state(3, 1);

        let t = state.apply_answer(0, 31).unwrap();
        assert_eq!(
            t,
            Transition::Finished {
                outcome: TestOutcome::Failed,
                notes: Some("timeout on question #1".to_owned()),
                correct: false,
            }
        );
        assert_eq!(state.correct_count(), 0);
    }

    #[test]
    fn wrong_answer_on_last_question_within_budget_still_passes() {
        let mut state = build_state(2, 1);

        state.apply_answer(0, 5).unwrap();
        let t = state.apply_answer(3, 5).unwrap();
        assert_eq!(
            t,
            Transition::Finished {
                outcome: TestOutcome::Passed,
                notes: None,
                correct: false,
            }
        );
        assert_eq!(state.correct_count(), 1);
        assert_eq!(state.error_count(), 1);
    }

    #[test]
    fn timeout_on_current_question_terminates() {
        let mut state = build_state(3, 1);
        state.apply_answer(0, 5).unwrap();

        let t = state.apply_timeout(1).unwrap();
        assert_eq!(
            t,
            Transition::Finished {
                outcome: TestOutcome::Failed,
                notes: Some("timeout on question #2".to_owned()),
                correct: false,
            }
        );
    }

    #[test]
    fn stale_timeout_is_a_no_op() {
        let mut state = build_state(3, 1);
        state.apply_answer(0, 5).unwrap();

        // Timer for question 0 fires after the user already advanced.
        assert_eq!(state.apply_timeout(0), None);
        assert!(!state.is_terminated());
        assert_eq!(state.current_index(), 1);
    }

    #[test]
    fn events_after_termination_are_rejected() {
        let mut state = build_state(1, 0);
        state.apply_answer(0, 5).unwrap();

        assert_eq!(
            state.apply_answer(0, 5).unwrap_err(),
            SessionStateError::Terminated
        );
        assert_eq!(state.apply_timeout(0), None);
    }
}
