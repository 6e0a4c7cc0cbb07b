use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("question count must be > 0")]
    InvalidQuestionCount,

    #[error("seconds per question must be > 0")]
    InvalidSecondsPerQuestion,

    #[error("cooldown hours must be non-negative and finite, got {provided}")]
    InvalidCooldownHours { provided: f64 },
}

//
// ─── QUIZ CONFIG ───────────────────────────────────────────────────────────────
//

/// Administrator-controlled quiz parameters.
///
/// Loaded fresh from the settings source at every session start and embedded
/// into the session snapshot, so a mid-session settings edit never changes the
/// rules of a running attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizConfig {
    question_count: u32,
    max_errors: u32,
    cooldown_hours: f64,
    seconds_per_question: u32,
}

impl QuizConfig {
    /// Validate and build a config.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a field is out of range. Missing or
    /// non-numeric source cells are an adapter-level parse failure and never
    /// reach this constructor.
    pub fn new(
        question_count: u32,
        max_errors: u32,
        cooldown_hours: f64,
        seconds_per_question: u32,
    ) -> Result<Self, ConfigError> {
        if question_count == 0 {
            return Err(ConfigError::InvalidQuestionCount);
        }
        if seconds_per_question == 0 {
            return Err(ConfigError::InvalidSecondsPerQuestion);
        }
        if !cooldown_hours.is_finite() || cooldown_hours < 0.0 {
            return Err(ConfigError::InvalidCooldownHours {
                provided: cooldown_hours,
            });
        }

        Ok(Self {
            question_count,
            max_errors,
            cooldown_hours,
            seconds_per_question,
        })
    }

    #[must_use]
    pub fn question_count(&self) -> u32 {
        self.question_count
    }

    #[must_use]
    pub fn max_errors(&self) -> u32 {
        self.max_errors
    }

    #[must_use]
    pub fn cooldown_hours(&self) -> f64 {
        self.cooldown_hours
    }

    #[must_use]
    pub fn seconds_per_question(&self) -> u32 {
        self.seconds_per_question
    }

    /// Minimum gap required between testing-mode attempts.
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn cooldown(&self) -> Duration {
        Duration::seconds((self.cooldown_hours * 3600.0).round() as i64)
    }

    /// Deadline for answering a single question.
    #[must_use]
    pub fn time_per_question(&self) -> Duration {
        Duration::seconds(i64::from(self.seconds_per_question))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
