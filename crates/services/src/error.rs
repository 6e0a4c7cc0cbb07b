//! Error taxonomy for session orchestration.

use chrono::Duration;
use thiserror::Error;

use quiz_core::session::SessionStateError;
use storage::repository::StorageError;

/// Errors surfaced by the session engine.
///
/// Precondition failures carry enough data for the delivery layer to build a
/// user-facing message; infrastructure failures stay chained to their source.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    /// Quiz settings are missing or out of range.
    #[error("quiz settings unavailable: {reason}")]
    Configuration { reason: String },

    /// The bank holds fewer questions than one attempt needs.
    #[error("question bank too small: {available} available, {required} required")]
    InsufficientQuestions { available: usize, required: usize },

    /// Testing-mode retry attempted before the cooldown elapsed.
    #[error("next attempt available in {}", format_remaining(*remaining))]
    CooldownActive { remaining: Duration },

    /// The user already has a live session.
    #[error("an attempt is already in progress")]
    AlreadyActive,

    /// No live session for the user; it finished or its TTL lapsed.
    #[error("no active session")]
    SessionExpired,

    #[error(transparent)]
    Session(#[from] SessionStateError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Renders a remaining cooldown as hours once at least one hour is left,
/// otherwise as minutes. Rounds up so the message never promises an attempt
/// earlier than the gate allows.
fn format_remaining(remaining: Duration) -> String {
    let minutes = ((remaining.num_seconds() + 59) / 60).max(1);
    if minutes >= 60 {
        format!("{} h", (minutes + 59) / 60)
    } else {
        format!("{minutes} min")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_cooldown_prints_minutes() {
        let err = EngineError::CooldownActive {
            remaining: Duration::minutes(30),
        };
        assert_eq!(err.to_string(), "next attempt available in 30 min");
    }

    #[test]
    fn long_cooldown_prints_hours_rounded_up() {
        let err = EngineError::CooldownActive {
            remaining: Duration::hours(23),
        };
        assert_eq!(err.to_string(), "next attempt available in 23 h");

        let err = EngineError::CooldownActive {
            remaining: Duration::minutes(61),
        };
        assert_eq!(err.to_string(), "next attempt available in 2 h");
    }

    #[test]
    fn sub_minute_cooldown_never_prints_zero() {
        let err = EngineError::CooldownActive {
            remaining: Duration::seconds(10),
        };
        assert_eq!(err.to_string(), "next attempt available in 1 min");
    }
}
