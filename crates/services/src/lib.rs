#![forbid(unsafe_code)]

pub mod error;
pub mod sessions;

pub use quiz_core::Clock;

pub use error::EngineError;
pub use sessions::{
    AnswerFeedback, AnswerOutcome, QuestionPrompt, QuizEngine, SessionRules, StartedSession,
    TerminationResult, TimeoutOutcome,
};
