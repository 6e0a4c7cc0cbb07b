//! Session orchestration: question distribution, answer and timeout
//! transitions, snapshot persistence, and result emission.

pub mod engine;
pub mod view;

pub use engine::QuizEngine;
pub use view::{
    AnswerFeedback, AnswerOutcome, QuestionPrompt, SessionRules, StartedSession,
    TerminationResult, TimeoutOutcome,
};
