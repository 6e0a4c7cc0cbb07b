//! Data handed across the delivery boundary. These carry everything a
//! transport needs to render a message without reaching back into the engine.

use serde::Serialize;

use quiz_core::model::{Question, TestOutcome};

/// Attempt parameters announced when a session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionRules {
    pub question_count: usize,
    pub seconds_per_question: u32,
    pub max_errors: u32,
}

/// One question as presented to the user. `number` is 1-based.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionPrompt {
    pub number: usize,
    pub total: usize,
    pub seconds_to_answer: u32,
    pub question: Question,
}

/// A freshly started attempt: the rules plus the first question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StartedSession {
    pub rules: SessionRules,
    pub prompt: QuestionPrompt,
}

/// Feedback on the answer just given. The explanation is present only in
/// training mode after an incorrect answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerFeedback {
    pub correct: bool,
    pub explanation: Option<String>,
}

/// Terminal summary of an attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TerminationResult {
    pub outcome: TestOutcome,
    pub correct_count: u32,
    pub total: usize,
    pub notes: Option<String>,
}

/// What happened after an answer was applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AnswerOutcome {
    /// The session moved on; present the next question.
    Next {
        feedback: AnswerFeedback,
        prompt: QuestionPrompt,
    },
    /// The answer terminated the attempt.
    Finished {
        feedback: AnswerFeedback,
        result: TerminationResult,
    },
}

/// What happened after a per-question timer expired.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TimeoutOutcome {
    /// The timer was current; the attempt failed.
    Finished(TerminationResult),
    /// The timer lost the race against an answer or an earlier terminal
    /// event. Nothing to deliver.
    Stale,
}
