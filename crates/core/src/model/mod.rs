mod config;
mod ids;
mod outcome;
mod question;

pub use config::{ConfigError, QuizConfig};
pub use ids::{ParseIdError, QuestionId, UserId};
pub use outcome::{ResultRecord, TestOutcome, UserIdentity};
pub use question::{
    MIN_FILLED_OPTIONS, OPTION_COUNT, Question, QuestionError, RawQuestion, valid_questions,
};
