use thiserror::Error;

use crate::model::{ConfigError, QuestionError};
use crate::session::SessionStateError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Session(#[from] SessionStateError),
}
