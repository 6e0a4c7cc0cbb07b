#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    InMemoryBank, InMemoryResultLog, InMemorySessionStore, QuestionRepository, ResultSink,
    SessionStore, Storage, StorageError,
};
pub use sqlite::{SqliteInitError, SqliteRepository};
