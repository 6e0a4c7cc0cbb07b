use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use quiz_core::Clock;
use quiz_core::model::{Question, QuizConfig, RawQuestion, ResultRecord, UserId, valid_questions};
use quiz_core::session::SessionState;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("invalid settings: {0}")]
    InvalidConfig(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── ADAPTER CONTRACTS ─────────────────────────────────────────────────────────
//

/// Read-side contract for the question bank and quiz settings.
///
/// Read once per session start; the engine never caches across sessions.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Fetch all valid questions from the bank.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the bank cannot be read.
    async fn list_questions(&self) -> Result<Vec<Question>, StorageError>;

    /// Fetch the current quiz settings.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidConfig` when the settings record is
    /// missing or malformed, or other storage errors for transport failures.
    async fn load_config(&self) -> Result<QuizConfig, StorageError>;
}

/// Append-only sink for completed attempts, also serving cooldown lookups.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Append one result row. Rows are write-once.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the row cannot be appended.
    async fn append_result(&self, record: &ResultRecord) -> Result<(), StorageError>;

    /// Completion time of the user's most recent attempt, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lookup fails.
    async fn last_attempt_time(&self, user_id: UserId)
    -> Result<Option<DateTime<Utc>>, StorageError>;
}

/// TTL-capable keyed store for session snapshots.
///
/// Every write carries an explicit TTL; the expiry is a safety net against
/// abandoned sessions, never the primary termination mechanism.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the live snapshot for a user. Expired entries read as absent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn load(&self, user_id: UserId) -> Result<Option<SessionState>, StorageError>;

    /// Persist the whole snapshot with the given TTL.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be written.
    async fn save(&self, state: &SessionState, ttl: Duration) -> Result<(), StorageError>;

    /// Remove the snapshot for a user. Removing an absent entry is not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be written.
    async fn delete(&self, user_id: UserId) -> Result<(), StorageError>;

    /// Whether a live snapshot exists for the user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn exists(&self, user_id: UserId) -> Result<bool, StorageError> {
        Ok(self.load(user_id).await?.is_some())
    }
}

//
// ─── IN-MEMORY IMPLEMENTATIONS ─────────────────────────────────────────────────
//

/// In-memory question bank for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryBank {
    questions: Arc<Mutex<Vec<Question>>>,
    config: Arc<Mutex<Option<QuizConfig>>>,
}

impl InMemoryBank {
    #[must_use]
    pub fn new(questions: Vec<Question>, config: QuizConfig) -> Self {
        Self {
            questions: Arc::new(Mutex::new(questions)),
            config: Arc::new(Mutex::new(Some(config))),
        }
    }

    /// Build a bank from raw source rows, silently dropping malformed ones.
    #[must_use]
    pub fn from_rows(rows: impl IntoIterator<Item = RawQuestion>, config: QuizConfig) -> Self {
        Self::new(valid_questions(rows), config)
    }

    /// A bank with questions but no settings record, for failure-path tests.
    #[must_use]
    pub fn without_config(questions: Vec<Question>) -> Self {
        Self {
            questions: Arc::new(Mutex::new(questions)),
            config: Arc::new(Mutex::new(None)),
        }
    }

    /// Replace the settings record, simulating an admin edit.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn set_config(&self, config: QuizConfig) -> Result<(), StorageError> {
        let mut guard = self
            .config
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(config);
        Ok(())
    }
}

#[async_trait]
impl QuestionRepository for InMemoryBank {
    async fn list_questions(&self) -> Result<Vec<Question>, StorageError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn load_config(&self) -> Result<QuizConfig, StorageError> {
        let guard = self
            .config
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .clone()
            .ok_or_else(|| StorageError::InvalidConfig("settings record not populated".into()))
    }
}

/// In-memory append-only result log.
#[derive(Clone, Default)]
pub struct InMemoryResultLog {
    records: Arc<Mutex<Vec<ResultRecord>>>,
}

impl InMemoryResultLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all appended rows, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn records(&self) -> Result<Vec<ResultRecord>, StorageError> {
        let guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }
}

#[async_trait]
impl ResultSink for InMemoryResultLog {
    async fn append_result(&self, record: &ResultRecord) -> Result<(), StorageError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.push(record.clone());
        Ok(())
    }

    async fn last_attempt_time(
        &self,
        user_id: UserId,
    ) -> Result<Option<DateTime<Utc>>, StorageError> {
        let guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .iter()
            .filter(|r| r.user_id() == user_id)
            .map(|r| r.completed_at().with_timezone(&Utc))
            .max())
    }
}

/// In-memory session store honoring TTLs against a `Clock`.
#[derive(Clone)]
pub struct InMemorySessionStore {
    clock: Clock,
    entries: Arc<Mutex<HashMap<UserId, (SessionState, DateTime<Utc>)>>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// A view over the same entries driven by a different clock. Lets tests
    /// observe expiry without sleeping.
    #[must_use]
    pub fn with_clock(&self, clock: Clock) -> Self {
        Self {
            clock,
            entries: Arc::clone(&self.entries),
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, user_id: UserId) -> Result<Option<SessionState>, StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        match guard.get(&user_id) {
            Some((_, expires_at)) if *expires_at <= self.clock.now() => {
                guard.remove(&user_id);
                Ok(None)
            }
            Some((state, _)) => Ok(Some(state.clone())),
            None => Ok(None),
        }
    }

    async fn save(&self, state: &SessionState, ttl: Duration) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(state.user_id(), (state.clone(), self.clock.now() + ttl));
        Ok(())
    }

    async fn delete(&self, user_id: UserId) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(&user_id);
        Ok(())
    }
}

//
// ─── STORAGE AGGREGATE ─────────────────────────────────────────────────────────
//

/// Aggregates the three adapters behind trait objects for easy backend
/// swapping.
#[derive(Clone)]
pub struct Storage {
    pub bank: Arc<dyn QuestionRepository>,
    pub results: Arc<dyn ResultSink>,
    pub sessions: Arc<dyn SessionStore>,
}

impl Storage {
    /// Build a `Storage` with in-memory backends throughout.
    #[must_use]
    pub fn in_memory(
        clock: Clock,
        questions: Vec<Question>,
        config: QuizConfig,
    ) -> Self {
        Self {
            bank: Arc::new(InMemoryBank::new(questions, config)),
            results: Arc::new(InMemoryResultLog::new()),
            sessions: Arc::new(InMemorySessionStore::new(clock)),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
