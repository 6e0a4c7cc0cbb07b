use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ids::UserId;

//
// ─── OUTCOME ───────────────────────────────────────────────────────────────────
//

/// Terminal result of a quiz attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestOutcome {
    Passed,
    Failed,
}

impl TestOutcome {
    #[must_use]
    pub fn is_passed(self) -> bool {
        matches!(self, TestOutcome::Passed)
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestOutcome::Passed => write!(f, "passed"),
            TestOutcome::Failed => write!(f, "failed"),
        }
    }
}

//
// ─── USER IDENTITY ─────────────────────────────────────────────────────────────
//

/// Identity details captured at session start and echoed into the result row.
///
/// `full_name` is the user-supplied legal name; the chat profile fields feed
/// the display name only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub user_id: UserId,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub full_name: String,
}

impl UserIdentity {
    /// Display name for the result sheet: username when present, otherwise
    /// "first last", otherwise first name alone.
    #[must_use]
    pub fn display_name(&self) -> String {
        if let Some(username) = self.username.as_deref()
            && !username.trim().is_empty()
        {
            return username.to_owned();
        }
        match self.last_name.as_deref() {
            Some(last) if !last.trim().is_empty() => format!("{} {last}", self.first_name),
            _ => self.first_name.clone(),
        }
    }
}

//
// ─── RESULT RECORD ─────────────────────────────────────────────────────────────
//

/// One appended row per completed attempt. Write-once; never mutated.
///
/// `completed_at` carries the reporting offset (UTC+3) so the rendered
/// ISO-8601 string matches the sheet convention.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    user_id: UserId,
    display_name: String,
    completed_at: DateTime<FixedOffset>,
    full_name: String,
    outcome: TestOutcome,
    correct_count: u32,
    notes: Option<String>,
}

impl ResultRecord {
    #[must_use]
    pub fn new(
        identity: &UserIdentity,
        completed_at: DateTime<FixedOffset>,
        outcome: TestOutcome,
        correct_count: u32,
        notes: Option<String>,
    ) -> Self {
        Self {
            user_id: identity.user_id,
            display_name: identity.display_name(),
            completed_at,
            full_name: identity.full_name.clone(),
            outcome,
            correct_count,
            notes,
        }
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<FixedOffset> {
        self.completed_at
    }

    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    #[must_use]
    pub fn outcome(&self) -> TestOutcome {
        self.outcome
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
