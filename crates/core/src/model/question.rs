use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

/// Number of answer option slots a question carries.
pub const OPTION_COUNT: usize = 4;

/// Minimum number of non-empty options for a question to be answerable.
pub const MIN_FILLED_OPTIONS: usize = 2;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question category cannot be empty")]
    EmptyCategory,

    #[error("question text cannot be empty")]
    EmptyText,

    #[error("question must offer at least {MIN_FILLED_OPTIONS} non-empty options, got {provided}")]
    TooFewOptions { provided: usize },

    #[error("correct option index must be < {OPTION_COUNT}, got {provided}")]
    CorrectIndexOutOfRange { provided: usize },

    #[error("correct option index {provided} points at an empty option")]
    CorrectOptionEmpty { provided: usize },

    #[error("correct answer number must be between 1 and {OPTION_COUNT}, got {provided}")]
    InvalidCorrectNumber { provided: usize },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A multiple-choice question from the bank.
///
/// Immutable once loaded. `options` always has `OPTION_COUNT` slots; trailing
/// slots may be empty strings when the source row offered fewer answers.
/// `correct_index` is zero-based and always points at a non-empty option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    category: String,
    text: String,
    options: [String; OPTION_COUNT],
    correct_index: usize,
    is_critical: bool,
    explanation: Option<String>,
}

impl Question {
    /// Validate and build a question.
    ///
    /// # Errors
    ///
    /// - `QuestionError::EmptyCategory` / `EmptyText` for blank fields
    /// - `QuestionError::TooFewOptions` if fewer than `MIN_FILLED_OPTIONS`
    ///   options are non-empty
    /// - `QuestionError::CorrectIndexOutOfRange` / `CorrectOptionEmpty` if the
    ///   correct answer does not reference a usable option
    pub fn new(
        id: QuestionId,
        category: impl Into<String>,
        text: impl Into<String>,
        options: [String; OPTION_COUNT],
        correct_index: usize,
        is_critical: bool,
        explanation: Option<String>,
    ) -> Result<Self, QuestionError> {
        let category = category.into();
        let text = text.into();

        if category.trim().is_empty() {
            return Err(QuestionError::EmptyCategory);
        }
        if text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }

        let filled = options.iter().filter(|o| !o.trim().is_empty()).count();
        if filled < MIN_FILLED_OPTIONS {
            return Err(QuestionError::TooFewOptions { provided: filled });
        }

        if correct_index >= OPTION_COUNT {
            return Err(QuestionError::CorrectIndexOutOfRange {
                provided: correct_index,
            });
        }
        if options[correct_index].trim().is_empty() {
            return Err(QuestionError::CorrectOptionEmpty {
                provided: correct_index,
            });
        }

        let explanation = explanation.filter(|e| !e.trim().is_empty());

        Ok(Self {
            id,
            category,
            text,
            options,
            correct_index,
            is_critical,
            explanation,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String; OPTION_COUNT] {
        &self.options
    }

    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    #[must_use]
    pub fn is_critical(&self) -> bool {
        self.is_critical
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    /// Whether the zero-based `selected` option is the correct answer.
    #[must_use]
    pub fn is_correct(&self, selected: usize) -> bool {
        selected == self.correct_index
    }
}

//
// ─── RAW ROWS ──────────────────────────────────────────────────────────────────
//

/// One unvalidated row from a question source. `correct_number` is 1-based,
/// matching the source column convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawQuestion {
    pub id: QuestionId,
    pub category: String,
    pub text: String,
    pub options: [String; OPTION_COUNT],
    pub correct_number: usize,
    pub is_critical: bool,
    pub explanation: Option<String>,
}

impl RawQuestion {
    /// Validate the row into a `Question`, translating the 1-based answer
    /// column to a zero-based index.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::InvalidCorrectNumber` when the answer column
    /// is out of range, or any `Question::new` error for the other fields.
    pub fn validate(self) -> Result<Question, QuestionError> {
        if self.correct_number == 0 || self.correct_number > OPTION_COUNT {
            return Err(QuestionError::InvalidCorrectNumber {
                provided: self.correct_number,
            });
        }
        Question::new(
            self.id,
            self.category,
            self.text,
            self.options,
            self.correct_number - 1,
            self.is_critical,
            self.explanation,
        )
    }
}

/// Validate a batch of source rows, keeping the good ones in order.
/// Lenient: a malformed row drops out instead of failing the whole bank.
#[must_use]
pub fn valid_questions(rows: impl IntoIterator<Item = RawQuestion>) -> Vec<Question> {
    rows.into_iter()
        .filter_map(|row| row.validate().ok())
        .collect()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
