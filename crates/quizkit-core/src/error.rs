//! Error types for authentication and assessment.
//!
//! [`AuthError`] is defined here rather than in `quizkit-client` so the
//! session manager can treat every backend failure the same way without
//! string matching.

use std::time::Duration;

use thiserror::Error;

use crate::model::TaskType;

/// Errors from the token endpoints (login and refresh).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The request did not complete within the allotted time.
    #[error("request timed out after {0}ms")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    Network(String),

    /// The endpoint answered with a non-2xx status.
    #[error("auth endpoint returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The endpoint answered 2xx but the body was unusable.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl AuthError {
    /// A [`AuthError::Timeout`] after `after`, saturating at `u64::MAX` ms.
    pub fn timeout(after: Duration) -> Self {
        AuthError::Timeout(u64::try_from(after.as_millis()).unwrap_or(u64::MAX))
    }

    /// Returns `true` if the server rejected the credentials or token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AuthError::Status { status, .. } if *status == 401 || *status == 422)
    }
}

/// A single answer could not be graded against its task.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GradingError {
    /// The answer's shape does not match the task variant.
    #[error("answer shape mismatch: {expected} task received a {found} answer")]
    AnswerShape { expected: TaskType, found: TaskType },

    /// The answer selects an option the task does not have.
    #[error("option index {index} out of range for a task with {options} options")]
    OptionOutOfRange { index: usize, options: usize },
}

/// Scoring a whole attempt failed. No partial result is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    /// The attempt's answer count differs from the test's task count.
    #[error("attempt has {answers} answers but the test has {tasks} tasks")]
    ShapeMismatch { tasks: usize, answers: usize },

    /// One of the answers could not be graded.
    #[error("task {task}: {source}")]
    Grading {
        task: usize,
        #[source]
        source: GradingError,
    },
}

/// Appending an attempt to a test instance failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("{0} has already submitted this test")]
    AlreadySubmitted(String),

    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

/// Publishing a test into a subject failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("test {test_id} is already published with remark {remark:?}")]
    Duplicate { test_id: String, remark: String },
}
