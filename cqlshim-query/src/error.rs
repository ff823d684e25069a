//! Error types for statement and batch execution.
//!
//! Failures are split in two layers. A [`StatementFailure`] describes what
//! went wrong with one statement and how the backing store classified it
//! ([`FailureKind`]). A [`BatchError`] is what a caller of the executor sees
//! when the batch as a whole could not complete.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for batch operations.
pub type ExecResult<T> = Result<T, BatchError>;

/// Classification of a statement failure, as reported by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Cluster-state dependent and retryable: write/read timeout,
    /// unavailable replicas, overload, lost connection.
    Transient,
    /// Retrying the same statement cannot succeed: syntax, unknown column,
    /// type mismatch, authorization.
    Permanent,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transient => f.write_str("transient"),
            Self::Permanent => f.write_str("permanent"),
        }
    }
}

/// Failure descriptor for a single statement.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind} failure: {message}")]
pub struct StatementFailure {
    /// How the backing store classified the failure.
    pub kind: FailureKind,
    /// Driver-provided message.
    pub message: String,
}

impl StatementFailure {
    /// Create a transient failure.
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transient,
            message: message.into(),
        }
    }

    /// Create a permanent failure.
    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Permanent,
            message: message.into(),
        }
    }

    /// Check if the failure is retryable.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.kind == FailureKind::Transient
    }
}

/// Errors surfaced by [`crate::BatchExecutor`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    /// A statement failed and the whole batch was abandoned.
    ///
    /// The batch may be resubmitted as a whole; statements of earlier
    /// windows may already have been applied.
    #[error("batch aborted at statement {index}: {failure}")]
    Transient {
        /// Submission index of the failing statement.
        index: usize,
        /// The statement's own failure.
        failure: StatementFailure,
    },

    /// The concurrency ceiling must be at least one.
    #[error("invalid concurrency limit: {0}")]
    InvalidConcurrency(usize),
}

impl BatchError {
    /// Check if the caller may retry the batch.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Index of the statement that aborted the batch, if any.
    #[must_use]
    pub fn failed_index(&self) -> Option<usize> {
        match self {
            Self::Transient { index, .. } => Some(*index),
            Self::InvalidConcurrency(_) => None,
        }
    }

    /// The underlying statement failure, if any.
    #[must_use]
    pub fn failure(&self) -> Option<&StatementFailure> {
        match self {
            Self::Transient { failure, .. } => Some(failure),
            Self::InvalidConcurrency(_) => None,
        }
    }
}

/// Error converting between a [`crate::Value`] and a native type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    /// The value has a different CQL type than requested.
    #[error("cannot convert {found} to {expected}")]
    TypeMismatch {
        /// Requested CQL type.
        expected: &'static str,
        /// Actual value type.
        found: &'static str,
    },

    /// No column with this name exists in the result set.
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    /// A textual value could not be parsed.
    #[error("invalid {expected} literal: {input}")]
    Parse {
        /// Requested CQL type.
        expected: &'static str,
        /// The offending input.
        input: String,
    },
}
