//! Error types for cluster operations.

use cqlshim_query::{BatchError, ConversionError, StatementFailure};
use thiserror::Error;

/// Result type for cluster operations.
pub type ScyllaResult<T> = Result<T, ScyllaError>;

/// Errors that can occur while talking to the cluster.
#[derive(Error, Debug)]
pub enum ScyllaError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error.
    #[error("Query error: {0}")]
    Query(String),

    /// Prepared statement error.
    #[error("Prepared statement error: {0}")]
    PreparedStatement(String),

    /// A windowed batch was aborted.
    #[error(transparent)]
    Batch(#[from] BatchError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Type conversion error.
    #[error("Type conversion error: {0}")]
    TypeConversion(String),

    /// Timeout error.
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Keyspace error.
    #[error("Keyspace error: {0}")]
    Keyspace(String),

    /// Authentication error.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Authorization error.
    #[error("Authorization failed: {0}")]
    Authorization(String),

    /// Not enough replicas alive.
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// Write timeout error.
    #[error("Write timeout: {0}")]
    WriteTimeout(String),

    /// Read timeout error.
    #[error("Read timeout: {0}")]
    ReadTimeout(String),

    /// Overloaded error.
    #[error("Server overloaded: {0}")]
    Overloaded(String),

    /// Syntax error in CQL.
    #[error("CQL syntax error: {0}")]
    Syntax(String),

    /// Invalid query, e.g. an undefined column.
    #[error("Invalid query: {0}")]
    Invalid(String),
}

impl ScyllaError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Create a type conversion error.
    pub fn type_conversion(msg: impl Into<String>) -> Self {
        Self::TypeConversion(msg.into())
    }

    /// Check if error is retryable.
    ///
    /// An aborted batch is retryable as a whole.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Batch(err) => err.is_transient(),
            other => matches!(
                other,
                Self::Connection(_)
                    | Self::Timeout(_)
                    | Self::Unavailable(_)
                    | Self::WriteTimeout(_)
                    | Self::ReadTimeout(_)
                    | Self::Overloaded(_)
            ),
        }
    }

    /// Check if error is a timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_) | Self::WriteTimeout(_) | Self::ReadTimeout(_)
        )
    }

    /// Check if error is authentication related.
    #[must_use]
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::Authentication(_) | Self::Authorization(_))
    }

    /// The failing statement's index when a batch was aborted.
    #[must_use]
    pub fn failed_index(&self) -> Option<usize> {
        match self {
            Self::Batch(err) => err.failed_index(),
            _ => None,
        }
    }

    /// Statement-level view of this error.
    #[must_use]
    pub fn to_failure(&self) -> StatementFailure {
        if let Self::Batch(BatchError::Transient { failure, .. }) = self {
            return failure.clone();
        }
        if self.is_retryable() {
            StatementFailure::transient(self.to_string())
        } else {
            StatementFailure::permanent(self.to_string())
        }
    }
}

impl From<ScyllaError> for StatementFailure {
    fn from(err: ScyllaError) -> Self {
        err.to_failure()
    }
}

impl From<ConversionError> for ScyllaError {
    fn from(err: ConversionError) -> Self {
        Self::TypeConversion(err.to_string())
    }
}

impl From<scylla::transport::errors::NewSessionError> for ScyllaError {
    fn from(err: scylla::transport::errors::NewSessionError) -> Self {
        Self::Connection(err.to_string())
    }
}

impl From<scylla::transport::errors::QueryError> for ScyllaError {
    fn from(err: scylla::transport::errors::QueryError) -> Self {
        use scylla::transport::errors::{DbError, QueryError};

        match &err {
            QueryError::TimeoutError | QueryError::RequestTimeout(_) => {
                Self::Timeout(err.to_string())
            }
            QueryError::IoError(_) => Self::Connection(err.to_string()),
            QueryError::DbError(db_err, msg) => match db_err {
                DbError::Unavailable { .. } => Self::Unavailable(msg.clone()),
                DbError::WriteTimeout { .. } => Self::WriteTimeout(msg.clone()),
                DbError::ReadTimeout { .. } => Self::ReadTimeout(msg.clone()),
                DbError::Overloaded => Self::Overloaded(msg.clone()),
                DbError::SyntaxError => Self::Syntax(msg.clone()),
                DbError::Invalid => Self::Invalid(msg.clone()),
                DbError::Unauthorized => Self::Authorization(msg.clone()),
                DbError::AuthenticationError => Self::Authentication(msg.clone()),
                _ => Self::Query(format!("{db_err}: {msg}")),
            },
            _ => Self::Query(err.to_string()),
        }
    }
}
