//! # cqlshim-query
//!
//! Backend-agnostic core of cqlshim: the statement model and the batch
//! executor that dispatches independent statements with a concurrency
//! ceiling.
//!
//! The executor never talks to a database itself. It is handed a
//! [`StatementSession`] and only decides *when* statements are dispatched
//! and *how* their outcomes are assembled:
//!
//! - statements are grouped into windows of at most `max_concurrency`
//! - a window is dispatched concurrently and awaited as a whole
//! - outcomes land at their submission index
//! - by default, a failing statement aborts the batch with one error
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cqlshim_query::{split_batch, BatchExecutor, MAX_ASYNC_QUERIES};
//!
//! let executor = BatchExecutor::new(Arc::new(session));
//! let batch = split_batch("INSERT INTO t (k) VALUES (1); INSERT INTO t (k) VALUES (2);");
//! let result = executor.execute(&batch, MAX_ASYNC_QUERIES).await?;
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapter;
pub mod error;
pub mod executor;
pub mod logging;
pub mod outcome;
pub mod result_set;
pub mod session;
pub mod split;
pub mod statement;
pub mod value;

pub use adapter::{ColumnAdapter, TimeUuidAdapter, Utf8Adapter, UuidAdapter};
pub use error::{BatchError, ConversionError, ExecResult, FailureKind, StatementFailure};
pub use executor::{BatchExecutor, ExecutorConfig, FailurePolicy, MAX_ASYNC_QUERIES, windows};
pub use outcome::{BatchResult, BatchStats, StatementOutcome};
pub use result_set::{ResultSet, Row};
pub use session::StatementSession;
pub use split::{count_placeholders, split_batch, split_statements};
pub use statement::{Batch, Params, Statement};
pub use value::Value;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{BatchError, FailureKind, StatementFailure};
    pub use crate::executor::{BatchExecutor, ExecutorConfig, FailurePolicy, MAX_ASYNC_QUERIES};
    pub use crate::outcome::{BatchResult, StatementOutcome};
    pub use crate::result_set::ResultSet;
    pub use crate::session::StatementSession;
    pub use crate::statement::{Batch, Params, Statement};
    pub use crate::value::Value;
}
