//! # cqlshim
//!
//! Bounded-concurrency batch execution for Cassandra and ScyllaDB.
//!
//! cqlshim runs many independent CQL statements against a cluster with a
//! ceiling on how many are in flight at once:
//! - statements are dispatched in windows of at most `max_async_queries`
//! - outcomes come back in submission order, whatever order they completed in
//! - a failing statement aborts the batch with a single retryable error
//! - multi-statement query text is split and its rows reassembled in order
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cqlshim::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ScyllaError> {
//!     let pool = ScyllaPool::from_url("jdbc:cassandra://127.0.0.1:9042/testks1").await?;
//!
//!     let mut insert = pool
//!         .prepare_batch("INSERT INTO testcollection (k,L) VALUES(?,?)")
//!         .await?;
//!     for k in 0..MAX_ASYNC_QUERIES as i32 {
//!         insert.set(1, k)?;
//!         insert.set(2, vec![1, 3, 12345])?;
//!         insert.add_batch();
//!     }
//!
//!     match insert.execute_batch().await {
//!         Ok(result) => println!("{} statements applied", result.len()),
//!         Err(err) if err.is_retryable() => println!("retry the batch: {err}"),
//!         Err(err) => return Err(err),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Backends
//!
//! The executor only needs a [`query::StatementSession`]. The `scylla`
//! backend lives in [`scylla`]; tests and other stores can plug in their own.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Statement model, batch executor and column adapters.
pub mod query {
    pub use cqlshim_query::*;
}

/// Cassandra/ScyllaDB backend.
pub mod scylla {
    pub use cqlshim_scylla::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use cqlshim_scylla::prelude::*;
}

pub use cqlshim_query::{
    Batch, BatchError, BatchExecutor, BatchResult, ExecutorConfig, FailurePolicy,
    MAX_ASYNC_QUERIES, ResultSet, Statement, StatementOutcome, StatementSession,
};
pub use cqlshim_scylla::{CassandraStatement, PreparedBatch, ScyllaConfig, ScyllaError, ScyllaPool, ShimConfig};
