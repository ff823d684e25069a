//! # cqlshim-scylla
//!
//! Cassandra and ScyllaDB backend for cqlshim, built on the `scylla` async
//! driver.
//!
//! - [`ScyllaPool`] shares one driver session, caches prepared statements and
//!   implements [`cqlshim_query::StatementSession`]
//! - [`CassandraStatement`] queues literal statements and runs
//!   multi-statement text as a windowed batch
//! - [`PreparedBatch`] binds one template many times, leaving unbound
//!   markers unset
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cqlshim_scylla::ScyllaPool;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = ScyllaPool::from_url("jdbc:cassandra://127.0.0.1:9042/testks1").await?;
//!
//!     let mut statement = pool.create_statement();
//!     for i in 0..1200 {
//!         statement.add_batch(format!("INSERT INTO testcollection (k,L) VALUES( {i},[1, 3, 12345])"));
//!     }
//!     let result = statement.execute_batch().await?;
//!     assert_eq!(result.len(), 1200);
//!
//!     let rows = statement
//!         .execute_query("SELECT * FROM testcollection WHERE k = 0; SELECT * FROM testcollection WHERE k = 1;")
//!         .await?;
//!     assert_eq!(rows.len(), 2);
//!     Ok(())
//! }
//! ```
//!
//! ## Prepared Batches
//!
//! ```rust,no_run
//! # async fn run(pool: cqlshim_scylla::ScyllaPool) -> cqlshim_scylla::ScyllaResult<()> {
//! let mut insert = pool
//!     .prepare_batch("INSERT INTO testcollection (k,L,M) VALUES(?,?,?)")
//!     .await?;
//! for i in 0..10 {
//!     insert.set(1, i)?;
//!     insert.set(2, vec![1, 3, 12345])?;
//!     insert.add_batch();
//! }
//! insert.execute_batch().await?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
mod connection;
mod error;
mod pool;
mod row;
mod session;
mod statement;
pub mod types;

pub use config::{ScyllaConfig, ScyllaConfigBuilder, ShimConfig};
pub use connection::{ScyllaConnection, connect};
pub use error::{ScyllaError, ScyllaResult};
pub use pool::{PoolStats, ScyllaPool};
pub use row::{into_result_set, rows_affected};
pub use statement::{CassandraStatement, PreparedBatch};
pub use types::ToCqlValue;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::{ScyllaConfig, ScyllaConfigBuilder, ShimConfig};
    pub use crate::connection::ScyllaConnection;
    pub use crate::error::{ScyllaError, ScyllaResult};
    pub use crate::pool::ScyllaPool;
    pub use crate::statement::{CassandraStatement, PreparedBatch};
    pub use cqlshim_query::prelude::*;
}
