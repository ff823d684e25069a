//! Session pool with a prepared statement cache.
//!
//! The driver already pools connections per node and reconnects on its own.
//! [`ScyllaPool`] shares one driver session, caches prepared statements by
//! CQL text, and hands out the batch-oriented facades.

use std::collections::HashMap;
use std::sync::Arc;

use cqlshim_query::{BatchExecutor, Params};
use parking_lot::RwLock;
use scylla::prepared_statement::PreparedStatement;
use scylla::{QueryResult, Session};
use tracing::trace;

use crate::config::ScyllaConfig;
use crate::connection::{ScyllaConnection, connect};
use crate::error::ScyllaResult;
use crate::statement::{CassandraStatement, PreparedBatch};
use crate::types::bind_values;

/// A cheaply cloneable handle to a cluster session.
#[derive(Clone)]
pub struct ScyllaPool {
    connection: Arc<ScyllaConnection>,
    prepared_cache: Arc<RwLock<HashMap<String, PreparedStatement>>>,
}

impl ScyllaPool {
    /// Connect to a cluster and create a pool.
    pub async fn connect(config: ScyllaConfig) -> ScyllaResult<Self> {
        let connection = connect(config).await?;

        Ok(Self {
            connection: Arc::new(connection),
            prepared_cache: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Connect using a URL.
    ///
    /// URL format: `jdbc:cassandra://host[:port][,host...]/keyspace[?options]`
    /// (`scylla://` and `cassandra://` are accepted too).
    pub async fn from_url(url: &str) -> ScyllaResult<Self> {
        let config = ScyllaConfig::from_url(url)?;
        Self::connect(config).await
    }

    /// Get the shared connection.
    #[must_use]
    pub fn get(&self) -> ScyllaConnection {
        (*self.connection).clone()
    }

    /// Get a reference to the underlying session.
    #[must_use]
    pub fn session(&self) -> &Session {
        self.connection.session()
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &ScyllaConfig {
        self.connection.config()
    }

    /// Batch executor over this pool, using the configured ceiling and policy.
    #[must_use]
    pub fn executor(&self) -> BatchExecutor<Self> {
        BatchExecutor::with_config(Arc::new(self.clone()), self.config().executor_config())
    }

    /// Create a statement facade.
    #[must_use]
    pub fn create_statement(&self) -> CassandraStatement {
        CassandraStatement::new(self.executor())
    }

    /// Prepare `template` and wrap it for batched binding.
    pub async fn prepare_batch(&self, template: &str) -> ScyllaResult<PreparedBatch> {
        self.prepare(template).await?;
        Ok(PreparedBatch::new(self.executor(), template))
    }

    /// Execute a CQL statement without bound values.
    pub async fn query(&self, cql: &str) -> ScyllaResult<QueryResult> {
        trace!(cql, "query");
        self.session().query_unpaged(cql, ()).await.map_err(Into::into)
    }

    /// Execute a prepared statement with caching.
    ///
    /// [`cqlshim_query::Value::Unset`] slots are sent unset.
    pub async fn execute(&self, template: &str, params: &Params) -> ScyllaResult<QueryResult> {
        let prepared = self.prepare(template).await?;
        let values = bind_values(params)?;
        trace!(cql = template, params = params.len(), "execute prepared");
        self.session()
            .execute_unpaged(&prepared, values)
            .await
            .map_err(Into::into)
    }

    /// Prepare a statement (cached).
    pub async fn prepare(&self, cql: &str) -> ScyllaResult<PreparedStatement> {
        if let Some(stmt) = self.prepared_cache.read().get(cql) {
            return Ok(stmt.clone());
        }

        let stmt = self.session().prepare(cql).await?;
        self.prepared_cache
            .write()
            .insert(cql.to_string(), stmt.clone());

        Ok(stmt)
    }

    /// Clear the prepared statement cache.
    pub fn clear_cache(&self) {
        self.prepared_cache.write().clear();
    }

    /// Check if the pool is healthy.
    pub async fn is_healthy(&self) -> bool {
        self.connection.is_healthy().await
    }

    /// Switch keyspace. Cached statements were prepared against the old one
    /// and are dropped.
    pub async fn use_keyspace(&self, keyspace: &str) -> ScyllaResult<()> {
        self.connection.use_keyspace(keyspace).await?;
        self.clear_cache();
        Ok(())
    }

    /// Get pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            cached_statements: self.prepared_cache.read().len(),
            known_nodes: self.config().known_nodes().len(),
        }
    }
}

impl std::fmt::Debug for ScyllaPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScyllaPool")
            .field("keyspace", &self.config().default_keyspace())
            .field("nodes", &self.config().known_nodes())
            .field("cached_statements", &self.prepared_cache.read().len())
            .finish()
    }
}

/// Statistics about the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of cached prepared statements.
    pub cached_statements: usize,
    /// Number of known nodes in the cluster.
    pub known_nodes: usize,
}
