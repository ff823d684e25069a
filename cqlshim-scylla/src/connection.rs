//! Cluster connection management.

use std::num::NonZeroUsize;
use std::sync::Arc;

use scylla::execution_profile::ExecutionProfile;
use scylla::transport::session::PoolSize;
use scylla::{QueryResult, Session, SessionBuilder};
use tracing::{debug, info};

use crate::config::ScyllaConfig;
use crate::error::{ScyllaError, ScyllaResult};

/// A shared driver session plus the configuration it was built from.
#[derive(Clone)]
pub struct ScyllaConnection {
    session: Arc<Session>,
    config: Arc<ScyllaConfig>,
}

impl ScyllaConnection {
    pub(crate) fn new(session: Session, config: ScyllaConfig) -> Self {
        Self {
            session: Arc::new(session),
            config: Arc::new(config),
        }
    }

    /// Get a reference to the underlying session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &ScyllaConfig {
        &self.config
    }

    /// Check if the connection is healthy by executing a simple query.
    pub async fn is_healthy(&self) -> bool {
        self.session
            .query_unpaged("SELECT now() FROM system.local", ())
            .await
            .is_ok()
    }

    /// Switch the session to another keyspace.
    pub async fn use_keyspace(&self, keyspace: &str) -> ScyllaResult<()> {
        debug!(keyspace, "switching keyspace");
        self.session
            .use_keyspace(keyspace, true)
            .await
            .map_err(|e| ScyllaError::Keyspace(e.to_string()))
    }

    /// Execute a raw CQL statement without bound values.
    pub async fn execute_raw(&self, cql: &str) -> ScyllaResult<QueryResult> {
        self.session.query_unpaged(cql, ()).await.map_err(Into::into)
    }

    /// Drop a keyspace if it exists.
    ///
    /// Keyspace names are case-insensitive unless quoted; the name is
    /// validated and used unquoted.
    pub async fn drop_keyspace_if_exists(&self, keyspace: &str) -> ScyllaResult<()> {
        validate_identifier(keyspace)?;
        info!(keyspace, "dropping keyspace");
        self.execute_raw(&format!("DROP KEYSPACE IF EXISTS {keyspace}"))
            .await
            .map(|_| ())
    }
}

impl std::fmt::Debug for ScyllaConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScyllaConnection")
            .field("keyspace", &self.config.default_keyspace())
            .field("nodes", &self.config.known_nodes())
            .finish()
    }
}

fn validate_identifier(name: &str) -> ScyllaResult<()> {
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && name.len() <= 48;

    if valid {
        Ok(())
    } else {
        Err(ScyllaError::Keyspace(format!("invalid keyspace name: {name}")))
    }
}

fn compression(name: &str) -> Option<scylla::transport::Compression> {
    match name.to_lowercase().as_str() {
        "lz4" => Some(scylla::transport::Compression::Lz4),
        "snappy" => Some(scylla::transport::Compression::Snappy),
        _ => None,
    }
}

/// Connect to a cluster.
pub async fn connect(config: ScyllaConfig) -> ScyllaResult<ScyllaConnection> {
    let mut builder = SessionBuilder::new()
        .known_nodes(config.known_nodes())
        .connection_timeout(config.connection_timeout());

    if let Some(per_host) = NonZeroUsize::new(config.pool_size()) {
        builder = builder.pool_size(PoolSize::PerHost(per_host));
    }

    if let Some(keyspace) = config.default_keyspace() {
        builder = builder.use_keyspace(keyspace, true);
    }

    if let (Some(username), Some(password)) = (config.username(), config.password()) {
        builder = builder.user(username, password);
    }

    let mut profile = ExecutionProfile::builder()
        .consistency(config.consistency().into())
        .serial_consistency(config.serial_consistency().map(Into::into))
        .request_timeout(Some(config.request_timeout()));

    if let Some(dc) = config.local_datacenter() {
        profile = profile.load_balancing_policy(
            scylla::load_balancing::DefaultPolicy::builder()
                .prefer_datacenter(dc.to_string())
                .build(),
        );
    }

    builder = builder.default_execution_profile_handle(profile.build().into_handle());
    builder = builder.compression(config.compression().and_then(compression));

    if let Some(version) = config.cql_version() {
        debug!(version, "CQL version requested; protocol version is negotiated");
    }

    let session = builder.build().await?;
    info!(
        nodes = ?config.known_nodes(),
        keyspace = config.default_keyspace(),
        "connected to cluster"
    );

    Ok(ScyllaConnection::new(session, config))
}
