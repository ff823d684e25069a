//! Cluster and batch configuration.
//!
//! A [`ScyllaConfig`] can be built in code, parsed from a connection URL, or
//! loaded from a `cqlshim.toml` file through [`ShimConfig`].

use cqlshim_query::{ExecutorConfig, FailurePolicy, MAX_ASYNC_QUERIES};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{ScyllaError, ScyllaResult};

const DEFAULT_NODE: &str = "127.0.0.1:9042";
const DEFAULT_PORT: u16 = 9042;
const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 5;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 12;
const DEFAULT_POOL_SIZE: usize = 4;

/// Configuration for a cluster session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScyllaConfig {
    /// Known nodes in the cluster (host:port format).
    known_nodes: Vec<String>,

    /// Default keyspace to use.
    default_keyspace: Option<String>,

    /// Username for authentication.
    username: Option<String>,

    /// Password for authentication.
    password: Option<String>,

    /// Connection timeout in seconds.
    connection_timeout_secs: u64,

    /// Request timeout in seconds.
    request_timeout_secs: u64,

    /// Connections per node.
    pool_size: usize,

    /// Datacenter preferred by the load balancer.
    local_datacenter: Option<String>,

    /// Compression algorithm (lz4, snappy, or none).
    compression: Option<String>,

    /// Consistency level for statements.
    consistency: ConsistencyLevel,

    /// Serial consistency level for LWT.
    serial_consistency: Option<SerialConsistencyLevel>,

    /// CQL version requested by the caller (informational).
    cql_version: Option<String>,

    /// Ceiling on statements in flight for one batch.
    max_async_queries: usize,

    /// What a batch does when one of its statements fails.
    failure_policy: FailurePolicy,
}

/// CQL consistency levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsistencyLevel {
    /// Any node.
    Any,
    /// Single node.
    One,
    /// Two nodes.
    Two,
    /// Three nodes.
    Three,
    /// Quorum of nodes.
    #[default]
    Quorum,
    /// All nodes.
    All,
    /// Local quorum.
    LocalQuorum,
    /// Each quorum.
    EachQuorum,
    /// Local one.
    LocalOne,
}

impl ConsistencyLevel {
    fn parse(value: &str) -> Option<Self> {
        Some(match value.to_uppercase().as_str() {
            "ANY" => Self::Any,
            "ONE" => Self::One,
            "TWO" => Self::Two,
            "THREE" => Self::Three,
            "QUORUM" => Self::Quorum,
            "ALL" => Self::All,
            "LOCAL_QUORUM" => Self::LocalQuorum,
            "EACH_QUORUM" => Self::EachQuorum,
            "LOCAL_ONE" => Self::LocalOne,
            _ => return None,
        })
    }
}

impl From<ConsistencyLevel> for scylla::statement::Consistency {
    fn from(level: ConsistencyLevel) -> Self {
        use scylla::statement::Consistency;
        match level {
            ConsistencyLevel::Any => Consistency::Any,
            ConsistencyLevel::One => Consistency::One,
            ConsistencyLevel::Two => Consistency::Two,
            ConsistencyLevel::Three => Consistency::Three,
            ConsistencyLevel::Quorum => Consistency::Quorum,
            ConsistencyLevel::All => Consistency::All,
            ConsistencyLevel::LocalQuorum => Consistency::LocalQuorum,
            ConsistencyLevel::EachQuorum => Consistency::EachQuorum,
            ConsistencyLevel::LocalOne => Consistency::LocalOne,
        }
    }
}

/// Serial consistency levels for Lightweight Transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SerialConsistencyLevel {
    /// Serial consistency.
    #[default]
    Serial,
    /// Local serial consistency.
    LocalSerial,
}

impl From<SerialConsistencyLevel> for scylla::statement::SerialConsistency {
    fn from(level: SerialConsistencyLevel) -> Self {
        use scylla::statement::SerialConsistency;
        match level {
            SerialConsistencyLevel::Serial => SerialConsistency::Serial,
            SerialConsistencyLevel::LocalSerial => SerialConsistency::LocalSerial,
        }
    }
}

impl ScyllaConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> ScyllaConfigBuilder {
        ScyllaConfigBuilder::default()
    }

    /// Parse configuration from a URL.
    ///
    /// Accepted schemes: `scylla://`, `cassandra://` and `jdbc:cassandra://`.
    ///
    /// URL format: `scheme://[user:pass@]host1[:port1][,host2[:port2],...][/keyspace][?options]`
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cqlshim_scylla::ScyllaConfig;
    ///
    /// let config = ScyllaConfig::from_url("scylla://localhost:9042/my_keyspace").unwrap();
    /// assert_eq!(config.default_keyspace(), Some("my_keyspace"));
    ///
    /// let config =
    ///     ScyllaConfig::from_url("jdbc:cassandra://127.0.0.1:9042/testks1?version=3.0.0").unwrap();
    /// assert_eq!(config.cql_version(), Some("3.0.0"));
    /// ```
    pub fn from_url(url: &str) -> ScyllaResult<Self> {
        let url = url.trim();

        let rest = ["scylla://", "cassandra://", "jdbc:cassandra://"]
            .iter()
            .find_map(|scheme| url.strip_prefix(scheme))
            .ok_or_else(|| {
                ScyllaError::config(
                    "URL must start with scylla://, cassandra:// or jdbc:cassandra://",
                )
            })?;

        let mut builder = ScyllaConfigBuilder::default();

        let (rest, query) = match rest.split_once('?') {
            Some((rest, query)) => (rest, Some(query)),
            None => (rest, None),
        };

        let rest = match rest.rsplit_once('@') {
            Some((auth, rest)) => {
                if let Some((user, pass)) = auth.split_once(':') {
                    builder.username = Some(user.to_string());
                    builder.password = Some(pass.to_string());
                } else {
                    builder.username = Some(auth.to_string());
                }
                rest
            }
            None => rest,
        };

        let (hosts_part, keyspace) = match rest.split_once('/') {
            Some((hosts, path)) => {
                let path = path.trim_matches('/');
                (hosts, (!path.is_empty()).then(|| path.to_string()))
            }
            None => (rest, None),
        };

        let nodes: Vec<String> = hosts_part
            .split(',')
            .map(str::trim)
            .map(|s| {
                if s.is_empty() || s.contains(':') {
                    s.to_string()
                } else {
                    format!("{s}:{DEFAULT_PORT}")
                }
            })
            .collect();

        if nodes.iter().any(String::is_empty) {
            return Err(ScyllaError::config("At least one node must be specified"));
        }

        builder.known_nodes = nodes;
        builder.default_keyspace = keyspace;

        for (key, value) in query
            .into_iter()
            .flat_map(|q| q.split('&'))
            .filter_map(|param| param.split_once('='))
        {
            builder = builder.apply_option(key, value)?;
        }

        Ok(builder.build())
    }

    /// Get known nodes.
    #[must_use]
    pub fn known_nodes(&self) -> &[String] {
        &self.known_nodes
    }

    /// Get default keyspace.
    #[must_use]
    pub fn default_keyspace(&self) -> Option<&str> {
        self.default_keyspace.as_deref()
    }

    /// Get username.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Get password.
    #[must_use]
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Get connection timeout.
    #[must_use]
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    /// Get request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Get pool size.
    #[must_use]
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Get local datacenter.
    #[must_use]
    pub fn local_datacenter(&self) -> Option<&str> {
        self.local_datacenter.as_deref()
    }

    /// Get compression algorithm.
    #[must_use]
    pub fn compression(&self) -> Option<&str> {
        self.compression.as_deref()
    }

    /// Get consistency level.
    #[must_use]
    pub fn consistency(&self) -> ConsistencyLevel {
        self.consistency
    }

    /// Get serial consistency level.
    #[must_use]
    pub fn serial_consistency(&self) -> Option<SerialConsistencyLevel> {
        self.serial_consistency
    }

    /// Get the requested CQL version.
    #[must_use]
    pub fn cql_version(&self) -> Option<&str> {
        self.cql_version.as_deref()
    }

    /// Get the per-batch concurrency ceiling.
    #[must_use]
    pub fn max_async_queries(&self) -> usize {
        self.max_async_queries
    }

    /// Get the batch failure policy.
    #[must_use]
    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    /// Executor settings derived from this configuration.
    #[must_use]
    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig::default()
            .with_max_async_queries(self.max_async_queries)
            .with_failure_policy(self.failure_policy)
    }

    /// Copy of this configuration pointing at another keyspace.
    #[must_use]
    pub fn with_keyspace(mut self, keyspace: impl Into<String>) -> Self {
        self.default_keyspace = Some(keyspace.into());
        self
    }
}

impl Default for ScyllaConfig {
    fn default() -> Self {
        ScyllaConfigBuilder::default().build()
    }
}

/// Builder for `ScyllaConfig`.
#[derive(Debug, Default)]
pub struct ScyllaConfigBuilder {
    known_nodes: Vec<String>,
    default_keyspace: Option<String>,
    username: Option<String>,
    password: Option<String>,
    connection_timeout_secs: u64,
    request_timeout_secs: u64,
    pool_size: usize,
    local_datacenter: Option<String>,
    compression: Option<String>,
    consistency: ConsistencyLevel,
    serial_consistency: Option<SerialConsistencyLevel>,
    cql_version: Option<String>,
    max_async_queries: usize,
    failure_policy: FailurePolicy,
}

impl ScyllaConfigBuilder {
    /// Set known nodes.
    #[must_use]
    pub fn known_nodes<I, S>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_nodes = nodes.into_iter().map(Into::into).collect();
        self
    }

    /// Add a known node.
    #[must_use]
    pub fn add_node<S: Into<String>>(mut self, node: S) -> Self {
        self.known_nodes.push(node.into());
        self
    }

    /// Set default keyspace.
    #[must_use]
    pub fn default_keyspace<S: Into<String>>(mut self, keyspace: S) -> Self {
        self.default_keyspace = Some(keyspace.into());
        self
    }

    /// Set username for authentication.
    #[must_use]
    pub fn username<S: Into<String>>(mut self, username: S) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set password for authentication.
    #[must_use]
    pub fn password<S: Into<String>>(mut self, password: S) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set connection timeout in seconds.
    #[must_use]
    pub fn connection_timeout_secs(mut self, secs: u64) -> Self {
        self.connection_timeout_secs = secs;
        self
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// Set connections per node.
    #[must_use]
    pub fn pool_size(mut self, size: usize) -> Self {
        self.pool_size = size;
        self
    }

    /// Set local datacenter.
    #[must_use]
    pub fn local_datacenter<S: Into<String>>(mut self, dc: S) -> Self {
        self.local_datacenter = Some(dc.into());
        self
    }

    /// Set compression algorithm.
    #[must_use]
    pub fn compression<S: Into<String>>(mut self, compression: S) -> Self {
        self.compression = Some(compression.into());
        self
    }

    /// Set consistency level.
    #[must_use]
    pub fn consistency(mut self, consistency: ConsistencyLevel) -> Self {
        self.consistency = consistency;
        self
    }

    /// Set serial consistency level.
    #[must_use]
    pub fn serial_consistency(mut self, consistency: SerialConsistencyLevel) -> Self {
        self.serial_consistency = Some(consistency);
        self
    }

    /// Set the requested CQL version.
    #[must_use]
    pub fn cql_version<S: Into<String>>(mut self, version: S) -> Self {
        self.cql_version = Some(version.into());
        self
    }

    /// Set the per-batch concurrency ceiling.
    #[must_use]
    pub fn max_async_queries(mut self, max: usize) -> Self {
        self.max_async_queries = max;
        self
    }

    /// Set the batch failure policy.
    #[must_use]
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    fn apply_option(mut self, key: &str, value: &str) -> ScyllaResult<Self> {
        let number = |value: &str| {
            value
                .parse::<u64>()
                .map_err(|_| ScyllaError::config(format!("Invalid value for {key}: {value}")))
        };

        match key {
            "timeout" => self.request_timeout_secs = number(value)?,
            "connect_timeout" => self.connection_timeout_secs = number(value)?,
            "pool_size" => self.pool_size = number(value)? as usize,
            "max_async_queries" => self.max_async_queries = number(value)? as usize,
            "datacenter" | "dc" | "localdatacenter" => {
                self.local_datacenter = Some(value.to_string());
            }
            "compression" => self.compression = Some(value.to_string()),
            "consistency" => {
                self.consistency = ConsistencyLevel::parse(value).ok_or_else(|| {
                    ScyllaError::config(format!("Unknown consistency level: {value}"))
                })?;
            }
            "version" => self.cql_version = Some(value.to_string()),
            "user" | "username" => self.username = Some(value.to_string()),
            "password" => self.password = Some(value.to_string()),
            "failure_policy" => {
                self.failure_policy = match value {
                    "abort" => FailurePolicy::AbortBatch,
                    "collect" => FailurePolicy::CollectOutcomes,
                    other => {
                        return Err(ScyllaError::config(format!(
                            "Unknown failure policy: {other}"
                        )));
                    }
                };
            }
            _ => {}
        }
        Ok(self)
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> ScyllaConfig {
        fn or_default<T: PartialEq + Default>(value: T, default: T) -> T {
            if value == T::default() { default } else { value }
        }

        ScyllaConfig {
            known_nodes: if self.known_nodes.is_empty() {
                vec![DEFAULT_NODE.to_string()]
            } else {
                self.known_nodes
            },
            default_keyspace: self.default_keyspace,
            username: self.username,
            password: self.password,
            connection_timeout_secs: or_default(
                self.connection_timeout_secs,
                DEFAULT_CONNECTION_TIMEOUT_SECS,
            ),
            request_timeout_secs: or_default(
                self.request_timeout_secs,
                DEFAULT_REQUEST_TIMEOUT_SECS,
            ),
            pool_size: or_default(self.pool_size, DEFAULT_POOL_SIZE),
            local_datacenter: self.local_datacenter,
            compression: self.compression,
            consistency: self.consistency,
            serial_consistency: self.serial_consistency,
            cql_version: self.cql_version,
            max_async_queries: or_default(self.max_async_queries, MAX_ASYNC_QUERIES),
            failure_policy: self.failure_policy,
        }
    }
}

/// Contents of a `cqlshim.toml` file.
///
/// ```toml
/// [cluster]
/// url = "cassandra://${CASSANDRA_HOST}:9042/testks1"
/// consistency = "LOCAL_QUORUM"
///
/// [batch]
/// max_async_queries = 500
/// failure_policy = "abort"
///
/// [debug]
/// log_level = "debug"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ShimConfig {
    /// Cluster connection settings.
    #[serde(default)]
    pub cluster: ClusterSection,

    /// Batch execution settings.
    #[serde(default)]
    pub batch: BatchSection,

    /// Logging settings.
    #[serde(default)]
    pub debug: DebugSection,
}

/// `[cluster]` section.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClusterSection {
    /// Connection URL; explicit fields below override its parts.
    pub url: Option<String>,
    /// Known nodes.
    #[serde(default)]
    pub nodes: Vec<String>,
    /// Default keyspace.
    pub keyspace: Option<String>,
    /// Username.
    pub username: Option<String>,
    /// Password.
    pub password: Option<String>,
    /// Local datacenter.
    pub datacenter: Option<String>,
    /// Consistency level.
    pub consistency: Option<ConsistencyLevel>,
    /// Request timeout in seconds.
    pub request_timeout_secs: Option<u64>,
    /// Connection timeout in seconds.
    pub connection_timeout_secs: Option<u64>,
    /// Compression algorithm.
    pub compression: Option<String>,
}

/// `[batch]` section.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BatchSection {
    /// Ceiling on statements in flight for one batch.
    pub max_async_queries: Option<usize>,
    /// `"abort"` or `"collect"`.
    pub failure_policy: Option<FailurePolicy>,
}

/// `[debug]` section.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DebugSection {
    /// Log level passed to the logging bootstrap.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log format: json, pretty or compact.
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for DebugSection {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl ShimConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> ScyllaResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ScyllaError::config(format!("Cannot read {}: {e}", path.display()))
        })?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> ScyllaResult<Self> {
        let expanded = expand_env_vars(content);
        toml::from_str(&expanded).map_err(|e| ScyllaError::config(e.to_string()))
    }

    /// Resolve the cluster configuration.
    pub fn scylla_config(&self) -> ScyllaResult<ScyllaConfig> {
        let cluster = &self.cluster;
        let mut config = match &cluster.url {
            Some(url) => ScyllaConfig::from_url(url)?,
            None => ScyllaConfig::default(),
        };

        if !cluster.nodes.is_empty() {
            config.known_nodes.clone_from(&cluster.nodes);
        }
        if let Some(keyspace) = &cluster.keyspace {
            config.default_keyspace = Some(keyspace.clone());
        }
        if let Some(username) = &cluster.username {
            config.username = Some(username.clone());
        }
        if let Some(password) = &cluster.password {
            config.password = Some(password.clone());
        }
        if let Some(dc) = &cluster.datacenter {
            config.local_datacenter = Some(dc.clone());
        }
        if let Some(consistency) = cluster.consistency {
            config.consistency = consistency;
        }
        if let Some(secs) = cluster.request_timeout_secs {
            config.request_timeout_secs = secs.max(1);
        }
        if let Some(secs) = cluster.connection_timeout_secs {
            config.connection_timeout_secs = secs.max(1);
        }
        if let Some(compression) = &cluster.compression {
            config.compression = Some(compression.clone());
        }
        if let Some(max) = self.batch.max_async_queries {
            if max == 0 {
                return Err(ScyllaError::config("max_async_queries must be at least 1"));
            }
            config.max_async_queries = max;
        }
        if let Some(policy) = self.batch.failure_policy {
            config.failure_policy = policy;
        }

        Ok(config)
    }

    /// Install the logging subscriber described by `[debug]`.
    pub fn init_logging(&self) {
        cqlshim_query::logging::init_with(&self.debug.log_level, &self.debug.log_format);
    }
}

/// Replace `${NAME}` with the value of environment variable `NAME`.
/// Unset variables are left as written.
fn expand_env_vars(content: &str) -> String {
    let Ok(re) = regex_lite::Regex::new(r"\$\{([^}]+)\}") else {
        return content.to_string();
    };

    re.replace_all(content, |caps: &regex_lite::Captures<'_>| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    })
    .into_owned()
}
