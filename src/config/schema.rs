//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy
//! core. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the proxy core.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Proxy-level users callers authenticate as.
    pub users: Vec<UserConfig>,

    /// Query-node clusters queries are dispatched to.
    pub clusters: Vec<ClusterConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// A proxy-level user.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserConfig {
    /// Unique user name.
    pub name: String,

    /// Password for the proxy-level authentication.
    #[serde(default)]
    pub password: String,

    /// Cluster this user's queries are routed to.
    pub to_cluster: Option<String>,

    /// Cluster user the queries are executed as.
    pub to_user: Option<String>,

    /// Reject plain-HTTP requests from this user.
    #[serde(default)]
    pub deny_http: bool,

    /// Reject HTTPS requests from this user.
    #[serde(default)]
    pub deny_https: bool,

    /// Source networks requests may come from ("ip" or "ip/prefix").
    /// Empty means any.
    #[serde(default)]
    pub allowed_networks: Vec<String>,

    /// Query execution deadline in seconds. 0 means no deadline.
    #[serde(default)]
    pub max_execution_time_secs: u64,

    /// Concurrent running queries ceiling. 0 means unlimited.
    #[serde(default)]
    pub max_concurrent_queries: u32,
}

/// A cluster of query nodes.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClusterConfig {
    /// Unique cluster name.
    pub name: String,

    /// Scheme used to reach the nodes ("http" or "https").
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Node addresses as host[:port].
    pub nodes: Vec<String>,

    /// Cluster-level users queries are executed as.
    #[serde(default)]
    pub users: Vec<ClusterUserConfig>,

    /// Liveness probe interval in seconds.
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_secs: u64,

    /// Credentials for remote query cancellation. When absent the
    /// cancellation feature is disabled for this cluster.
    pub kill_query_user: Option<KillQueryUserConfig>,
}

/// A cluster-level user.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClusterUserConfig {
    /// Unique (per cluster) user name.
    pub name: String,

    /// Password sent to the nodes via Basic auth.
    #[serde(default)]
    pub password: String,

    /// Query execution deadline in seconds. 0 means no deadline.
    #[serde(default)]
    pub max_execution_time_secs: u64,

    /// Concurrent running queries ceiling. 0 means unlimited.
    #[serde(default)]
    pub max_concurrent_queries: u32,
}

/// Credentials used for the KILL QUERY call.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KillQueryUserConfig {
    pub name: String,

    #[serde(default)]
    pub password: String,
}

fn default_scheme() -> String {
    "http".to_string()
}

fn default_heartbeat_interval() -> u64 {
    5
}

/// Logging and metrics settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Minimum level the logger emits (trace, debug, info, warn, error).
    /// `RUST_LOG` overrides this when set.
    pub log_level: String,

    /// Expose the Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Bind address for the scrape endpoint. Defaults to loopback; point
    /// it at an interface the collector can reach.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "127.0.0.1:9363".to_string(),
        }
    }
}
