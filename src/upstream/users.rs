//! Proxy-level and cluster-level identities.
//!
//! Both record kinds are policy data plus a running-query counter. The
//! ACL, scheme-denial and redirect fields are consumed by the external
//! auth and dispatch layers; only the counters and ceilings are enforced
//! here, at admission time.

use std::time::Duration;

use crate::config::schema::{ClusterUserConfig, UserConfig};
use crate::upstream::counter::QueryCounter;

/// The identity a caller authenticates as at the proxy.
#[derive(Debug)]
pub struct ProxyUser {
    pub name: String,
    pub password: String,
    /// Cluster this user's queries are routed to.
    pub to_cluster: Option<String>,
    /// Cluster user the queries are executed as.
    pub to_user: Option<String>,
    pub deny_http: bool,
    pub deny_https: bool,
    /// Source networks requests may come from. Empty means any.
    pub allowed_networks: Vec<String>,
    /// Zero means no deadline.
    pub max_execution_time: Duration,
    /// Zero means unlimited.
    pub max_concurrent_queries: u32,
    counter: QueryCounter,
}

impl ProxyUser {
    pub fn from_config(cfg: &UserConfig) -> Self {
        Self {
            name: cfg.name.clone(),
            password: cfg.password.clone(),
            to_cluster: cfg.to_cluster.clone(),
            to_user: cfg.to_user.clone(),
            deny_http: cfg.deny_http,
            deny_https: cfg.deny_https,
            allowed_networks: cfg.allowed_networks.clone(),
            max_execution_time: Duration::from_secs(cfg.max_execution_time_secs),
            max_concurrent_queries: cfg.max_concurrent_queries,
            counter: QueryCounter::new(),
        }
    }

    pub fn inc(&self) -> u32 {
        self.counter.inc()
    }

    pub fn dec(&self) {
        self.counter.dec()
    }

    pub fn running_queries(&self) -> u32 {
        self.counter.read()
    }
}

/// The identity the proxy uses toward the backend, distinct from the
/// caller's proxy-level identity.
#[derive(Debug)]
pub struct ClusterUser {
    pub name: String,
    pub password: String,
    /// Zero means no deadline.
    pub max_execution_time: Duration,
    /// Zero means unlimited.
    pub max_concurrent_queries: u32,
    counter: QueryCounter,
}

impl ClusterUser {
    pub fn from_config(cfg: &ClusterUserConfig) -> Self {
        Self {
            name: cfg.name.clone(),
            password: cfg.password.clone(),
            max_execution_time: Duration::from_secs(cfg.max_execution_time_secs),
            max_concurrent_queries: cfg.max_concurrent_queries,
            counter: QueryCounter::new(),
        }
    }

    pub fn inc(&self) -> u32 {
        self.counter.inc()
    }

    pub fn dec(&self) {
        self.counter.dec()
    }

    pub fn running_queries(&self) -> u32 {
        self.counter.read()
    }
}
