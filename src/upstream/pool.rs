//! Upstream registry built from configuration.
//!
//! # Responsibilities
//! - Own the proxy-user and cluster tables for the process lifetime
//! - Provide name lookups for the external auth layer
//! - Spawn exactly one heartbeat task per host

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::config::loader::ConfigError;
use crate::config::schema::ProxyConfig;
use crate::config::validation::validate_config;
use crate::health::probe::HealthProbe;
use crate::lifecycle::shutdown::Shutdown;
use crate::upstream::cluster::Cluster;
use crate::upstream::users::ProxyUser;

/// Owns every long-lived upstream entity; request scopes borrow from here.
#[derive(Debug)]
pub struct UpstreamManager {
    users: HashMap<String, Arc<ProxyUser>>,
    clusters: HashMap<String, Arc<Cluster>>,
}

impl UpstreamManager {
    pub fn from_config(config: &ProxyConfig) -> Result<Self, ConfigError> {
        validate_config(config).map_err(ConfigError::Validation)?;

        let users = config
            .users
            .iter()
            .map(|u| (u.name.clone(), Arc::new(ProxyUser::from_config(u))))
            .collect();

        let mut clusters = HashMap::new();
        for cfg in &config.clusters {
            let cluster =
                Cluster::from_config(cfg).map_err(|e| ConfigError::Validation(vec![e]))?;
            clusters.insert(cfg.name.clone(), Arc::new(cluster));
        }

        Ok(Self { users, clusters })
    }

    pub fn user(&self, name: &str) -> Option<Arc<ProxyUser>> {
        self.users.get(name).cloned()
    }

    pub fn cluster(&self, name: &str) -> Option<Arc<Cluster>> {
        self.clusters.get(name).cloned()
    }

    pub fn clusters(&self) -> impl Iterator<Item = &Arc<Cluster>> {
        self.clusters.values()
    }

    /// Spawn one heartbeat loop per host, wired to the shutdown signal.
    pub fn spawn_heartbeats<P: HealthProbe>(
        &self,
        probe: Arc<P>,
        shutdown: &Shutdown,
    ) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();
        for cluster in self.clusters.values() {
            for host in cluster.hosts() {
                handles.push(tokio::spawn(Arc::clone(host).run_heartbeat_loop(
                    cluster.heartbeat_interval(),
                    cluster.name().to_string(),
                    Arc::clone(&probe),
                    shutdown.subscribe(),
                )));
            }
        }
        handles
    }
}
