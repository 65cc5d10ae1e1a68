//! A cluster of query nodes and its host-selection policy.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::config::schema::ClusterConfig;
use crate::config::validation::ValidationError;
use crate::upstream::host::Host;
use crate::upstream::users::ClusterUser;

/// Credentials the proxy uses to cancel queries on a backend.
#[derive(Debug, Clone)]
pub struct KillQueryUser {
    pub name: String,
    pub password: String,
}

/// An ordered, immutable collection of hosts plus the rotating cursor
/// selection starts from.
#[derive(Debug)]
pub struct Cluster {
    name: String,
    hosts: Vec<Arc<Host>>,
    /// Wrapping rotating cursor; selection starts at nextIdx mod host count.
    next_idx: AtomicU32,
    users: HashMap<String, Arc<ClusterUser>>,
    heartbeat_interval: Duration,
    kill_query_user: Option<KillQueryUser>,
}

impl Cluster {
    pub fn from_config(cfg: &ClusterConfig) -> Result<Self, ValidationError> {
        if cfg.nodes.is_empty() {
            return Err(ValidationError(format!(
                "cluster '{}' must have at least one node",
                cfg.name
            )));
        }
        let mut hosts = Vec::with_capacity(cfg.nodes.len());
        for node in &cfg.nodes {
            let addr = Url::parse(&format!("{}://{}", cfg.scheme, node)).map_err(|e| {
                ValidationError(format!(
                    "cluster '{}' has invalid node address '{}': {}",
                    cfg.name, node, e
                ))
            })?;
            hosts.push(Arc::new(Host::new(addr)));
        }
        let users = cfg
            .users
            .iter()
            .map(|cu| (cu.name.clone(), Arc::new(ClusterUser::from_config(cu))))
            .collect();
        Ok(Self {
            name: cfg.name.clone(),
            hosts,
            next_idx: AtomicU32::new(0),
            users,
            heartbeat_interval: Duration::from_secs(cfg.heartbeat_interval_secs),
            kill_query_user: cfg.kill_query_user.as_ref().map(|k| KillQueryUser {
                name: k.name.clone(),
                password: k.password.clone(),
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hosts(&self) -> &[Arc<Host>] {
        &self.hosts
    }

    pub fn user(&self, name: &str) -> Option<Arc<ClusterUser>> {
        self.users.get(name).cloned()
    }

    pub fn heartbeat_interval(&self) -> Duration {
        self.heartbeat_interval
    }

    pub fn kill_query_user(&self) -> Option<&KillQueryUser> {
        self.kill_query_user.as_ref()
    }

    /// Pick the least-loaded active host, starting from a rotating cursor.
    ///
    /// The cursor target wins outright when it is active and idle. Otherwise
    /// the remaining hosts are scanned in circular order: inactive hosts are
    /// skipped, an idle host wins immediately, and a strictly smaller load
    /// displaces the candidate. Ties keep the earlier-scanned host, so a
    /// penalized host loses ties but can still be picked when everything
    /// else is worse or down.
    ///
    /// Returns `None` only when every host is inactive.
    pub fn get_host(&self) -> Option<Arc<Host>> {
        let len = self.hosts.len() as u32;
        let idx = self.next_idx.fetch_add(1, Ordering::AcqRel).wrapping_add(1) % len;

        let mut candidate = &self.hosts[idx as usize];
        let mut candidate_load = candidate.running_queries();
        if candidate_load == 0 && candidate.is_active() {
            return Some(Arc::clone(candidate));
        }

        let mut i = (idx + 1) % len;
        while i != idx {
            let host = &self.hosts[i as usize];
            if host.is_active() {
                let load = host.running_queries();
                if load == 0 {
                    return Some(Arc::clone(host));
                }
                if load < candidate_load {
                    candidate = host;
                    candidate_load = load;
                }
            }
            i = (i + 1) % len;
        }

        if !candidate.is_active() {
            return None;
        }
        Some(Arc::clone(candidate))
    }
}
