//! The per-request binding of identity, cluster and selected host.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, LazyLock};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

use crate::upstream::cluster::Cluster;
use crate::upstream::host::Host;
use crate::upstream::users::{ClusterUser, ProxyUser};

/// Process-global scope id source, seeded from wall-clock nanoseconds so
/// ids from a restarted process do not collide with in-flight ones within
/// the cancellation window. Wrap-around is tolerated.
static SCOPE_ID: LazyLock<AtomicU32> = LazyLock::new(|| {
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u32)
        .unwrap_or_default();
    AtomicU32::new(seed)
});

fn next_scope_id() -> u32 {
    SCOPE_ID.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
}

#[derive(Debug, Error)]
pub enum ScopeError {
    /// Every host in the cluster failed its last heartbeat.
    #[error("no active hosts")]
    NoActiveHosts,

    #[error("limits for user \"{user}\" are exceeded: max_concurrent_queries limit: {max}")]
    UserLimitExceeded { user: String, max: u32 },

    #[error("limits for cluster user \"{user}\" are exceeded: max_concurrent_queries limit: {max}")]
    ClusterUserLimitExceeded { user: String, max: u32 },
}

/// Binds one request to its proxy user, cluster user, cluster and the host
/// it was dispatched to. The four references are immutable for the scope's
/// lifetime; `id` doubles as the backend-side query id for cancellation.
#[derive(Debug)]
pub struct Scope {
    id: u32,
    host: Arc<Host>,
    cluster: Arc<Cluster>,
    user: Arc<ProxyUser>,
    cluster_user: Arc<ClusterUser>,
}

impl Scope {
    /// Select a host and bind the request. Fails only when every host in
    /// the cluster is inactive.
    pub fn new(
        user: Arc<ProxyUser>,
        cluster_user: Arc<ClusterUser>,
        cluster: Arc<Cluster>,
    ) -> Result<Self, ScopeError> {
        let host = cluster.get_host().ok_or(ScopeError::NoActiveHosts)?;
        Ok(Self {
            id: next_scope_id(),
            host,
            cluster,
            user,
            cluster_user,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn host(&self) -> &Arc<Host> {
        &self.host
    }

    pub fn cluster(&self) -> &Cluster {
        &self.cluster
    }

    pub fn user(&self) -> &ProxyUser {
        &self.user
    }

    pub fn cluster_user(&self) -> &ClusterUser {
        &self.cluster_user
    }

    /// Count this request against the user, the cluster user and the host.
    ///
    /// Counters are incremented before the ceiling checks so that racing
    /// admitters observe each other's in-flight increments; a rejected
    /// admission rolls all three back before returning. When both ceilings
    /// are breached the cluster-user error wins.
    pub fn admit(&self) -> Result<(), ScopeError> {
        let uq = self.user.inc();
        let cq = self.cluster_user.inc();
        self.host.inc();

        let mut err = None;
        if self.user.max_concurrent_queries > 0 && uq > self.user.max_concurrent_queries {
            err = Some(ScopeError::UserLimitExceeded {
                user: self.user.name.clone(),
                max: self.user.max_concurrent_queries,
            });
        }
        if self.cluster_user.max_concurrent_queries > 0
            && cq > self.cluster_user.max_concurrent_queries
        {
            err = Some(ScopeError::ClusterUserLimitExceeded {
                user: self.cluster_user.name.clone(),
                max: self.cluster_user.max_concurrent_queries,
            });
        }
        if let Some(err) = err {
            self.release();
            return Err(err);
        }
        Ok(())
    }

    /// Undo `admit`. Call exactly once per successful admission, on every
    /// completion path including timeout and error.
    pub fn release(&self) {
        self.host.dec();
        self.user.dec();
        self.cluster_user.dec();
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[ Id: {}; User \"{}\"({}) proxying as \"{}\"({}) to \"{}\"({}) ]",
            self.id,
            self.user.name,
            self.user.running_queries(),
            self.cluster_user.name,
            self.cluster_user.running_queries(),
            self.host.name(),
            self.host.running_queries(),
        )
    }
}
