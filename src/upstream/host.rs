//! A single backend query node.
//!
//! # Responsibilities
//! - Track in-flight queries and the transient penalty surcharge
//! - Maintain the active bit from the heartbeat loop
//! - Expose effective load for host selection

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use url::Url;

use crate::health::probe::HealthProbe;
use crate::observability::metrics::{record_host_health, record_host_penalty};
use crate::upstream::counter::QueryCounter;

/// Load surcharge added per failed interaction.
const PENALTY_SIZE: u32 = 5;
/// Ceiling keeping deferred decay tasks bounded.
const PENALTY_MAX_SIZE: u32 = 300;
/// How long one penalty increment stays in effect.
const PENALTY_DURATION: Duration = Duration::from_secs(10);

/// A backend query node.
#[derive(Debug)]
pub struct Host {
    /// Node address. Immutable after construction.
    addr: Url,
    /// Inactive hosts are skipped by selection until a heartbeat revives
    /// them. Hosts start inactive; the first heartbeat runs immediately.
    active: AtomicBool,
    /// Transient surcharge; a multiple of PENALTY_SIZE in [0, PENALTY_MAX_SIZE].
    penalty: AtomicU32,
    counter: QueryCounter,
}

impl Host {
    pub fn new(addr: Url) -> Self {
        Self {
            addr,
            active: AtomicBool::new(false),
            penalty: AtomicU32::new(0),
            counter: QueryCounter::new(),
        }
    }

    pub fn addr(&self) -> &Url {
        &self.addr
    }

    /// host[:port] portion of the address, used in labels and log lines.
    pub fn name(&self) -> String {
        match (self.addr.host_str(), self.addr.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            _ => self.addr.to_string(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub(crate) fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Release);
    }

    /// Count one dispatched query. Returns the post-increment count.
    pub fn inc(&self) -> u32 {
        self.counter.inc()
    }

    pub fn dec(&self) {
        self.counter.dec()
    }

    /// Effective load used by selection: in-flight queries plus penalty.
    pub fn running_queries(&self) -> u32 {
        self.counter
            .read()
            .wrapping_add(self.penalty.load(Ordering::Acquire))
    }

    /// Push the host towards the back of the selection order after a failed
    /// interaction. The surcharge is bounded and decays on its own.
    pub fn penalize(self: &Arc<Self>) {
        let penalty = self.penalty.load(Ordering::Acquire);
        if penalty >= PENALTY_MAX_SIZE {
            return;
        }
        tracing::debug!(host = %self.name(), "penalizing host");
        record_host_penalty(&self.name());
        self.penalty.fetch_add(PENALTY_SIZE, Ordering::AcqRel);

        let host = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(PENALTY_DURATION).await;
            host.penalty.fetch_sub(PENALTY_SIZE, Ordering::AcqRel);
        });
    }

    /// Drive this host's liveness bit until `done` fires.
    ///
    /// Probes once immediately, then on every `interval` tick. The done
    /// signal interrupts the wait between probes, not only the probe itself.
    pub async fn run_heartbeat_loop<P: HealthProbe>(
        self: Arc<Self>,
        interval: Duration,
        cluster: String,
        probe: Arc<P>,
        mut done: broadcast::Receiver<()>,
    ) {
        self.heartbeat(&cluster, probe.as_ref()).await;

        let start = tokio::time::Instant::now() + interval;
        let mut ticker = tokio::time::interval_at(start, interval);
        loop {
            tokio::select! {
                _ = done.recv() => {
                    tracing::debug!(host = %self.name(), "heartbeat loop stopped");
                    return;
                }
                _ = ticker.tick() => self.heartbeat(&cluster, probe.as_ref()).await,
            }
        }
    }

    async fn heartbeat<P: HealthProbe>(&self, cluster: &str, probe: &P) {
        match probe.check(&self.addr).await {
            Ok(()) => {
                self.set_active(true);
                record_host_health(cluster, &self.name(), true);
            }
            Err(err) => {
                tracing::error!(host = %self.name(), error = %err, "error while health-checking host");
                self.set_active(false);
                record_host_health(cluster, &self.name(), false);
            }
        }
    }
}
