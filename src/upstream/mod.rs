//! Upstream data model: clusters of query nodes and the identities that
//! queries run under.
//!
//! # Data Flow
//! ```text
//! ProxyConfig
//!     → pool.rs (UpstreamManager: build users + clusters, spawn heartbeats)
//!     → cluster.rs (rotating-start least-loaded host selection)
//!     → host.rs (active bit, penalty, per-host query counter)
//!     → counter.rs (atomic in-flight accounting shared by every entity)
//! ```
//!
//! # Design Decisions
//! - All shared mutable state is 32-bit atomics; no locks anywhere on the
//!   request path
//! - Configuration-derived fields are immutable after construction and
//!   shared via Arc
//! - Hosts hold no back-pointer to their cluster; the cluster name is
//!   passed explicitly to the heartbeat loop

pub mod cluster;
pub mod counter;
pub mod host;
pub mod pool;
pub mod users;

pub use cluster::{Cluster, KillQueryUser};
pub use counter::QueryCounter;
pub use host::Host;
pub use pool::UpstreamManager;
pub use users::{ClusterUser, ProxyUser};
