//! Request-scoping and host-selection core for an analytic-database
//! reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//! Listener (external)
//!     → resolves (ProxyUser, ClusterUser, Cluster) via auth lookup
//!     → Scope::new            (upstream: least-loaded host selection)
//!     → Scope::admit          (per-user / per-cluster-user ceilings)
//!     → Scope::decorate       (credentials, identity tag, target URL)
//!     → forwards request, streams response (external)
//!     → Scope::cancel         (on execution deadline)
//!     → Scope::release        (always, exactly once per admit)
//!
//! Heartbeat tasks (one per host) flip each host's active bit;
//! failed interactions penalize the host out of rotation for a while.
//! ```
//!
//! The HTTP listener, TLS termination, inbound auth resolution and the
//! client↔backend streaming pipe live outside this crate; they consume the
//! interfaces exposed here.

pub mod config;
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod upstream;

pub use config::schema::ProxyConfig;
pub use health::probe::{HealthProbe, HttpProbe};
pub use lifecycle::Shutdown;
pub use proxy::scope::Scope;
pub use upstream::pool::UpstreamManager;
