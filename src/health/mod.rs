//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Host::run_heartbeat_loop (one task per host)
//!     → probe.rs (HealthProbe::check against the node address)
//!     → flips the host's active bit, updates the host_health gauge
//! ```
//!
//! # Design Decisions
//! - The probe is a trait seam: production uses the HTTP probe, tests plug
//!   in deterministic fakes
//! - The probe client is dedicated and carries its own timeout, distinct
//!   from request timeouts
//! - Probe semantics beyond "success means live" are not prescribed here

pub mod probe;

pub use probe::{HealthProbe, HttpProbe, ProbeError};
