//! Per-request scope: admission, request rewriting and remote cancellation.
//!
//! # Data Flow
//! ```text
//! Auth layer resolves (ProxyUser, ClusterUser, Cluster)
//!     → scope.rs (Scope::new selects a host, Scope::admit counts the query)
//!     → rewrite.rs (Scope::decorate: credentials, identity tag, target URL)
//!     → request forwarded by the caller
//!     → cancel.rs (Scope::cancel on execution deadline)
//!     → scope.rs (Scope::release, exactly once per successful admit)
//! ```
//!
//! # Design Decisions
//! - Counters are incremented before the ceiling checks; rejected
//!   admissions roll back. Racing admitters may both be rejected at the
//!   last slot, which is accepted
//! - A scope borrows every entity it binds; it owns nothing but its id
//! - Cancellation is advisory and never touches the counters

pub mod cancel;
pub mod rewrite;
pub mod scope;

pub use cancel::CancelError;
pub use rewrite::{ConnInfo, RewriteError};
pub use scope::{Scope, ScopeError};
