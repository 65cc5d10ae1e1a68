//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! TOML file
//!     → loader.rs (read, parse)
//!     → validation.rs (semantic checks, all failures collected)
//!     → schema.rs types handed to UpstreamManager::from_config
//! ```
//!
//! # Design Decisions
//! - Everything here is immutable once loaded; hot reload is the caller's
//!   problem, not this crate's
//! - Validation collects every failure instead of stopping at the first
//! - Durations are configured in whole seconds

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::ProxyConfig;
pub use validation::{validate_config, ValidationError};
