//! netwatch-core: shared types, configuration and curation data.
//!
//! Everything the monitoring pipelines agree on lives here: the record
//! types that make up a snapshot, the error taxonomy, the JSON
//! configuration document (with environment overrides) and the curated
//! default lists of monitored ASNs and resolvers.

pub mod config;
pub mod error;
pub mod types;

// Re-exports for convenience.
pub use config::{Config, DnsServerEntry};
pub use error::CoreError;

/// Result type for netwatch-core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
