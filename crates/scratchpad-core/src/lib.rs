//! # scratchpad-core
//!
//! Configuration types shared by the scratchpad note service, its audit
//! evidence pipeline and the `scratchpad` binary.

// Configuration types shared across all scratchpad crates
pub mod config;

// Re-export commonly used config types for convenience
pub use config::{AuditConfig, ConfigError, ScratchpadConfig, ServerConfig};
