//! CLI command implementations for scratchpad.

pub mod config;
pub mod rotate;
pub mod serve;
pub mod verify;
