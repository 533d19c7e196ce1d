//! # scratchpad-server
//!
//! HTTP API for the scratchpad note editor.
//!
//! This crate provides:
//! - Folder and `.txt` note operations under a single data root
//! - Static frontend serving
//! - A request interceptor that records every completed request as audit
//!   evidence (see `scratchpad-audit`)
//!
//! ## Routes
//!
//! | Route | Method | Description |
//! |-------|--------|-------------|
//! | `/folders` | GET | List folders |
//! | `/folders` | POST | Create a folder |
//! | `/files?folder=` | GET | List notes in a folder |
//! | `/file?path=` | GET | Read a note |
//! | `/file/save` | POST | Write a note |
//! | `/file/move` | POST | Rename a note |
//! | `/file/delete` | POST | Delete a note |
//! | `/healthz` | GET | Service and capture health |

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod notes;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ApiError, ServerError};
pub use notes::NoteStore;
pub use routes::{audited, create_router};
pub use server::NoteServer;
pub use state::AppState;
