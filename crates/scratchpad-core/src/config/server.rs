//! HTTP server configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the note API server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on. The `PORT` environment variable takes precedence.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Root of the note folder tree.
    #[serde(default = "default_data_root")]
    pub data_root: PathBuf,

    /// Directory with the static frontend assets.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            data_root: default_data_root(),
            static_dir: default_static_dir(),
        }
    }
}

impl ServerConfig {
    /// Socket address string, e.g. "0.0.0.0:8080".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_data_root() -> PathBuf {
    PathBuf::from("/scratchpad-data")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("./frontend")
}
