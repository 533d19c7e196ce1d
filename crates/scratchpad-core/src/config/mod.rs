//! Configuration types for the scratchpad service.
//!
//! Configuration is a single TOML file with two sections:
//!
//! - **[server]**: bind address, note data root and static frontend directory
//! - **[audit]**: evidence root, rotation activity log and retention horizons
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration.

pub mod audit;
pub mod server;

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub use audit::AuditConfig;
pub use server::ServerConfig;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "SCRATCHPAD_CONFIG";

/// Environment variable overriding the listen port.
pub const PORT_ENV: &str = "PORT";

/// Configuration file picked up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "scratchpad.toml";

/// Complete scratchpad configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScratchpadConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Audit evidence settings.
    #[serde(default)]
    pub audit: AuditConfig,
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ScratchpadConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML content.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load the effective configuration.
    ///
    /// Resolution order: explicit path, then `SCRATCHPAD_CONFIG`, then
    /// `scratchpad.toml` in the working directory, then built-in defaults.
    /// `PORT` overrides the configured listen port.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = env::var_os(CONFIG_ENV).map(PathBuf::from);
        let mut config = match resolve_config_path(explicit, env_path) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_port_override(env::var(PORT_ENV).ok().as_deref())?;
        Ok(config)
    }

    /// Apply a `PORT`-style override to the server port.
    pub fn apply_port_override(&mut self, port: Option<&str>) -> Result<(), ConfigError> {
        if let Some(raw) = port.map(str::trim).filter(|p| !p.is_empty()) {
            self.server.port = raw
                .parse()
                .map_err(|_| ConfigError::Config(format!("invalid {PORT_ENV} value: {raw}")))?;
        }
        Ok(())
    }

    /// Validate cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.audit.validate()
    }
}

/// Pick the configuration file to read, if any.
fn resolve_config_path(explicit: Option<&Path>, env_path: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = env_path {
        return Some(path);
    }
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    local.is_file().then_some(local)
}
