//! Note API server.

use scratchpad_core::ScratchpadConfig;
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::error::ServerError;
use crate::routes;
use crate::state::AppState;

/// The note API server.
pub struct NoteServer {
    config: ScratchpadConfig,
    state: AppState,
}

impl NoteServer {
    /// Create a new server with the given configuration.
    pub fn new(config: ScratchpadConfig) -> Self {
        let state = AppState::from_config(&config);
        Self { config, state }
    }

    /// Start serving until Ctrl-C.
    pub async fn run(self) -> Result<(), ServerError> {
        let address = self.config.server.bind_address();

        let writer = self.state.audit();
        if !writer.is_enabled() {
            tracing::warn!("request evidence capture is disabled");
        } else if !writer.root().is_dir() {
            tracing::error!(
                evidence_dir = %writer.root().display(),
                "audit path missing or invalid; requests will be served without evidence"
            );
        }

        let app = routes::create_router(self.state);
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| ServerError::Bind {
                address: address.clone(),
                source,
            })?;

        tracing::info!(
            address = %address,
            data_root = %self.config.server.data_root.display(),
            evidence_dir = %self.config.audit.evidence_dir.display(),
            "scratchpad listening"
        );

        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("scratchpad stopped");
        Ok(())
    }

    /// Get the configured listen port.
    pub fn listen_port(&self) -> u16 {
        self.config.server.port
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_creation() {
        let server = NoteServer::new(ScratchpadConfig::default());
        assert_eq!(server.listen_port(), 8080);
    }
}
