//! `scratchpad serve` - Start the note API server.

use scratchpad_core::ScratchpadConfig;
use scratchpad_server::NoteServer;

/// Serve until interrupted.
pub async fn run(config: ScratchpadConfig) -> anyhow::Result<()> {
    NoteServer::new(config).run().await?;
    Ok(())
}
