//! `scratchpad verify` - Check a sealed artifact against its digest.

use anyhow::Context;
use chrono::NaiveDate;
use scratchpad_audit::RotationEngine;
use scratchpad_core::ScratchpadConfig;

/// Recompute the artifact digest for `date` and compare it with the stored one.
pub fn run(config: &ScratchpadConfig, date: NaiveDate) -> anyhow::Result<()> {
    let engine = RotationEngine::from_config(&config.audit);
    let digest = engine
        .verify(date)
        .with_context(|| format!("verification failed for {date}"))?;

    println!(
        "OK {} sha512={digest}",
        engine.layout().artifact_path(date).display()
    );
    Ok(())
}
