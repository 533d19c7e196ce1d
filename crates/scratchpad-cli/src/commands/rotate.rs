//! `scratchpad rotate` - Seal a closed day and enforce retention.

use anyhow::{Context, bail};
use chrono::NaiveDate;
use scratchpad_audit::{RotationEngine, RotationReport};
use scratchpad_core::ScratchpadConfig;

/// Rotate `date`, or yesterday (UTC) when none is given.
pub fn run(config: &ScratchpadConfig, date: Option<NaiveDate>) -> anyhow::Result<()> {
    let engine = RotationEngine::from_config(&config.audit);
    let report = rotate(&engine, date)?;

    println!("{report}");
    if !report.retention.failed.is_empty() {
        bail!(
            "{} expired file(s) could not be purged",
            report.retention.failed.len()
        );
    }
    Ok(())
}

fn rotate(engine: &RotationEngine, date: Option<NaiveDate>) -> anyhow::Result<RotationReport> {
    let report = match date {
        Some(date) => engine
            .rotate_date(date)
            .with_context(|| format!("rotation failed for {date}"))?,
        None => engine.rotate().context("rotation failed")?,
    };
    Ok(report)
}
