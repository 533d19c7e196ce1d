use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use scratchpad_core::ScratchpadConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "scratchpad", version, about = "Scratchpad note server")]
struct Cli {
    /// Configuration file (defaults to $SCRATCHPAD_CONFIG, then ./scratchpad.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the note API and static frontend.
    Serve,

    /// Seal a closed day's evidence store, then enforce retention.
    ///
    /// Intended to run from an external scheduler shortly after midnight UTC.
    Rotate {
        /// Day to seal (YYYY-MM-DD). Defaults to yesterday (UTC).
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Check a sealed artifact against its digest.
    Verify {
        /// Day whose artifact to check (YYYY-MM-DD).
        #[arg(long)]
        date: NaiveDate,
    },

    /// Print the effective configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ScratchpadConfig::load(cli.config.as_deref())?;

    match cli.cmd {
        Command::Serve => commands::serve::run(config).await?,
        Command::Rotate { date } => commands::rotate::run(&config, date)?,
        Command::Verify { date } => commands::verify::run(&config, date)?,
        Command::Config => commands::config::run(&config)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rotate_with_date() {
        let cli = Cli::try_parse_from(["scratchpad", "rotate", "--date", "2025-10-16"]).unwrap();
        assert!(matches!(
            cli.cmd,
            Command::Rotate { date: Some(d) } if d == NaiveDate::from_ymd_opt(2025, 10, 16).unwrap()
        ));
    }

    #[test]
    fn test_parse_global_config() {
        let cli = Cli::try_parse_from(["scratchpad", "serve", "--config", "/etc/scratchpad.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/scratchpad.toml")));
        assert!(matches!(cli.cmd, Command::Serve));
    }

    #[test]
    fn test_verify_requires_date() {
        assert!(Cli::try_parse_from(["scratchpad", "verify"]).is_err());
        assert!(Cli::try_parse_from(["scratchpad", "verify", "--date", "16/10/2025"]).is_err());
    }
}
