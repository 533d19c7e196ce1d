//! `scratchpad config` - Print the effective configuration.

use scratchpad_core::ScratchpadConfig;

pub fn run(config: &ScratchpadConfig) -> anyhow::Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}
