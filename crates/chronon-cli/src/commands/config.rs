//! Configuration commands.

use anyhow::Result;
use chronon_config::ChrononConfig;

pub fn show_toml(config: &ChrononConfig) -> Result<()> {
    print!("{}", config.to_toml_string()?);
    Ok(())
}

pub fn show_json(config: &ChrononConfig) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
