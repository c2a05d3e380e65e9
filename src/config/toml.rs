//! TOML configuration file parsing

use super::{cli::Cli, Config};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<Config> {
    let config: Config =
        ::toml::from_str(contents).context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Merge CLI arguments with TOML configuration (CLI takes precedence)
///
/// A flag that still carries its clap default is considered unset and leaves
/// the file value alone.
pub fn merge_cli_with_config(cli: &Cli, mut config: Config) -> Config {
    if cli.drive_chance != 60.0 {
        config.drive.chance_percent = cli.drive_chance;
    }
    if cli.min_units != 10 {
        config.drive.min_units = cli.min_units;
    }
    if cli.max_units != 50 {
        config.drive.max_units = cli.max_units;
    }
    if cli.seed != 42 {
        config.runtime.seed = cli.seed;
    }
    if cli.days != 365 {
        config.runtime.days = cli.days;
    }
    if cli.donors != 1000 {
        config.runtime.donors = cli.donors;
    }
    if cli.data_dir != Path::new("data") {
        config.output.data_dir = cli.data_dir.clone();
    }
    if cli.dry_run {
        config.runtime.dry_run = true;
    }
    config
}
