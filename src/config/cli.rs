//! CLI argument parsing using clap

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Run mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    /// Seed the donor registry with a synthesized population
    Seed,
    /// Backfill historical donation data over a date range
    Backfill,
    /// Simulate today only, writing events to an isolated daily file
    Daily,
}

/// hemosynth - Synthetic blood-donor dataset generator
#[derive(Parser, Debug)]
#[command(name = "hemosynth")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Run mode: seed, backfill, or daily
    #[arg(long, value_enum, default_value = "backfill")]
    pub mode: RunMode,

    // === Population Options ===
    /// Number of donors to create (seed mode)
    #[arg(short = 'n', long, default_value = "1000")]
    pub donors: usize,

    // === Simulation Options ===
    /// Days of history to backfill (backfill mode)
    #[arg(short = 'd', long, default_value = "365")]
    pub days: u32,

    /// Percent chance of a blood drive on any given day (0-100)
    #[arg(long, default_value = "60")]
    pub drive_chance: f64,

    /// Minimum unit target per drive
    #[arg(long, default_value = "10")]
    pub min_units: u32,

    /// Maximum unit target per drive
    #[arg(long, default_value = "50")]
    pub max_units: u32,

    /// Random seed for reproducible runs
    #[arg(long, default_value = "42")]
    pub seed: u64,

    // === Output Options ===
    /// Directory for registry and ledger files
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    // === Configuration File ===
    /// TOML configuration file
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Dry run - validate configuration without executing
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate CLI arguments
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=100.0).contains(&self.drive_chance) {
            anyhow::bail!("drive_chance must be between 0 and 100");
        }
        if self.min_units == 0 {
            anyhow::bail!("min_units must be at least 1");
        }
        if self.min_units > self.max_units {
            anyhow::bail!("min_units must not exceed max_units");
        }
        if self.mode == RunMode::Seed && self.donors == 0 {
            anyhow::bail!("seed mode requires at least 1 donor");
        }
        Ok(())
    }
}
