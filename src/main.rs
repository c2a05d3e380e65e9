//! hemosynth CLI entry point

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use hemosynth::config::cli::{Cli, RunMode};
use hemosynth::config::toml::{merge_cli_with_config, parse_toml_file};
use hemosynth::config::Config;
use hemosynth::donor::DonorSynthesizer;
use hemosynth::registry::csv::{CsvLedger, CsvRegistry};
use hemosynth::registry::DonorRegistry;
use hemosynth::simulate::driver::{seed_donors, RunDriver, RunSummary};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

fn main() -> Result<()> {
    println!("hemosynth v{}", env!("CARGO_PKG_VERSION"));
    println!("Synthetic blood-donor dataset generator");
    println!();

    let cli = Cli::parse_args();
    cli.validate()?;
    init_tracing();

    let config = build_config(&cli)?;
    config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("Configuration validation failed")?;

    println!("{}", config);

    if config.runtime.dry_run {
        println!("Dry run mode - configuration validated successfully");
        return Ok(());
    }

    let today = Local::now().date_naive();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(config.runtime.seed);

    println!("Starting {} run...", mode_name(cli.mode));
    println!();

    match cli.mode {
        RunMode::Seed => run_seed(&config, &mut rng, today),
        RunMode::Backfill => run_backfill(&config, &mut rng, today),
        RunMode::Daily => run_daily(&config, &mut rng, today),
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

/// Load the TOML file if given, then layer CLI overrides on top
fn build_config(cli: &Cli) -> Result<Config> {
    let base = match &cli.config {
        Some(path) => parse_toml_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };
    Ok(merge_cli_with_config(cli, base))
}

fn mode_name(mode: RunMode) -> &'static str {
    match mode {
        RunMode::Seed => "seed",
        RunMode::Backfill => "backfill",
        RunMode::Daily => "daily",
    }
}

/// Create a fresh donor population in the registry
fn run_seed(config: &Config, rng: &mut Xoshiro256PlusPlus, today: NaiveDate) -> Result<()> {
    let tables = config.tables()?;
    let synthesizer = DonorSynthesizer::new(tables, config.rules.clone());
    let mut registry = new_registry(config);

    let created = seed_donors(rng, &synthesizer, &mut registry, config.runtime.donors, today)?;

    print_banner("SEED RESULTS");
    println!("  Donors created:     {}", created);
    println!("  Registry:           {}", config.output.donors_path().display());
    println!("  Total registered:   {}", registry.donor_count()?);
    print_rule();
    Ok(())
}

/// Replay a span of historical days ending today
fn run_backfill(config: &Config, rng: &mut Xoshiro256PlusPlus, today: NaiveDate) -> Result<()> {
    let mut registry = new_registry(config);
    let mut ledger = CsvLedger::new(config.output.donations_path());
    let driver = new_driver(config);

    let summary = driver.backfill(
        rng,
        &mut registry,
        &mut ledger,
        today,
        config.runtime.days,
    )?;

    print_summary("BACKFILL RESULTS", &summary);
    println!("  Ledger:             {}", config.output.donations_path().display());
    print_rule();
    Ok(())
}

/// Simulate today only, writing to an isolated per-date ledger file
fn run_daily(config: &Config, rng: &mut Xoshiro256PlusPlus, today: NaiveDate) -> Result<()> {
    let mut registry = new_registry(config);
    let activity_path = config.output.daily_activity_path(today);
    let mut ledger = CsvLedger::new(&activity_path);
    let driver = new_driver(config);

    let summary = driver.single_day(rng, &mut registry, &mut ledger, today)?;

    print_summary("DAILY RESULTS", &summary);
    println!("  Activity file:      {}", activity_path.display());
    print_rule();
    Ok(())
}

fn new_registry(config: &Config) -> CsvRegistry {
    CsvRegistry::new(config.output.donors_path(), config.rules.min_interval_days)
}

fn new_driver(config: &Config) -> RunDriver {
    RunDriver::new(config.drive.clone(), config.rules.clone())
}

fn print_banner(title: &str) {
    println!();
    println!("═══════════════════════════════════════════════════════════");
    println!("                    {}", title);
    println!("═══════════════════════════════════════════════════════════");
    println!();
}

fn print_rule() {
    println!();
    println!("═══════════════════════════════════════════════════════════");
}

fn print_summary(title: &str, summary: &RunSummary) {
    print_banner(title);
    println!("{}", summary);
}
