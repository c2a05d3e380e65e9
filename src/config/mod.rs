//! Configuration module
//!
//! Handles CLI argument parsing, TOML configuration files, and validation.
//! Every constant of the generation model (minimum donor age, donation
//! interval, test-pass rate, ...) lives here rather than being hard-coded, so
//! a run can override any of them from a config file or the command line.

pub mod cli;
pub mod toml;

use crate::distribution::tables::DemographicTables;
use crate::distribution::{Band, TableError, WeightedTable};
use crate::donor::{BloodType, Ethnicity, Sex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Complete run configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Eligibility and event-synthesis constants
    #[serde(default)]
    pub rules: DonationRules,
    /// Blood-drive occurrence and sizing
    #[serde(default)]
    pub drive: DriveConfig,
    /// Demographic distribution overrides (built-in 2024 tables when absent)
    #[serde(default)]
    pub demographics: Option<DemographicsConfig>,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// Donation eligibility and event-synthesis constants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationRules {
    /// Minimum donor age in years
    #[serde(default = "default_min_donor_age")]
    pub min_donor_age_years: u32,
    /// Minimum days between two donations by the same donor
    #[serde(default = "default_min_interval")]
    pub min_interval_days: u32,
    /// Hard ceiling on lifetime donations per donor
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_donations: u32,
    /// Probability that a unit passes the blood-bank test
    #[serde(default = "default_test_pass_rate")]
    pub test_pass_rate: f64,
    /// Probability that a unit's status is "available" rather than "used"
    #[serde(default = "default_available_rate")]
    pub available_rate: f64,
    /// First hour of the daily collection window (inclusive)
    #[serde(default = "default_window_start")]
    pub window_start_hour: u32,
    /// Last hour of the daily collection window (inclusive)
    #[serde(default = "default_window_end")]
    pub window_end_hour: u32,
}

fn default_min_donor_age() -> u32 {
    17
}

fn default_min_interval() -> u32 {
    56
}

fn default_max_lifetime() -> u32 {
    102
}

fn default_test_pass_rate() -> f64 {
    0.998
}

fn default_available_rate() -> f64 {
    0.95
}

fn default_window_start() -> u32 {
    8
}

fn default_window_end() -> u32 {
    17
}

impl Default for DonationRules {
    fn default() -> Self {
        Self {
            min_donor_age_years: default_min_donor_age(),
            min_interval_days: default_min_interval(),
            max_lifetime_donations: default_max_lifetime(),
            test_pass_rate: default_test_pass_rate(),
            available_rate: default_available_rate(),
            window_start_hour: default_window_start(),
            window_end_hour: default_window_end(),
        }
    }
}

/// Blood-drive occurrence and sizing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveConfig {
    /// Percent chance (0-100) that a drive occurs on any given day
    #[serde(default = "default_drive_chance")]
    pub chance_percent: f64,
    /// Minimum unit target for a drive
    #[serde(default = "default_min_units")]
    pub min_units: u32,
    /// Maximum unit target for a drive
    #[serde(default = "default_max_units")]
    pub max_units: u32,
}

fn default_drive_chance() -> f64 {
    60.0
}

fn default_min_units() -> u32 {
    10
}

fn default_max_units() -> u32 {
    50
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            chance_percent: default_drive_chance(),
            min_units: default_min_units(),
            max_units: default_max_units(),
        }
    }
}

/// One weighted entry of a configured distribution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightedEntry<T> {
    pub category: T,
    pub weight: f64,
}

/// Demographic distribution overrides from the config file
///
/// Mirrors [`DemographicTables`] in a serde-friendly shape; `build_tables`
/// converts and validates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemographicsConfig {
    pub age: Vec<WeightedEntry<Band>>,
    pub sex: Vec<WeightedEntry<Sex>>,
    pub ethnicity: Vec<WeightedEntry<Ethnicity>>,
    pub blood_type: HashMap<Ethnicity, Vec<WeightedEntry<BloodType>>>,
}

impl DemographicsConfig {
    /// Convert the configured entries into validated sampling tables
    pub fn build_tables(&self) -> Result<DemographicTables, TableError> {
        let age = WeightedTable::new(
            self.age.iter().map(|e| (e.category, e.weight)).collect(),
        )?;
        let sex = WeightedTable::new(
            self.sex.iter().map(|e| (e.category, e.weight)).collect(),
        )?;
        let ethnicity = WeightedTable::new(
            self.ethnicity
                .iter()
                .map(|e| (e.category, e.weight))
                .collect(),
        )?;
        let mut blood_type = HashMap::new();
        for (&eth, entries) in &self.blood_type {
            let table = WeightedTable::new(
                entries.iter().map(|e| (e.category, e.weight)).collect(),
            )?;
            blood_type.insert(eth, table);
        }
        DemographicTables::new(age, sex, ethnicity, blood_type)
    }
}

/// Output destinations for the registry and ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory holding the data files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Donor registry file name
    #[serde(default = "default_donors_file")]
    pub donors_file: String,
    /// Donation ledger file name
    #[serde(default = "default_donations_file")]
    pub donations_file: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_donors_file() -> String {
    "donors.csv".to_string()
}

fn default_donations_file() -> String {
    "donations.csv".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            donors_file: default_donors_file(),
            donations_file: default_donations_file(),
        }
    }
}

impl OutputConfig {
    /// Path of the donor registry file
    pub fn donors_path(&self) -> PathBuf {
        self.data_dir.join(&self.donors_file)
    }

    /// Path of the donation ledger file
    pub fn donations_path(&self) -> PathBuf {
        self.data_dir.join(&self.donations_file)
    }

    /// Isolated ledger destination for a single-day run
    pub fn daily_activity_path(&self, date: chrono::NaiveDate) -> PathBuf {
        self.data_dir
            .join(format!("{}_activity.csv", date.format("%Y-%m-%d")))
    }
}

/// Runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Random seed for reproducible runs
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Days of history to backfill
    #[serde(default = "default_days")]
    pub days: u32,
    /// Number of donors to create in seed mode
    #[serde(default = "default_donors")]
    pub donors: usize,
    /// Validate configuration without executing
    #[serde(default)]
    pub dry_run: bool,
}

fn default_seed() -> u64 {
    42
}

fn default_days() -> u32 {
    365
}

fn default_donors() -> usize {
    1000
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            days: default_days(),
            donors: default_donors(),
            dry_run: false,
        }
    }
}

// Display trait implementations

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Configuration:")?;
        writeln!(f, "  Rules: {}", self.rules)?;
        writeln!(f, "  Drive: {}", self.drive)?;
        writeln!(
            f,
            "  Demographics: {}",
            if self.demographics.is_some() {
                "overridden from config file"
            } else {
                "built-in 2024 tables"
            }
        )?;
        writeln!(f, "  Output: {}", self.output)?;
        writeln!(f, "  Runtime: {}", self.runtime)?;
        Ok(())
    }
}

impl fmt::Display for DonationRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "min_age={}y, interval={}d, cap={}, pass_rate={}, available_rate={}, window={}-{}h",
            self.min_donor_age_years,
            self.min_interval_days,
            self.max_lifetime_donations,
            self.test_pass_rate,
            self.available_rate,
            self.window_start_hour,
            self.window_end_hour
        )
    }
}

impl fmt::Display for DriveConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}% chance, {}-{} units",
            self.chance_percent, self.min_units, self.max_units
        )
    }
}

impl fmt::Display for OutputConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "dir={}, donors={}, donations={}",
            self.data_dir.display(),
            self.donors_file,
            self.donations_file
        )
    }
}

impl fmt::Display for RuntimeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "seed={}, days={}, donors={}",
            self.seed, self.days, self.donors
        )?;
        if self.dry_run {
            write!(f, ", dry_run")?;
        }
        Ok(())
    }
}

// Validation methods

impl Config {
    /// Validate the complete configuration
    pub fn validate(&self) -> Result<(), String> {
        self.rules.validate()?;
        self.drive.validate()?;
        if let Some(ref demographics) = self.demographics {
            demographics
                .build_tables()
                .map_err(|e| format!("demographics: {}", e))?;
        }
        self.output.validate()?;
        Ok(())
    }

    /// The sampling tables for this run (overrides or built-in defaults)
    pub fn tables(&self) -> Result<DemographicTables, TableError> {
        match self.demographics {
            Some(ref demographics) => demographics.build_tables(),
            None => Ok(DemographicTables::defaults_2024()),
        }
    }
}

impl DonationRules {
    /// Validate the rule constants
    pub fn validate(&self) -> Result<(), String> {
        if self.min_donor_age_years == 0 {
            return Err("min_donor_age_years must be greater than 0".to_string());
        }
        if self.min_interval_days == 0 {
            return Err("min_interval_days must be greater than 0".to_string());
        }
        if self.max_lifetime_donations == 0 {
            return Err("max_lifetime_donations must be greater than 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.test_pass_rate) {
            return Err(format!(
                "test_pass_rate must be 0.0-1.0, got {}",
                self.test_pass_rate
            ));
        }
        if !(0.0..=1.0).contains(&self.available_rate) {
            return Err(format!(
                "available_rate must be 0.0-1.0, got {}",
                self.available_rate
            ));
        }
        if self.window_start_hour > self.window_end_hour {
            return Err(format!(
                "collection window start {} is after end {}",
                self.window_start_hour, self.window_end_hour
            ));
        }
        if self.window_end_hour > 23 {
            return Err(format!(
                "window_end_hour must be at most 23, got {}",
                self.window_end_hour
            ));
        }
        Ok(())
    }
}

impl DriveConfig {
    /// Validate the drive configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=100.0).contains(&self.chance_percent) {
            return Err(format!(
                "drive chance_percent must be 0-100, got {}",
                self.chance_percent
            ));
        }
        if self.min_units == 0 {
            return Err("min_units must be greater than 0".to_string());
        }
        if self.min_units > self.max_units {
            return Err(format!(
                "min_units ({}) must not exceed max_units ({})",
                self.min_units, self.max_units
            ));
        }
        Ok(())
    }
}

impl OutputConfig {
    /// Validate the output configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.donors_file.is_empty() {
            return Err("donors_file cannot be empty".to_string());
        }
        if self.donations_file.is_empty() {
            return Err("donations_file cannot be empty".to_string());
        }
        if self.data_dir == Path::new("") {
            return Err("data_dir cannot be empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.rules.min_donor_age_years, 17);
        assert_eq!(config.rules.min_interval_days, 56);
        assert_eq!(config.rules.max_lifetime_donations, 102);
        assert_eq!(config.runtime.seed, 42);
    }

    #[test]
    fn test_drive_validation() {
        let mut drive = DriveConfig::default();
        drive.chance_percent = 120.0;
        assert!(drive.validate().is_err());

        let mut drive = DriveConfig::default();
        drive.min_units = 60;
        drive.max_units = 10;
        assert!(drive.validate().is_err());

        let mut drive = DriveConfig::default();
        drive.min_units = 0;
        assert!(drive.validate().is_err());
    }

    #[test]
    fn test_rules_validation() {
        let mut rules = DonationRules::default();
        rules.test_pass_rate = 1.5;
        assert!(rules.validate().is_err());

        let mut rules = DonationRules::default();
        rules.min_interval_days = 0;
        assert!(rules.validate().is_err());

        let mut rules = DonationRules::default();
        rules.window_start_hour = 18;
        rules.window_end_hour = 8;
        assert!(rules.validate().is_err());
    }

    #[test]
    fn test_output_paths() {
        let output = OutputConfig::default();
        assert_eq!(output.donors_path(), PathBuf::from("data/donors.csv"));
        assert_eq!(
            output.daily_activity_path(
                chrono::NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
            ),
            PathBuf::from("data/2024-03-05_activity.csv")
        );
    }

    #[test]
    fn test_tables_default_to_builtin() {
        let config = Config::default();
        let tables = config.tables().unwrap();
        assert_eq!(tables.age().entries().len(), 6);
    }
}
