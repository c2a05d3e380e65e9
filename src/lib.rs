//! hemosynth - Synthetic blood-donor dataset generator
//!
//! hemosynth synthesizes a realistic, internally-consistent population of blood
//! donors and their donation history for testing and demonstration purposes. It
//! produces two linked datasets: a donor registry (demographics plus donation
//! summary statistics) and a donation ledger (individual donation events with
//! blood-bank test outcomes), subject to real-world eligibility constraints.
//!
//! # Architecture
//!
//! - **Weighted sampling**: layered demographic distributions (age, sex,
//!   ethnicity, ethnicity-conditioned blood type)
//! - **Donor synthesis**: demographics plus a donation history that is
//!   temporally consistent with age and the 56-day donation interval
//! - **Day-by-day simulation**: blood drives against a live eligibility pool,
//!   with transactional donor-state write-back
//! - **Pluggable storage**: in-memory and CSV-backed registry/ledger

pub mod config;
pub mod distribution;
pub mod donor;
pub mod event;
pub mod registry;
pub mod simulate;

// Re-export commonly used types
pub use config::Config;
pub use donor::Donor;
pub use event::DonationEvent;

/// Result type used throughout hemosynth
pub type Result<T> = anyhow::Result<T>;
