//! Daily blood-drive simulation
//!
//! One simulated day either holds a drive or does not, decided by the
//! configured drive chance. A drive draws a target unit count, shuffles the
//! eligible donor pool, and collects one unit from each selected donor.
//! Donation summaries are written back to the registry donor by donor; the
//! day's events are handed to the ledger as a single batch at the end.
//!
//! Storage failures never abort a run. A donor whose write-back fails is
//! skipped (no event for them that day) and counted; a ledger write failure
//! is logged and surfaced in the outcome, with the registry updates already
//! made for that day deliberately kept: the donors did donate, the record of
//! the bags is what went missing.

pub mod driver;

use chrono::NaiveDate;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, error, info, warn};

use crate::config::{DonationRules, DriveConfig};
use crate::event::DonationEvent;
use crate::registry::{DonationLedger, DonorRegistry};
use crate::Result;

/// What happened on one simulated day
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayOutcome {
    /// The drive-chance roll failed; no donations
    NoDrive,
    /// A drive was held
    Drive {
        /// Units the drive aimed to collect
        target_units: u32,
        /// Size of the eligible pool before selection
        pool_size: usize,
        /// Events actually generated (capped by the pool)
        events_generated: usize,
        /// Selected donors skipped because their write-back failed
        registry_failures: usize,
        /// Whether the ledger accepted the day's batch
        persisted: bool,
    },
}

impl DayOutcome {
    /// Events generated on this day
    pub fn events_generated(&self) -> usize {
        match self {
            DayOutcome::NoDrive => 0,
            DayOutcome::Drive {
                events_generated, ..
            } => *events_generated,
        }
    }
}

/// Simulates blood drives one day at a time
///
/// Holds no random state; the caller threads a random source through each
/// call, so a whole run is reproducible from one seed.
pub struct DailySimulator {
    drive: DriveConfig,
    rules: DonationRules,
}

impl DailySimulator {
    pub fn new(drive: DriveConfig, rules: DonationRules) -> Self {
        Self { drive, rules }
    }

    /// Simulate a single day against the given registry and ledger
    pub fn simulate_day<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        date: NaiveDate,
        registry: &mut dyn DonorRegistry,
        ledger: &mut dyn DonationLedger,
    ) -> Result<DayOutcome> {
        if rng.gen::<f64>() > self.drive.chance_percent / 100.0 {
            debug!(%date, "no drive held");
            return Ok(DayOutcome::NoDrive);
        }
        let target_units = rng.gen_range(self.drive.min_units..=self.drive.max_units);

        let mut pool = registry.eligible_donors(date)?;
        let pool_size = pool.len();
        if pool.is_empty() {
            warn!(%date, target_units, "drive held but no donor is eligible");
            return Ok(DayOutcome::Drive {
                target_units,
                pool_size: 0,
                events_generated: 0,
                registry_failures: 0,
                persisted: true,
            });
        }
        pool.shuffle(rng);

        let mut events = Vec::with_capacity(pool.len().min(target_units as usize));
        let mut registry_failures = 0;
        for donor in pool.iter().take(target_units as usize) {
            // A failed write-back skips the donor rather than aborting the
            // run; without the summary update the event would contradict the
            // registry, so neither is recorded.
            if let Err(e) = registry.record_donation(donor.donor_id, date) {
                error!(%date, donor = %donor.code, error = %e, "donation write-back failed, skipping donor");
                registry_failures += 1;
                continue;
            }
            events.push(DonationEvent::synthesize(rng, date, donor, &self.rules));
        }

        let persisted = match ledger.append_events(&events) {
            Ok(()) => true,
            Err(e) => {
                error!(%date, error = %e, "failed to persist day's donation events");
                false
            }
        };

        info!(
            %date,
            target_units,
            pool_size,
            events = events.len(),
            registry_failures,
            persisted,
            "drive completed"
        );
        Ok(DayOutcome::Drive {
            target_units,
            pool_size,
            events_generated: events.len(),
            registry_failures,
            persisted,
        })
    }
}
