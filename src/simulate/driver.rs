//! Multi-day run driver
//!
//! Walks a date range in chronological order, delegating each day to the
//! [`DailySimulator`]. Earlier days must complete before later ones so the
//! eligibility pool reflects donations already made in the same run.

use chrono::{Days, NaiveDate};
use rand::Rng;
use std::fmt;
use tracing::info;

use crate::config::{DonationRules, DriveConfig};
use crate::donor::DonorSynthesizer;
use crate::registry::{DonationLedger, DonorRegistry};
use crate::Result;

use super::{DailySimulator, DayOutcome};

/// Days between progress log lines during a backfill
const PROGRESS_INTERVAL_DAYS: u32 = 30;

/// Totals for one simulation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Days walked
    pub days_processed: u32,
    /// Days on which a drive was held
    pub drives_held: u32,
    /// Donation events generated
    pub events_generated: u64,
    /// Donors skipped because their registry write-back failed
    pub registry_failures: u64,
    /// Daily batches the ledger refused
    pub persist_failures: u32,
}

impl RunSummary {
    fn absorb(&mut self, outcome: &DayOutcome) {
        self.days_processed += 1;
        if let DayOutcome::Drive {
            events_generated,
            registry_failures,
            persisted,
            ..
        } = outcome
        {
            self.drives_held += 1;
            self.events_generated += *events_generated as u64;
            self.registry_failures += *registry_failures as u64;
            if !persisted {
                self.persist_failures += 1;
            }
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Days processed:     {}", self.days_processed)?;
        writeln!(f, "  Drives held:        {}", self.drives_held)?;
        writeln!(f, "  Events generated:   {}", self.events_generated)?;
        writeln!(f, "  Registry failures:  {}", self.registry_failures)?;
        write!(f, "  Persist failures:   {}", self.persist_failures)
    }
}

/// Drives simulation runs across one or many days
pub struct RunDriver {
    simulator: DailySimulator,
}

impl RunDriver {
    pub fn new(drive: DriveConfig, rules: DonationRules) -> Self {
        Self {
            simulator: DailySimulator::new(drive, rules),
        }
    }

    /// Simulate every date from `end_date - days` through `end_date`, oldest
    /// first (a span of `days + 1` dates, so `--days 365` covers a full year
    /// plus today)
    pub fn backfill<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        registry: &mut dyn DonorRegistry,
        ledger: &mut dyn DonationLedger,
        end_date: NaiveDate,
        days: u32,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        for offset in (0..=days).rev() {
            let date = end_date - Days::new(u64::from(offset));
            let outcome = self.simulator.simulate_day(rng, date, registry, ledger)?;
            summary.absorb(&outcome);
            if summary.days_processed % PROGRESS_INTERVAL_DAYS == 0 {
                info!(
                    days_processed = summary.days_processed,
                    total_days = days + 1,
                    events = summary.events_generated,
                    "backfill progress"
                );
            }
        }
        info!(
            days = summary.days_processed,
            drives = summary.drives_held,
            events = summary.events_generated,
            registry_failures = summary.registry_failures,
            persist_failures = summary.persist_failures,
            "run complete"
        );
        Ok(summary)
    }

    /// Simulate a single day
    pub fn single_day<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        registry: &mut dyn DonorRegistry,
        ledger: &mut dyn DonationLedger,
        date: NaiveDate,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        let outcome = self.simulator.simulate_day(rng, date, registry, ledger)?;
        summary.absorb(&outcome);
        info!(
            %date,
            drives = summary.drives_held,
            events = summary.events_generated,
            "run complete"
        );
        Ok(summary)
    }
}

/// Populate a registry with freshly synthesized donors
///
/// Donors are synthesized first and registered as one batch, so file-backed
/// registries persist the whole population in a single write.
pub fn seed_donors<R: Rng + ?Sized>(
    rng: &mut R,
    synthesizer: &DonorSynthesizer,
    registry: &mut dyn DonorRegistry,
    count: usize,
    today: NaiveDate,
) -> Result<usize> {
    let mut donors = Vec::with_capacity(count);
    for created in 0..count {
        donors.push(synthesizer.synthesize(rng, today));
        if (created + 1) % 100 == 0 {
            info!(created = created + 1, total = count, "synthesizing donors");
        }
    }
    registry.create_all(donors)?;
    info!(count, "donor seeding complete");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DonationRules, OutputConfig};
    use crate::distribution::tables::DemographicTables;
    use crate::registry::csv::{CsvLedger, CsvRegistry};
    use crate::registry::memory::{MemoryLedger, MemoryRegistry};
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn drive(chance_percent: f64, min_units: u32, max_units: u32) -> DriveConfig {
        DriveConfig {
            chance_percent,
            min_units,
            max_units,
        }
    }

    fn seeded_registry(count: usize) -> MemoryRegistry {
        let synth =
            DonorSynthesizer::new(DemographicTables::defaults_2024(), DonationRules::default());
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(99);
        let mut registry = MemoryRegistry::new(56);
        for _ in 0..count {
            let mut donor = synth.synthesize(&mut rng, date(2024, 6, 1));
            donor.total_donations = 0;
            donor.first_donation_date = donor.birthdate;
            donor.last_donation_date = donor.birthdate;
            registry.create(donor).unwrap();
        }
        registry
    }

    #[test]
    fn test_backfill_walks_days_oldest_first() {
        let driver = RunDriver::new(drive(100.0, 2, 2), DonationRules::default());
        let mut registry = seeded_registry(200);
        let mut ledger = MemoryLedger::new();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);

        // The range is inclusive at both ends: end − 10 through end is 11 dates.
        let end = date(2024, 6, 1);
        let summary = driver
            .backfill(&mut rng, &mut registry, &mut ledger, end, 10)
            .unwrap();
        assert_eq!(summary.days_processed, 11);
        assert_eq!(summary.drives_held, 11);

        let dates: Vec<_> = ledger.events().iter().map(|e| e.donation_date).collect();
        assert_eq!(*dates.first().unwrap(), date(2024, 5, 22));
        assert_eq!(*dates.last().unwrap(), end);
        assert!(dates.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_zero_chance_run_generates_nothing() {
        let driver = RunDriver::new(drive(0.0, 10, 50), DonationRules::default());
        let mut registry = seeded_registry(50);
        let mut ledger = MemoryLedger::new();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);

        let summary = driver
            .backfill(&mut rng, &mut registry, &mut ledger, date(2024, 6, 1), 30)
            .unwrap();
        assert_eq!(summary.days_processed, 31);
        assert_eq!(summary.drives_held, 0);
        assert_eq!(summary.events_generated, 0);
        assert_eq!(ledger.event_count().unwrap(), 0);
    }

    #[test]
    fn test_empty_registry_run_is_not_an_error() {
        let driver = RunDriver::new(drive(100.0, 10, 50), DonationRules::default());
        let mut registry = MemoryRegistry::new(56);
        let mut ledger = MemoryLedger::new();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);

        let summary = driver
            .backfill(&mut rng, &mut registry, &mut ledger, date(2024, 6, 1), 10)
            .unwrap();
        assert_eq!(summary.days_processed, 11);
        assert_eq!(summary.events_generated, 0);
        assert_eq!(summary.persist_failures, 0);
    }

    #[test]
    fn test_interval_shapes_multi_day_totals() {
        // Three donors, a guaranteed drive with a target above the pool size:
        // every eligible donor donates every day a drive lands. With a 56-day
        // rest, the 121-date span allows exactly three donations per donor
        // (offsets 0, 56, and 112).
        let driver = RunDriver::new(drive(100.0, 10, 10), DonationRules::default());
        let mut registry = seeded_registry(3);
        let mut ledger = MemoryLedger::new();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);

        let summary = driver
            .backfill(&mut rng, &mut registry, &mut ledger, date(2024, 6, 1), 120)
            .unwrap();
        assert_eq!(summary.events_generated, 9);
        for donor in registry.donors() {
            assert_eq!(donor.total_donations, 3);
        }
    }

    #[test]
    fn test_persist_failures_are_counted() {
        let driver = RunDriver::new(drive(100.0, 5, 5), DonationRules::default());
        let mut registry = seeded_registry(200);
        let mut ledger = MemoryLedger::new();
        ledger.set_should_fail(true);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);

        let summary = driver
            .backfill(&mut rng, &mut registry, &mut ledger, date(2024, 6, 1), 3)
            .unwrap();
        assert_eq!(summary.drives_held, 4);
        assert_eq!(summary.persist_failures, 4);
        assert_eq!(ledger.event_count().unwrap(), 0);
    }

    #[test]
    fn test_registry_failures_do_not_stop_the_run() {
        let driver = RunDriver::new(drive(100.0, 5, 5), DonationRules::default());
        let mut registry = seeded_registry(50);
        registry.set_should_fail(true);
        let mut ledger = MemoryLedger::new();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(23);

        let summary = driver
            .backfill(&mut rng, &mut registry, &mut ledger, date(2024, 6, 1), 3)
            .unwrap();
        assert_eq!(summary.days_processed, 4);
        assert_eq!(summary.registry_failures, 20);
        assert_eq!(summary.events_generated, 0);
        assert_eq!(summary.persist_failures, 0);
    }

    #[test]
    fn test_single_day_summary() {
        let driver = RunDriver::new(drive(100.0, 5, 5), DonationRules::default());
        let mut registry = seeded_registry(10);
        let mut ledger = MemoryLedger::new();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);

        let summary = driver
            .single_day(&mut rng, &mut registry, &mut ledger, date(2024, 6, 1))
            .unwrap();
        assert_eq!(summary.days_processed, 1);
        assert_eq!(summary.events_generated, 5);
    }

    #[test]
    fn test_single_day_writes_only_the_daily_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = OutputConfig {
            data_dir: dir.path().to_path_buf(),
            ..OutputConfig::default()
        };
        let day = date(2024, 6, 1);

        let synth =
            DonorSynthesizer::new(DemographicTables::defaults_2024(), DonationRules::default());
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(99);
        let mut registry = CsvRegistry::new(output.donors_path(), 56);
        let donors: Vec<_> = (0..10)
            .map(|_| {
                let mut donor = synth.synthesize(&mut rng, day);
                donor.total_donations = 0;
                donor.first_donation_date = donor.birthdate;
                donor.last_donation_date = donor.birthdate;
                donor
            })
            .collect();
        registry.create_all(donors).unwrap();

        let driver = RunDriver::new(drive(100.0, 5, 5), DonationRules::default());
        let mut ledger = CsvLedger::new(output.daily_activity_path(day));
        let mut run_rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let summary = driver
            .single_day(&mut run_rng, &mut registry, &mut ledger, day)
            .unwrap();

        assert_eq!(summary.events_generated, 5);
        assert_eq!(ledger.event_count().unwrap(), 5);
        // Events land only in the per-date activity file; the main
        // donations ledger is never touched.
        assert!(output.daily_activity_path(day).exists());
        assert!(!output.donations_path().exists());
    }

    #[test]
    fn test_seed_donors_fills_registry() {
        let synth =
            DonorSynthesizer::new(DemographicTables::defaults_2024(), DonationRules::default());
        let mut registry = MemoryRegistry::new(56);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);

        let created =
            seed_donors(&mut rng, &synth, &mut registry, 250, date(2024, 6, 1)).unwrap();
        assert_eq!(created, 250);
        assert_eq!(registry.donor_count().unwrap(), 250);

        // Same seed, same sampled demographics (identifiers are random).
        let mut other = MemoryRegistry::new(56);
        let mut rng2 = Xoshiro256PlusPlus::seed_from_u64(42);
        seed_donors(&mut rng2, &synth, &mut other, 250, date(2024, 6, 1)).unwrap();
        let demographics = |r: &MemoryRegistry| -> Vec<_> {
            r.donors()
                .iter()
                .map(|d| (d.name.clone(), d.birthdate, d.blood_type, d.total_donations))
                .collect()
        };
        assert_eq!(demographics(&registry), demographics(&other));
    }
}
