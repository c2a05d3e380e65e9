//! In-memory registry and ledger
//!
//! Backing store for tests and for seeding pipelines that only persist at
//! the end of a run. The ledger carries a failure toggle so callers can
//! exercise the persistence-error path deterministically.

use anyhow::bail;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::donor::Donor;
use crate::event::DonationEvent;
use crate::Result;

use super::{is_eligible, DonationLedger, DonorRegistry};

/// Donor registry held entirely in memory, in insertion order
pub struct MemoryRegistry {
    donors: Vec<Donor>,
    min_interval_days: u32,
    should_fail: bool,
}

impl MemoryRegistry {
    pub fn new(min_interval_days: u32) -> Self {
        Self {
            donors: Vec::new(),
            min_interval_days,
            should_fail: false,
        }
    }

    /// Make every subsequent write fail, for error-path tests
    pub fn set_should_fail(&mut self, should_fail: bool) {
        self.should_fail = should_fail;
    }

    /// All donors, in insertion order
    pub fn donors(&self) -> &[Donor] {
        &self.donors
    }
}

impl DonorRegistry for MemoryRegistry {
    fn create(&mut self, donor: Donor) -> Result<()> {
        if self.should_fail {
            bail!("simulated registry failure");
        }
        self.donors.push(donor);
        Ok(())
    }

    fn eligible_donors(&self, as_of: NaiveDate) -> Result<Vec<Donor>> {
        Ok(self
            .donors
            .iter()
            .filter(|d| is_eligible(d, as_of, self.min_interval_days))
            .cloned()
            .collect())
    }

    fn record_donation(&mut self, donor_id: Uuid, donation_date: NaiveDate) -> Result<()> {
        if self.should_fail {
            bail!("simulated registry failure");
        }
        match self.donors.iter_mut().find(|d| d.donor_id == donor_id) {
            Some(donor) => {
                if donor.total_donations == 0 {
                    donor.first_donation_date = donation_date;
                }
                donor.last_donation_date = donation_date;
                donor.total_donations += 1;
                Ok(())
            }
            None => bail!("donor {donor_id} is not registered"),
        }
    }

    fn donor_count(&self) -> Result<usize> {
        Ok(self.donors.len())
    }
}

/// Append-only ledger held in memory
pub struct MemoryLedger {
    events: Vec<DonationEvent>,
    should_fail: bool,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            should_fail: false,
        }
    }

    /// Make every subsequent append fail, for error-path tests
    pub fn set_should_fail(&mut self, should_fail: bool) {
        self.should_fail = should_fail;
    }

    /// All recorded events, in append order
    pub fn events(&self) -> &[DonationEvent] {
        &self.events
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl DonationLedger for MemoryLedger {
    fn append_events(&mut self, events: &[DonationEvent]) -> Result<()> {
        if self.should_fail {
            bail!("simulated ledger failure");
        }
        self.events.extend_from_slice(events);
        Ok(())
    }

    fn event_count(&self) -> Result<usize> {
        Ok(self.events.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DonationRules;
    use crate::distribution::tables::DemographicTables;
    use crate::donor::DonorSynthesizer;
    use crate::event::DonationEvent;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn fresh_donor(seed: u64) -> Donor {
        let synth =
            DonorSynthesizer::new(DemographicTables::defaults_2024(), DonationRules::default());
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        synth.synthesize(&mut rng, date(2024, 6, 1))
    }

    #[test]
    fn test_record_donation_updates_summary() {
        let mut registry = MemoryRegistry::new(56);
        let donor = fresh_donor(1);
        let id = donor.donor_id;
        let before = donor.total_donations;
        registry.create(donor).unwrap();

        registry.record_donation(id, date(2024, 7, 1)).unwrap();
        let stored = &registry.donors()[0];
        assert_eq!(stored.total_donations, before + 1);
        assert_eq!(stored.last_donation_date, date(2024, 7, 1));
    }

    #[test]
    fn test_first_donation_clears_placeholder() {
        let mut registry = MemoryRegistry::new(56);
        let mut donor = fresh_donor(2);
        donor.total_donations = 0;
        donor.first_donation_date = donor.birthdate;
        donor.last_donation_date = donor.birthdate;
        let id = donor.donor_id;
        registry.create(donor).unwrap();

        registry.record_donation(id, date(2024, 7, 4)).unwrap();
        let stored = &registry.donors()[0];
        assert_eq!(stored.total_donations, 1);
        assert_eq!(stored.first_donation_date, date(2024, 7, 4));
        assert_eq!(stored.last_donation_date, date(2024, 7, 4));
    }

    #[test]
    fn test_record_donation_unknown_donor_fails() {
        let mut registry = MemoryRegistry::new(56);
        let result = registry.record_donation(Uuid::new_v4(), date(2024, 7, 1));
        assert!(result.is_err());
    }

    #[test]
    fn test_recent_donor_leaves_the_pool() {
        let mut registry = MemoryRegistry::new(56);
        let donor = fresh_donor(3);
        let id = donor.donor_id;
        registry.create(donor).unwrap();

        registry.record_donation(id, date(2024, 7, 1)).unwrap();
        assert!(registry.eligible_donors(date(2024, 7, 2)).unwrap().is_empty());
        assert_eq!(registry.eligible_donors(date(2024, 8, 26)).unwrap().len(), 1);
    }

    #[test]
    fn test_ledger_failure_toggle() {
        let mut ledger = MemoryLedger::new();
        let donor = fresh_donor(4);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let event =
            DonationEvent::synthesize(&mut rng, date(2024, 7, 1), &donor, &DonationRules::default());

        ledger.append_events(&[event.clone()]).unwrap();
        assert_eq!(ledger.event_count().unwrap(), 1);

        ledger.set_should_fail(true);
        assert!(ledger.append_events(&[event]).is_err());
        assert_eq!(ledger.event_count().unwrap(), 1);
    }
}
