//! Donor registry and donation ledger storage seams
//!
//! The simulation core talks to storage through two narrow traits: the
//! [`DonorRegistry`] (donor rows plus the eligibility query and the
//! donation-summary write-back) and the append-only [`DonationLedger`].
//! Two implementations are provided: an in-memory pair for tests and
//! seeding pipelines, and a CSV-backed pair for durable runs.
//!
//! # Eligibility
//!
//! A donor is eligible as of date D when they have never donated or their
//! last donation is at least the minimum interval before D. The query must
//! observe summary updates made for earlier dates in the same run: a donor
//! selected on day N drops out of the pool until day N + interval.

pub mod csv;
pub mod memory;

use crate::donor::Donor;
use crate::event::DonationEvent;
use crate::Result;
use chrono::{Days, NaiveDate};
use uuid::Uuid;

/// Read/write access to the donor registry
pub trait DonorRegistry {
    /// Insert a newly synthesized donor
    fn create(&mut self, donor: Donor) -> Result<()>;

    /// Insert a batch of donors
    ///
    /// Backends that pay per write (the CSV registry rewrites its whole file)
    /// override this to persist the batch in one pass.
    fn create_all(&mut self, donors: Vec<Donor>) -> Result<()> {
        for donor in donors {
            self.create(donor)?;
        }
        Ok(())
    }

    /// Every donor not disqualified by the minimum donation interval
    ///
    /// Returns an empty collection (not an error) when the backing store is
    /// absent or empty.
    fn eligible_donors(&self, as_of: NaiveDate) -> Result<Vec<Donor>>;

    /// Record that a donor donated: bump the count, set the last-donation date
    fn record_donation(&mut self, donor_id: Uuid, donation_date: NaiveDate) -> Result<()>;

    /// Number of registered donors
    fn donor_count(&self) -> Result<usize>;
}

/// Append-only access to the donation ledger
pub trait DonationLedger {
    /// Persist one day's events as a single batch
    fn append_events(&mut self, events: &[DonationEvent]) -> Result<()>;

    /// Number of recorded events
    fn event_count(&self) -> Result<usize>;
}

/// Shared eligibility predicate: never donated, or rested past the interval
pub(crate) fn is_eligible(donor: &Donor, as_of: NaiveDate, min_interval_days: u32) -> bool {
    if donor.total_donations == 0 {
        return true;
    }
    match as_of.checked_sub_days(Days::new(u64::from(min_interval_days))) {
        Some(cutoff) => donor.last_donation_date <= cutoff,
        // as_of underflows the calendar; nobody can have rested long enough.
        None => false,
    }
}
