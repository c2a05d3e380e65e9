//! Donation events
//!
//! A [`DonationEvent`] records one collected unit ("bag"): which donor gave
//! it, when, the blood-bank test outcome a day later, and whether the unit is
//! still available. Events are immutable once synthesized and reference their
//! donor by identifier only.

use crate::config::DonationRules;
use crate::donor::Donor;
use chrono::{Days, NaiveDate, NaiveTime};
use rand::Rng;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Error parsing a bag status label from persisted data
#[derive(Debug, Error, PartialEq)]
#[error("unknown bag status '{0}'")]
pub struct BagStatusParseError(String);

/// Whether a collected unit is still on the shelf
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BagStatus {
    Available,
    Used,
}

impl fmt::Display for BagStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BagStatus::Available => write!(f, "available"),
            BagStatus::Used => write!(f, "used"),
        }
    }
}

impl FromStr for BagStatus {
    type Err = BagStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(BagStatus::Available),
            "used" => Ok(BagStatus::Used),
            other => Err(BagStatusParseError(other.to_string())),
        }
    }
}

/// One donation of one unit of blood
#[derive(Debug, Clone, PartialEq)]
pub struct DonationEvent {
    /// Unit identifier: blood-type label plus a random 8-hex suffix
    pub bag_id: String,
    /// Unique event identifier
    pub event_id: Uuid,
    /// The donating donor (non-owning reference by id)
    pub donor_id: Uuid,
    pub donation_date: NaiveDate,
    /// Collection time within the drive's daily window
    pub donation_time: NaiveTime,
    /// Always the day after the donation date
    pub test_date: NaiveDate,
    /// Blood-bank screening outcome
    pub test_passed: bool,
    pub status: BagStatus,
}

impl DonationEvent {
    /// Synthesize the event for one donor donating on the given date
    ///
    /// The test date is fixed to the day after the donation; the collection
    /// time is uniform within the configured window; test outcome and status
    /// follow the configured rates.
    pub fn synthesize<R: Rng + ?Sized>(
        rng: &mut R,
        donation_date: NaiveDate,
        donor: &Donor,
        rules: &DonationRules,
    ) -> Self {
        let hour = rng.gen_range(rules.window_start_hour..=rules.window_end_hour);
        let minute = rng.gen_range(0..60);
        // Hours are validated to 0-23 by config validation.
        let donation_time =
            NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);

        Self {
            bag_id: format!(
                "{}-{}",
                donor.blood_type,
                &Uuid::new_v4().simple().to_string()[..8]
            ),
            event_id: Uuid::new_v4(),
            donor_id: donor.donor_id,
            donation_date,
            donation_time,
            test_date: donation_date + Days::new(1),
            test_passed: rng.gen::<f64>() < rules.test_pass_rate,
            status: if rng.gen::<f64>() < rules.available_rate {
                BagStatus::Available
            } else {
                BagStatus::Used
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DonationRules;
    use crate::distribution::tables::DemographicTables;
    use crate::donor::DonorSynthesizer;
    use chrono::Timelike;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_donor(seed: u64) -> Donor {
        let synth =
            DonorSynthesizer::new(DemographicTables::defaults_2024(), DonationRules::default());
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        synth.synthesize(&mut rng, date(2024, 6, 1))
    }

    #[test]
    fn test_test_date_is_day_after_donation() {
        let rules = DonationRules::default();
        let donor = sample_donor(1);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(2);
        for day in 1..=28 {
            let event =
                DonationEvent::synthesize(&mut rng, date(2024, 2, day), &donor, &rules);
            assert_eq!(event.test_date, event.donation_date + Days::new(1));
        }
        // Month boundary
        let event = DonationEvent::synthesize(&mut rng, date(2024, 1, 31), &donor, &rules);
        assert_eq!(event.test_date, date(2024, 2, 1));
    }

    #[test]
    fn test_donation_time_within_window() {
        let rules = DonationRules::default();
        let donor = sample_donor(3);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(4);
        for _ in 0..1000 {
            let event = DonationEvent::synthesize(&mut rng, date(2024, 3, 1), &donor, &rules);
            let hour = event.donation_time.hour();
            assert!((8..=17).contains(&hour), "hour {} outside window", hour);
        }
    }

    #[test]
    fn test_bag_id_carries_blood_type_prefix() {
        let rules = DonationRules::default();
        let donor = sample_donor(5);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(6);
        let event = DonationEvent::synthesize(&mut rng, date(2024, 3, 1), &donor, &rules);
        let prefix = donor.blood_type.to_string();
        assert!(event.bag_id.starts_with(&format!("{}-", prefix)));
        assert_eq!(event.bag_id.len(), prefix.len() + 1 + 8);
    }

    #[test]
    fn test_failure_rate_is_rare() {
        // 0.2% failure rate; over 10,000 events expect about 20 failures,
        // tolerate up to 1% either way.
        let rules = DonationRules::default();
        let donor = sample_donor(7);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(8);
        let mut failures = 0u32;
        for _ in 0..10000 {
            let event = DonationEvent::synthesize(&mut rng, date(2024, 3, 1), &donor, &rules);
            if !event.test_passed {
                failures += 1;
            }
        }
        assert!(failures <= 120, "failures {} above tolerance", failures);
    }

    #[test]
    fn test_status_split_tracks_available_rate() {
        let rules = DonationRules::default();
        let donor = sample_donor(9);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(10);
        let mut used = 0u32;
        for _ in 0..10000 {
            let event = DonationEvent::synthesize(&mut rng, date(2024, 3, 1), &donor, &rules);
            if event.status == BagStatus::Used {
                used += 1;
            }
        }
        // Expect ~500 used units
        assert!(used > 350 && used < 700, "used count {}", used);
    }

    #[test]
    fn test_bag_status_round_trip() {
        assert_eq!(BagStatus::from_str("available").unwrap(), BagStatus::Available);
        assert_eq!(BagStatus::from_str("used").unwrap(), BagStatus::Used);
        assert!(BagStatus::from_str("discarded").is_err());
    }
}
