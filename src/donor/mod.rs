//! Donor records and the donor synthesizer
//!
//! A [`Donor`] couples immutable demographic attributes with a mutable
//! donation summary (first/last donation date, total count). The
//! [`DonorSynthesizer`] produces complete records from the demographic tables
//! and a random source, deriving each field only from fields already produced:
//! age first, then birthdate, then sex and ethnicity, then blood type (keyed
//! by ethnicity), and finally the donation history.

pub mod history;

use crate::config::DonationRules;
use crate::distribution::tables::{sample_name, DemographicTables};
use chrono::{Months, NaiveDate};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Error parsing a category label from persisted data
#[derive(Debug, Error, PartialEq)]
#[error("unknown {kind} '{value}'")]
pub struct CategoryParseError {
    kind: &'static str,
    value: String,
}

/// Donor sex category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Male => write!(f, "Male"),
            Sex::Female => write!(f, "Female"),
        }
    }
}

impl FromStr for Sex {
    type Err = CategoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Male" => Ok(Sex::Male),
            "Female" => Ok(Sex::Female),
            other => Err(CategoryParseError {
                kind: "sex",
                value: other.to_string(),
            }),
        }
    }
}

/// Donor ethnicity category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ethnicity {
    White,
    Hispanic,
    Black,
    Asian,
    #[serde(rename = "Native American")]
    NativeAmerican,
    #[serde(rename = "Native Hawaiian or Pacific Islander")]
    NativeHawaiianOrPacificIslander,
}

impl Ethnicity {
    /// Every ethnicity, in table order
    pub const ALL: &'static [Ethnicity] = &[
        Ethnicity::White,
        Ethnicity::Hispanic,
        Ethnicity::Black,
        Ethnicity::Asian,
        Ethnicity::NativeAmerican,
        Ethnicity::NativeHawaiianOrPacificIslander,
    ];

    /// Stable index of this variant within [`Ethnicity::ALL`]
    pub fn index(self) -> usize {
        match self {
            Ethnicity::White => 0,
            Ethnicity::Hispanic => 1,
            Ethnicity::Black => 2,
            Ethnicity::Asian => 3,
            Ethnicity::NativeAmerican => 4,
            Ethnicity::NativeHawaiianOrPacificIslander => 5,
        }
    }
}

impl fmt::Display for Ethnicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Ethnicity::White => "White",
            Ethnicity::Hispanic => "Hispanic",
            Ethnicity::Black => "Black",
            Ethnicity::Asian => "Asian",
            Ethnicity::NativeAmerican => "Native American",
            Ethnicity::NativeHawaiianOrPacificIslander => {
                "Native Hawaiian or Pacific Islander"
            }
        };
        write!(f, "{}", label)
    }
}

impl FromStr for Ethnicity {
    type Err = CategoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "White" => Ok(Ethnicity::White),
            "Hispanic" => Ok(Ethnicity::Hispanic),
            "Black" => Ok(Ethnicity::Black),
            "Asian" => Ok(Ethnicity::Asian),
            "Native American" => Ok(Ethnicity::NativeAmerican),
            "Native Hawaiian or Pacific Islander" => {
                Ok(Ethnicity::NativeHawaiianOrPacificIslander)
            }
            other => Err(CategoryParseError {
                kind: "ethnicity",
                value: other.to_string(),
            }),
        }
    }
}

/// ABO/Rh blood type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BloodType {
    #[serde(rename = "O positive")]
    OPositive,
    #[serde(rename = "O negative")]
    ONegative,
    #[serde(rename = "A positive")]
    APositive,
    #[serde(rename = "A negative")]
    ANegative,
    #[serde(rename = "B positive")]
    BPositive,
    #[serde(rename = "B negative")]
    BNegative,
    #[serde(rename = "AB positive")]
    AbPositive,
    #[serde(rename = "AB negative")]
    AbNegative,
}

impl fmt::Display for BloodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BloodType::OPositive => "O positive",
            BloodType::ONegative => "O negative",
            BloodType::APositive => "A positive",
            BloodType::ANegative => "A negative",
            BloodType::BPositive => "B positive",
            BloodType::BNegative => "B negative",
            BloodType::AbPositive => "AB positive",
            BloodType::AbNegative => "AB negative",
        };
        write!(f, "{}", label)
    }
}

impl FromStr for BloodType {
    type Err = CategoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "O positive" => Ok(BloodType::OPositive),
            "O negative" => Ok(BloodType::ONegative),
            "A positive" => Ok(BloodType::APositive),
            "A negative" => Ok(BloodType::ANegative),
            "B positive" => Ok(BloodType::BPositive),
            "B negative" => Ok(BloodType::BNegative),
            "AB positive" => Ok(BloodType::AbPositive),
            "AB negative" => Ok(BloodType::AbNegative),
            other => Err(CategoryParseError {
                kind: "blood type",
                value: other.to_string(),
            }),
        }
    }
}

/// Violation of the donor summary invariants
#[derive(Debug, Error, PartialEq)]
pub enum DonorInvariantError {
    #[error("first donation {first} is after last donation {last}")]
    FirstAfterLast { first: NaiveDate, last: NaiveDate },
    #[error("{total} donations cannot fit between {first} and {last} at the minimum interval")]
    TooManyDonations {
        total: u32,
        first: NaiveDate,
        last: NaiveDate,
    },
    #[error("first donation {first} precedes the donor's {min_age}th birthday")]
    UnderageFirstDonation { first: NaiveDate, min_age: u32 },
    #[error("zero-donation donor must carry the birthdate placeholder dates")]
    BadZeroPlaceholder,
}

/// One registered blood donor
///
/// Demographic fields are fixed at creation. The donation summary (first/last
/// donation date, total count) is the only mutable state and is updated
/// exclusively through the registry's `record_donation` operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Donor {
    /// Globally unique identifier
    pub donor_id: Uuid,
    /// Human-readable unique code ("DON-" plus 8 hex chars)
    pub code: String,
    /// Display name, matched to the sampled sex
    pub name: String,
    /// Date of birth
    pub birthdate: NaiveDate,
    /// Age in whole years, consistent with birthdate at generation time
    pub age: u32,
    pub sex: Sex,
    pub ethnicity: Ethnicity,
    /// Blood type, sampled conditioned on ethnicity
    pub blood_type: BloodType,
    /// Date of the first donation; birthdate placeholder when total is zero
    pub first_donation_date: NaiveDate,
    /// Date of the most recent donation; birthdate placeholder when total is zero
    pub last_donation_date: NaiveDate,
    /// Lifetime donation count
    pub total_donations: u32,
}

impl Donor {
    /// Check the joint consistency of the donation summary
    ///
    /// Enforced when loading persisted rows; synthesized donors satisfy these
    /// by construction.
    pub fn validate(&self, rules: &DonationRules) -> Result<(), DonorInvariantError> {
        if self.total_donations == 0 {
            if self.first_donation_date != self.birthdate
                || self.last_donation_date != self.birthdate
            {
                return Err(DonorInvariantError::BadZeroPlaceholder);
            }
            return Ok(());
        }
        if self.first_donation_date > self.last_donation_date {
            return Err(DonorInvariantError::FirstAfterLast {
                first: self.first_donation_date,
                last: self.last_donation_date,
            });
        }
        let span_days = (self.last_donation_date - self.first_donation_date).num_days();
        let capacity = span_days / i64::from(rules.min_interval_days) + 1;
        if i64::from(self.total_donations) > capacity {
            return Err(DonorInvariantError::TooManyDonations {
                total: self.total_donations,
                first: self.first_donation_date,
                last: self.last_donation_date,
            });
        }
        let earliest = years_after(self.birthdate, rules.min_donor_age_years);
        if self.first_donation_date < earliest {
            return Err(DonorInvariantError::UnderageFirstDonation {
                first: self.first_donation_date,
                min_age: rules.min_donor_age_years,
            });
        }
        Ok(())
    }
}

/// Calendar-aware "date plus N years" (Feb 29 clamps to Feb 28)
pub fn years_after(date: NaiveDate, years: u32) -> NaiveDate {
    date.checked_add_months(Months::new(years * 12)).unwrap_or(date)
}

/// Calendar-aware "date minus N years" (Feb 29 clamps to Feb 28)
pub fn years_before(date: NaiveDate, years: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(years * 12)).unwrap_or(date)
}

/// Produces complete donor records from the demographic tables
///
/// Holds no random state; the caller threads a random source through each
/// call, keeping generation reproducible under a fixed seed.
pub struct DonorSynthesizer {
    tables: DemographicTables,
    rules: DonationRules,
}

impl DonorSynthesizer {
    /// Create a synthesizer over explicit tables and donation rules
    pub fn new(tables: DemographicTables, rules: DonationRules) -> Self {
        Self { tables, rules }
    }

    /// Synthesize one donor as of the given date
    ///
    /// Fields are produced in dependency order so that each draw conditions
    /// only on already-sampled attributes. Never fails: the history
    /// derivation is feasible by construction.
    pub fn synthesize<R: Rng + ?Sized>(&self, rng: &mut R, today: NaiveDate) -> Donor {
        let age = self.tables.sample_age(rng);
        let birthdate = years_before(today, age);
        let sex = self.tables.sample_sex(rng);
        let ethnicity = self.tables.sample_ethnicity(rng);
        let blood_type = self.tables.sample_blood_type(rng, ethnicity);
        let summary = history::derive(rng, birthdate, today, &self.rules);

        let donor_id = Uuid::new_v4();
        Donor {
            donor_id,
            code: format!("DON-{}", &donor_id.simple().to_string()[..8]),
            name: sample_name(rng, sex),
            birthdate,
            age,
            sex,
            ethnicity,
            blood_type,
            first_donation_date: summary.first_donation_date,
            last_donation_date: summary.last_donation_date,
            total_donations: summary.total_donations,
        }
    }
}
