//! Built-in demographic distribution tables
//!
//! The bundled defaults reproduce the 2024 donor-population tables: age bands,
//! sex split, ethnicity shares, and blood-type distributions conditioned on
//! ethnicity. All tables are plain data; [`DemographicTables`] is constructed
//! once and passed explicitly into the donor synthesizer so tests can swap in
//! their own distributions.

use super::{Band, TableError, WeightedTable};
use crate::donor::{BloodType, Ethnicity, Sex};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;

/// First names assigned to male donors
const MALE_FIRST_NAMES: &[&str] = &[
    "James", "Michael", "Robert", "David", "William", "Richard", "Thomas",
    "Christopher", "Daniel", "Matthew", "Anthony", "Mark", "Steven", "Andrew",
    "Joshua", "Kevin", "Brian", "Jose", "Eric", "Nathan",
];

/// First names assigned to female donors
const FEMALE_FIRST_NAMES: &[&str] = &[
    "Mary", "Patricia", "Jennifer", "Linda", "Elizabeth", "Barbara", "Susan",
    "Jessica", "Sarah", "Karen", "Lisa", "Nancy", "Sandra", "Ashley", "Emily",
    "Michelle", "Amanda", "Maria", "Laura", "Grace",
];

/// Surnames, drawn independently of first name
const SURNAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller",
    "Davis", "Rodriguez", "Martinez", "Hernandez", "Lopez", "Wilson",
    "Anderson", "Thomas", "Taylor", "Moore", "Jackson", "Nguyen", "Campbell",
];

/// Compose a sex-matched display name with uniform draws from the name pools
pub fn sample_name<R: Rng + ?Sized>(rng: &mut R, sex: Sex) -> String {
    let pool = match sex {
        Sex::Male => MALE_FIRST_NAMES,
        Sex::Female => FEMALE_FIRST_NAMES,
    };
    // Pools are non-empty constants, so choose() always yields a value.
    let first = pool.choose(rng).copied().unwrap_or("Alex");
    let last = SURNAMES.choose(rng).copied().unwrap_or("Smith");
    format!("{} {}", first, last)
}

/// The complete set of demographic distributions used for donor synthesis
///
/// Blood-type tables are stored per ethnicity variant; construction verifies
/// that every ethnicity has one, so sampling never fails.
#[derive(Debug, Clone)]
pub struct DemographicTables {
    age: WeightedTable<Band>,
    sex: WeightedTable<Sex>,
    ethnicity: WeightedTable<Ethnicity>,
    blood_type: Vec<WeightedTable<BloodType>>,
}

impl DemographicTables {
    /// Assemble tables, verifying blood-type coverage for every ethnicity
    pub fn new(
        age: WeightedTable<Band>,
        sex: WeightedTable<Sex>,
        ethnicity: WeightedTable<Ethnicity>,
        mut blood_type: HashMap<Ethnicity, WeightedTable<BloodType>>,
    ) -> Result<Self, TableError> {
        let mut indexed = Vec::with_capacity(Ethnicity::ALL.len());
        for &eth in Ethnicity::ALL {
            let table = blood_type
                .remove(&eth)
                .ok_or_else(|| TableError::MissingBloodType(eth.to_string()))?;
            indexed.push(table);
        }
        Ok(Self {
            age,
            sex,
            ethnicity,
            blood_type: indexed,
        })
    }

    /// The 2024 default tables
    ///
    /// The built-in tables are static, non-empty, non-negative data, so the
    /// construction errors cannot occur.
    pub fn defaults_2024() -> Self {
        let age = WeightedTable::new(vec![
            (Band::Scalar(17), 0.009),
            (Band::Scalar(18), 0.018),
            (Band::Scalar(19), 0.015),
            (Band::Range { start: 20, end: 25 }, 0.056),
            (Band::Range { start: 25, end: 65 }, 0.688),
            (Band::Range { start: 65, end: 81 }, 0.217),
        ])
        .expect("built-in age table is valid");
        let sex = WeightedTable::new(vec![(Sex::Male, 0.459), (Sex::Female, 0.541)])
            .expect("built-in sex table is valid");
        let ethnicity = WeightedTable::new(vec![
            (Ethnicity::White, 0.878),
            (Ethnicity::Hispanic, 0.058),
            (Ethnicity::Black, 0.027),
            (Ethnicity::Asian, 0.03),
            (Ethnicity::NativeAmerican, 0.005),
            (Ethnicity::NativeHawaiianOrPacificIslander, 0.002),
        ])
        .expect("built-in ethnicity table is valid");

        let blood_type = Ethnicity::ALL
            .iter()
            .map(|&eth| {
                WeightedTable::new(default_blood_type_entries(eth))
                    .expect("built-in blood-type table is valid")
            })
            .collect();

        Self {
            age,
            sex,
            ethnicity,
            blood_type,
        }
    }

    /// Sample a concrete age, resolving range bands to a uniform integer
    pub fn sample_age<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        self.age.sample(rng).resolve(rng)
    }

    /// Sample a sex category
    pub fn sample_sex<R: Rng + ?Sized>(&self, rng: &mut R) -> Sex {
        *self.sex.sample(rng)
    }

    /// Sample an ethnicity category
    pub fn sample_ethnicity<R: Rng + ?Sized>(&self, rng: &mut R) -> Ethnicity {
        *self.ethnicity.sample(rng)
    }

    /// Sample a blood type from the table keyed by the given ethnicity
    pub fn sample_blood_type<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        ethnicity: Ethnicity,
    ) -> BloodType {
        *self.blood_type[ethnicity.index()].sample(rng)
    }

    /// The age table
    pub fn age(&self) -> &WeightedTable<Band> {
        &self.age
    }

    /// The sex table
    pub fn sex(&self) -> &WeightedTable<Sex> {
        &self.sex
    }

    /// The ethnicity table
    pub fn ethnicity(&self) -> &WeightedTable<Ethnicity> {
        &self.ethnicity
    }

    /// The blood-type table for one ethnicity
    pub fn blood_type(&self, ethnicity: Ethnicity) -> &WeightedTable<BloodType> {
        &self.blood_type[ethnicity.index()]
    }
}

impl Default for DemographicTables {
    fn default() -> Self {
        Self::defaults_2024()
    }
}

/// 2024 blood-type distribution for one ethnicity
fn default_blood_type_entries(ethnicity: Ethnicity) -> Vec<(BloodType, f64)> {
    use BloodType::*;
    let weights: [f64; 8] = match ethnicity {
        Ethnicity::White => [0.37, 0.08, 0.33, 0.07, 0.09, 0.02, 0.03, 0.01],
        Ethnicity::Hispanic => [0.53, 0.04, 0.29, 0.02, 0.09, 0.01, 0.02, 0.01],
        Ethnicity::Black => [0.46, 0.04, 0.24, 0.02, 0.18, 0.01, 0.04, 0.01],
        Ethnicity::Asian => [0.39, 0.01, 0.27, 0.005, 0.25, 0.004, 0.07, 0.001],
        Ethnicity::NativeAmerican => {
            [0.5, 0.046, 0.314, 0.03, 0.074, 0.006, 0.028, 0.002]
        }
        Ethnicity::NativeHawaiianOrPacificIslander => {
            [0.388, 0.03, 0.32, 0.03, 0.16, 0.008, 0.06, 0.004]
        }
    };
    [
        OPositive, ONegative, APositive, ANegative, BPositive, BNegative,
        AbPositive, AbNegative,
    ]
    .iter()
    .copied()
    .zip(weights)
    .collect()
}
