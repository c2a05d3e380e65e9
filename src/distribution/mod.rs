//! Weighted sampling over discrete distributions
//!
//! This module provides the weighted sampler that underpins all demographic
//! generation. A distribution is an ordered list of (category, weight) pairs
//! whose weights are non-negative and intended to sum to 1.0. Sampling draws a
//! uniform value in [0, 1) and walks the list accumulating probability mass.
//!
//! # Catch-All Design
//!
//! Published demographic tables rarely sum to exactly 1.0 once rounded, and
//! floating-point accumulation drifts further. Rather than rejecting such
//! tables or failing a draw that overshoots the total mass, the sampler
//! deterministically returns the final category. Sampling therefore never
//! fails once a table has been constructed.
//!
//! # Determinism
//!
//! The sampler holds no state of its own; the caller supplies the random
//! source. With a fixed seed, repeated calls yield the identical sequence of
//! draws, which keeps simulation runs reproducible and composable.
//!
//! # Example
//!
//! ```
//! use hemosynth::distribution::WeightedTable;
//! use rand::SeedableRng;
//! use rand_xoshiro::Xoshiro256PlusPlus;
//!
//! let table = WeightedTable::new(vec![("heads", 0.5), ("tails", 0.5)]).unwrap();
//! let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
//! let side = table.sample(&mut rng);
//! assert!(*side == "heads" || *side == "tails");
//! ```

pub mod tables;

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error constructing a weighted table
#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    /// The table has no entries to sample from
    #[error("distribution table must contain at least one entry")]
    Empty,
    /// A weight is negative
    #[error("distribution weight at entry {index} is negative ({weight})")]
    NegativeWeight { index: usize, weight: f64 },
    /// A conditioned table is missing for one of its keys
    #[error("no blood-type table for ethnicity '{0}'")]
    MissingBloodType(String),
}

/// An ordered weighted distribution over categories of type `T`
///
/// Construction validates the entries; sampling is infallible afterwards.
/// The entry order is preserved because the cumulative walk (and the
/// catch-all fallback) depend on it.
#[derive(Debug, Clone)]
pub struct WeightedTable<T> {
    entries: Vec<(T, f64)>,
}

impl<T> WeightedTable<T> {
    /// Create a table from ordered (category, weight) pairs
    ///
    /// Rejects empty tables and negative weights. Weights are expected to sum
    /// to roughly 1.0 but this is not enforced; the sampler treats the final
    /// entry as a catch-all for any residual mass.
    pub fn new(entries: Vec<(T, f64)>) -> Result<Self, TableError> {
        if entries.is_empty() {
            return Err(TableError::Empty);
        }
        for (index, (_, weight)) in entries.iter().enumerate() {
            if *weight < 0.0 {
                return Err(TableError::NegativeWeight {
                    index,
                    weight: *weight,
                });
            }
        }
        Ok(Self { entries })
    }

    /// Draw one category according to the weights
    ///
    /// Walks the entries accumulating probability mass and returns the first
    /// category whose cumulative mass reaches the uniform draw. If the draw
    /// exceeds the total mass (weights summing below 1.0, or floating-point
    /// drift), the final category is returned deterministically.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> &T {
        let draw: f64 = rng.gen();
        let mut cumulative = 0.0;
        for (category, weight) in &self.entries {
            cumulative += weight;
            if draw <= cumulative {
                return category;
            }
        }
        // Residual mass falls through to the last entry.
        &self.entries[self.entries.len() - 1].0
    }

    /// The ordered entries of this table
    pub fn entries(&self) -> &[(T, f64)] {
        &self.entries
    }

    /// Sum of all weights (diagnostic; roughly 1.0 for well-formed tables)
    pub fn total_weight(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w).sum()
    }
}

/// An age category: either a single age or a contiguous range of ages
///
/// Range bounds follow the half-open convention: `start` is inclusive, `end`
/// is exclusive. Sampling a range category draws a second uniform integer
/// within the range rather than returning the range itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Band {
    /// A single integer value
    Scalar(u32),
    /// A half-open integer range [start, end)
    Range { start: u32, end: u32 },
}

impl Band {
    /// Resolve the band to a concrete integer
    ///
    /// Scalars return their value; ranges draw uniformly in [start, end).
    pub fn resolve<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        match *self {
            Band::Scalar(value) => value,
            Band::Range { start, end } => {
                if start >= end {
                    return start;
                }
                rng.gen_range(start..end)
            }
        }
    }

    /// Whether a concrete value falls within this band
    pub fn contains(&self, value: u32) -> bool {
        match *self {
            Band::Scalar(scalar) => value == scalar,
            Band::Range { start, end } => value >= start && value < end,
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Band::Scalar(value) => write!(f, "{}", value),
            Band::Range { start, end } => write!(f, "[{}, {})", start, end),
        }
    }
}
