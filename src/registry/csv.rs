//! CSV-backed registry and ledger
//!
//! The registry keeps the full donor table in one CSV file and rewrites it
//! on every mutation; at simulation scale that is a few thousand rows, and
//! whole-file rewrites keep the format trivially inspectable. The ledger is
//! append-only: batches are written to the end of the file, with the header
//! emitted once when the file is created.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use tracing::warn;
use uuid::Uuid;

use crate::donor::Donor;
use crate::event::DonationEvent;
use crate::Result;

use super::{is_eligible, DonationLedger, DonorRegistry};

const DONOR_HEADER: [&str; 11] = [
    "donor_id",
    "code",
    "name",
    "birthdate",
    "age",
    "sex",
    "ethnicity",
    "blood_type",
    "first_donation_date",
    "last_donation_date",
    "total_donations",
];

const EVENT_HEADER: [&str; 8] = [
    "bag_id",
    "event_id",
    "donor_id",
    "donation_date",
    "donation_time",
    "test_date",
    "test_result",
    "status",
];

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

/// Donor registry persisted as a single CSV file
pub struct CsvRegistry {
    path: PathBuf,
    min_interval_days: u32,
}

impl CsvRegistry {
    pub fn new<P: Into<PathBuf>>(path: P, min_interval_days: u32) -> Self {
        Self {
            path: path.into(),
            min_interval_days,
        }
    }

    /// Load every donor row, validating nothing beyond field syntax
    ///
    /// A missing file is an empty registry, not an error: first runs start
    /// from nothing.
    pub fn load(&self) -> Result<Vec<Donor>> {
        if !self.path.exists() {
            warn!(path = %self.path.display(), "donor registry file not found, starting empty");
            return Ok(Vec::new());
        }
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)
            .with_context(|| format!("failed to open donor registry {}", self.path.display()))?;

        let mut donors = Vec::new();
        for (index, record) in reader.records().enumerate() {
            // Header is line 1; the first record is line 2.
            let line = index + 2;
            let record = record
                .with_context(|| format!("failed to read donor registry line {line}"))?;
            donors.push(
                parse_donor_row(&record)
                    .with_context(|| format!("malformed donor row at line {line}"))?,
            );
        }
        Ok(donors)
    }

    fn save(&self, donors: &[Donor]) -> Result<()> {
        ensure_parent_dir(&self.path)?;
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_path(&self.path)
            .with_context(|| format!("failed to write donor registry {}", self.path.display()))?;
        writer.write_record(DONOR_HEADER)?;
        for donor in donors {
            writer.write_record(&donor_row(donor))?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl DonorRegistry for CsvRegistry {
    fn create(&mut self, donor: Donor) -> Result<()> {
        self.create_all(vec![donor])
    }

    fn create_all(&mut self, donors: Vec<Donor>) -> Result<()> {
        let mut all = self.load()?;
        all.extend(donors);
        self.save(&all)
    }

    fn eligible_donors(&self, as_of: NaiveDate) -> Result<Vec<Donor>> {
        let mut donors = self.load()?;
        donors.retain(|d| is_eligible(d, as_of, self.min_interval_days));
        Ok(donors)
    }

    fn record_donation(&mut self, donor_id: Uuid, donation_date: NaiveDate) -> Result<()> {
        let mut donors = self.load()?;
        let donor = donors
            .iter_mut()
            .find(|d| d.donor_id == donor_id)
            .ok_or_else(|| anyhow!("donor {donor_id} is not registered"))?;
        if donor.total_donations == 0 {
            donor.first_donation_date = donation_date;
        }
        donor.last_donation_date = donation_date;
        donor.total_donations += 1;
        self.save(&donors)
    }

    fn donor_count(&self) -> Result<usize> {
        Ok(self.load()?.len())
    }
}

/// Append-only donation ledger persisted as a CSV file
pub struct CsvLedger {
    path: PathBuf,
}

impl CsvLedger {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl DonationLedger for CsvLedger {
    fn append_events(&mut self, events: &[DonationEvent]) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }
        ensure_parent_dir(&self.path)?;
        let needs_header =
            !self.path.exists() || fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open donation ledger {}", self.path.display()))?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        if needs_header {
            writer.write_record(EVENT_HEADER)?;
        }
        for event in events {
            writer.write_record(&event_row(event))?;
        }
        writer.flush()?;
        Ok(())
    }

    fn event_count(&self) -> Result<usize> {
        if !self.path.exists() {
            return Ok(0);
        }
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)
            .with_context(|| format!("failed to open donation ledger {}", self.path.display()))?;
        let mut count = 0;
        for record in reader.records() {
            record?;
            count += 1;
        }
        Ok(count)
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}

fn donor_row(donor: &Donor) -> [String; 11] {
    [
        donor.donor_id.to_string(),
        donor.code.clone(),
        donor.name.clone(),
        donor.birthdate.format(DATE_FORMAT).to_string(),
        donor.age.to_string(),
        donor.sex.to_string(),
        donor.ethnicity.to_string(),
        donor.blood_type.to_string(),
        donor.first_donation_date.format(DATE_FORMAT).to_string(),
        donor.last_donation_date.format(DATE_FORMAT).to_string(),
        donor.total_donations.to_string(),
    ]
}

fn event_row(event: &DonationEvent) -> [String; 8] {
    [
        event.bag_id.clone(),
        event.event_id.to_string(),
        event.donor_id.to_string(),
        event.donation_date.format(DATE_FORMAT).to_string(),
        event.donation_time.format(TIME_FORMAT).to_string(),
        event.test_date.format(DATE_FORMAT).to_string(),
        if event.test_passed { "passed" } else { "failed" }.to_string(),
        event.status.to_string(),
    ]
}

fn parse_donor_row(record: &StringRecord) -> Result<Donor> {
    Ok(Donor {
        donor_id: field(record, 0, "donor_id")?.parse()?,
        code: field(record, 1, "code")?.to_string(),
        name: field(record, 2, "name")?.to_string(),
        birthdate: parse_date(field(record, 3, "birthdate")?)?,
        age: field(record, 4, "age")?
            .parse()
            .context("age is not a non-negative integer")?,
        sex: field(record, 5, "sex")?.parse()?,
        ethnicity: field(record, 6, "ethnicity")?.parse()?,
        blood_type: field(record, 7, "blood_type")?.parse()?,
        first_donation_date: parse_date(field(record, 8, "first_donation_date")?)?,
        last_donation_date: parse_date(field(record, 9, "last_donation_date")?)?,
        total_donations: field(record, 10, "total_donations")?
            .parse()
            .context("total_donations is not a non-negative integer")?,
    })
}

fn field<'r>(record: &'r StringRecord, index: usize, name: &str) -> Result<&'r str> {
    record
        .get(index)
        .ok_or_else(|| anyhow!("missing column {name}"))
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .with_context(|| format!("invalid date {raw:?}, expected YYYY-MM-DD"))
}
