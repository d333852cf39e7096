//! Run reports and their JSON serialization.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

use crate::dataset::Dataset;
use crate::identity::IdentityTables;
use crate::pipeline::DatasetState;

/// Outcome of one dataset
#[derive(Debug, Clone, Serialize)]
pub struct DatasetReport {
    pub dataset: Dataset,
    pub table: &'static str,
    pub state: DatasetState,
    pub records_read: u64,
    pub records_skipped: u64,
    pub statements_written: u64,
    pub elapsed_ms: u64,
}

/// Identity table sizes at the end of a run
#[derive(Debug, Clone, Default, Serialize)]
pub struct IdentitySummary {
    pub states: usize,
    pub cities: usize,
    /// State abbreviations in first-seen order
    pub state_keys: Vec<String>,
}

impl IdentitySummary {
    pub fn from_tables(tables: &IdentityTables) -> Self {
        Self {
            states: tables.states.len(),
            cities: tables.cities.len(),
            state_keys: tables.states.iter().map(|(key, _)| key.to_string()).collect(),
        }
    }
}

/// Outcome of a complete run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub datasets: Vec<DatasetReport>,
    pub identities: IdentitySummary,
}

impl RunReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: None,
            datasets: Vec::new(),
            identities: IdentitySummary::default(),
        }
    }

    pub fn finish(&mut self, tables: &IdentityTables) {
        self.finished_at = Some(Utc::now());
        self.identities = IdentitySummary::from_tables(tables);
    }

    pub fn statements_written(&self) -> u64 {
        self.datasets.iter().map(|d| d.statements_written).sum()
    }

    /// Write the report as pretty-printed JSON followed by a newline.
    pub fn write_json<W: Write>(&self, mut writer: W) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_json(std::io::BufWriter::new(file))
    }
}
