//! Dataset catalog: where each dataset's extract and script live.

use std::path::{Path, PathBuf};

use crate::config::ConverterConfig;
use crate::dataset::Dataset;

pub const INPUT_EXTENSION: &str = "csv";
pub const OUTPUT_EXTENSION: &str = "sql";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub dataset: Dataset,
    pub input: PathBuf,
    pub output: PathBuf,
}

/// Resolves datasets to `<input_dir>/<stem>.csv` and `<output_dir>/<stem>.sql`
#[derive(Debug, Clone)]
pub struct Catalog {
    input_dir: PathBuf,
    output_dir: PathBuf,
}

impl Catalog {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    pub fn from_config(config: &ConverterConfig) -> Self {
        Self::new(&config.input_dir, &config.output_dir)
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn entry(&self, dataset: Dataset) -> CatalogEntry {
        let stem = dataset.file_stem();
        CatalogEntry {
            dataset,
            input: self.input_dir.join(format!("{}.{}", stem, INPUT_EXTENSION)),
            output: self.output_dir.join(format!("{}.{}", stem, OUTPUT_EXTENSION)),
        }
    }

    /// Entries in processing order
    pub fn entries(&self) -> Vec<CatalogEntry> {
        Dataset::ALL.iter().map(|d| self.entry(*d)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_paths() {
        let catalog = Catalog::new("in", "out");
        let entry = catalog.entry(Dataset::IncomeRanges);

        assert_eq!(entry.input, PathBuf::from("in/5-intervalo-renda.csv"));
        assert_eq!(entry.output, PathBuf::from("out/5-intervalo-renda.sql"));
    }

    #[test]
    fn test_entries_follow_processing_order() {
        let catalog = Catalog::from_config(&ConverterConfig::default());
        let datasets: Vec<Dataset> = catalog.entries().iter().map(|e| e.dataset).collect();

        assert_eq!(datasets, Dataset::ALL.to_vec());
        assert_eq!(catalog.input_dir(), Path::new("input"));
    }
}
