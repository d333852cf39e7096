//! Dataset orchestration.
//!
//! Each dataset flows decoder → mapper → renderer → sink one record at a
//! time: the next record is not read until the previous statement has been
//! handed to the (bounded) sink buffer, so decoding never runs ahead of
//! writing. Datasets run strictly one after another; identity tables filled
//! by one dataset are read by later ones.

use chrono::Utc;
use serde::Serialize;
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufWriter};

use crate::capability::Capabilities;
use crate::catalog::Catalog;
use crate::config::{ConverterConfig, LineEnding};
use crate::dataset::Dataset;
use crate::decoder::{DecoderOptions, RecordDecoder};
use crate::error::{PipelineError, PipelineResult};
use crate::identity::IdentityTables;
use crate::mappers::map_record;
use crate::report::{DatasetReport, RunReport};

/// Lifecycle of one dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetState {
    Idle,
    Decoding,
    Mapping,
    Rendering,
    Writing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    pub decoder: DecoderOptions,
    pub line_ending: LineEnding,
    pub write_buffer_bytes: usize,
}

impl PipelineOptions {
    pub fn from_config(config: &ConverterConfig) -> Self {
        Self {
            decoder: config.decoder_options(),
            line_ending: config.line_ending,
            write_buffer_bytes: config.write_buffer_bytes,
        }
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::from_config(&ConverterConfig::default())
    }
}

/// Per-dataset progress
#[derive(Debug)]
struct Progress {
    dataset: Dataset,
    state: DatasetState,
    /// 1-based index of the record currently in flight
    position: u64,
    records_read: u64,
    records_skipped: u64,
    statements_written: u64,
}

impl Progress {
    fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            state: DatasetState::Idle,
            position: 0,
            records_read: 0,
            records_skipped: 0,
            statements_written: 0,
        }
    }

    fn transition(&mut self, next: DatasetState) {
        tracing::trace!(
            dataset = %self.dataset,
            record = self.position,
            "{:?} -> {:?}",
            self.state,
            next
        );
        self.state = next;
    }
}

/// Drives datasets through the conversion pipeline.
///
/// The pipeline owns the run's identity tables, so one `Pipeline` value is
/// one run.
pub struct Pipeline {
    caps: Capabilities,
    options: PipelineOptions,
    tables: IdentityTables,
}

impl Pipeline {
    pub fn new(caps: Capabilities, options: PipelineOptions) -> Self {
        Self {
            caps,
            options,
            tables: IdentityTables::new(),
        }
    }

    pub fn tables(&self) -> &IdentityTables {
        &self.tables
    }

    /// Convert a single dataset from `input` into `output`.
    ///
    /// The sink is flushed and shut down before this returns. Any failure
    /// stops the dataset immediately; whatever was already written stays in
    /// the sink and may end mid-statement.
    pub async fn run_dataset<R, W>(
        &mut self,
        dataset: Dataset,
        input: R,
        output: W,
    ) -> PipelineResult<DatasetReport>
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin,
    {
        let started = Instant::now();
        let mut progress = Progress::new(dataset);
        tracing::info!(dataset = %dataset, table = dataset.table(), "Processing dataset");

        match self.process(&mut progress, input, output).await {
            Ok(()) => {
                progress.transition(DatasetState::Completed);
                let report = DatasetReport {
                    dataset,
                    table: dataset.table(),
                    state: progress.state,
                    records_read: progress.records_read,
                    records_skipped: progress.records_skipped,
                    statements_written: progress.statements_written,
                    elapsed_ms: started.elapsed().as_millis() as u64,
                };
                tracing::info!(
                    dataset = %dataset,
                    read = report.records_read,
                    skipped = report.records_skipped,
                    written = report.statements_written,
                    elapsed_ms = report.elapsed_ms,
                    "Dataset completed"
                );
                Ok(report)
            }
            Err(err) => {
                progress.transition(DatasetState::Failed);
                Err(PipelineError::Dataset {
                    dataset,
                    record: progress.position,
                    source: Box::new(err),
                })
            }
        }
    }

    async fn process<R, W>(&mut self, progress: &mut Progress, input: R, output: W) -> PipelineResult<()>
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin,
    {
        let dataset = progress.dataset;
        let terminator = self.options.line_ending.as_str().as_bytes();
        let mut decoder = RecordDecoder::new(input, self.options.decoder);
        let mut sink = BufWriter::with_capacity(self.options.write_buffer_bytes, output);

        loop {
            progress.position = progress.records_read + 1;
            progress.transition(DatasetState::Decoding);
            let record = match decoder.next_record().await? {
                Some(record) => record,
                None => break,
            };
            progress.records_read += 1;

            progress.transition(DatasetState::Mapping);
            let template = match map_record(dataset, &record, &mut self.tables, &self.caps).await? {
                Some(template) => template,
                None => {
                    progress.records_skipped += 1;
                    continue;
                }
            };

            progress.transition(DatasetState::Rendering);
            let statement = template.render()?;

            progress.transition(DatasetState::Writing);
            sink.write_all(statement.as_bytes())
                .await
                .map_err(PipelineError::SinkWrite)?;
            sink.write_all(terminator)
                .await
                .map_err(PipelineError::SinkWrite)?;
            progress.statements_written += 1;
        }

        sink.flush().await.map_err(PipelineError::SinkWrite)?;
        sink.shutdown().await.map_err(PipelineError::SinkWrite)?;
        Ok(())
    }

    /// Convert every dataset of `catalog` in processing order.
    ///
    /// Stops at the first failing dataset; later datasets are not opened.
    pub async fn run_catalog(&mut self, catalog: &Catalog) -> PipelineResult<RunReport> {
        let mut report = RunReport::new(Utc::now());

        tokio::fs::create_dir_all(catalog.output_dir())
            .await
            .map_err(|source| PipelineError::SourceOpen {
                path: catalog.output_dir().display().to_string(),
                source,
            })?;

        for entry in catalog.entries() {
            let (input, output) = open_entry(&entry.input, &entry.output)
                .await
                .map_err(|err| PipelineError::Dataset {
                    dataset: entry.dataset,
                    record: 0,
                    source: Box::new(err),
                })?;

            let dataset_report = self.run_dataset(entry.dataset, input, output).await?;
            report.datasets.push(dataset_report);
        }

        report.finish(&self.tables);
        tracing::info!(
            datasets = report.datasets.len(),
            statements = report.statements_written(),
            states = report.identities.states,
            cities = report.identities.cities,
            "Run completed"
        );
        Ok(report)
    }
}

async fn open_entry(
    input: &std::path::Path,
    output: &std::path::Path,
) -> PipelineResult<(tokio::fs::File, tokio::fs::File)> {
    let source = tokio::fs::File::open(input)
        .await
        .map_err(|source| PipelineError::SourceOpen {
            path: input.display().to_string(),
            source,
        })?;
    let sink = tokio::fs::File::create(output)
        .await
        .map_err(|source| PipelineError::SourceOpen {
            path: output.display().to_string(),
            source,
        })?;
    Ok((source, sink))
}
