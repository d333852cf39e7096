//! # sqlseed: CSV extracts to `INSERT IGNORE` seed scripts
//!
//! sqlseed converts a fixed, ordered set of CSV extracts into SQL scripts,
//! one statement per input row, streaming each file from input to output.
//!
//! Later datasets refer to earlier ones by *business key* (a state's `uf`, a
//! city's source id). The pipeline assigns surrogate ids as the owning
//! dataset is converted and resolves the references from those ids, which is
//! why datasets always run in the order given by [`Dataset::ALL`].
//!
//! ## Example
//!
//! ```no_run
//! use sqlseed::{Capabilities, Catalog, Pipeline, PipelineOptions};
//!
//! # async fn run() -> Result<(), sqlseed::PipelineError> {
//! let mut pipeline = Pipeline::new(Capabilities::default(), PipelineOptions::default());
//! let report = pipeline.run_catalog(&Catalog::new("input", "output")).await?;
//! println!("{} statements written", report.statements_written());
//! # Ok(())
//! # }
//! ```

// Core pipeline
pub mod statement;
pub mod identity;
pub mod decoder;
pub mod mappers;
pub mod pipeline;

// Datasets and where they live
pub mod dataset;
pub mod catalog;

// Capabilities, configuration, errors and reporting
pub mod capability;
pub mod config;
pub mod error;
pub mod report;

// Re-export key types
pub use capability::{BcryptHasher, Capabilities, IdGenerator, PasswordHasher, UuidGenerator};
pub use catalog::{Catalog, CatalogEntry};
pub use config::{ConverterConfig, LineEnding};
pub use dataset::Dataset;
pub use decoder::{DecoderOptions, Record, RecordDecoder};
pub use error::{CapabilityError, PipelineError, PipelineResult};
pub use identity::{EntityKind, IdentityTable, IdentityTables};
pub use pipeline::{DatasetState, Pipeline, PipelineOptions};
pub use report::{DatasetReport, RunReport};
pub use statement::{render, Param, ParamKind, Params, RenderError, StatementTemplate};
