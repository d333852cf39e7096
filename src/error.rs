//! Error types for the conversion pipeline.
//!
//! Every failure aborts the dataset being processed; nothing here is
//! recovered locally.

use std::fmt;

use crate::dataset::Dataset;
use crate::identity::EntityKind;
use crate::statement::RenderError;

/// Failure of a pluggable capability (id generation or password hashing).
#[derive(Debug, Clone, PartialEq)]
pub enum CapabilityError {
    IdGeneration(String),
    Hashing(String),
}

impl fmt::Display for CapabilityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityError::IdGeneration(msg) => write!(f, "Id generation failed: {}", msg),
            CapabilityError::Hashing(msg) => write!(f, "Password hashing failed: {}", msg),
        }
    }
}

impl std::error::Error for CapabilityError {}

/// Error type for the whole pipeline
#[derive(Debug)]
pub enum PipelineError {
    /// Malformed input, missing column or a failed read
    Decode {
        line: Option<u64>,
        message: String,
    },
    /// A dependent dataset referenced a business key its owner never introduced
    ReferentialLookup {
        kind: EntityKind,
        key: String,
    },
    Render(RenderError),
    SinkWrite(std::io::Error),
    Capability(CapabilityError),
    SourceOpen {
        path: String,
        source: std::io::Error,
    },
    /// Wraps a failure with the dataset and record at which processing stopped
    Dataset {
        dataset: Dataset,
        record: u64,
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    pub fn decode(line: Option<u64>, message: impl Into<String>) -> Self {
        PipelineError::Decode {
            line,
            message: message.into(),
        }
    }

    /// Strip any `Dataset` wrappers and return the underlying failure.
    pub fn root_cause(&self) -> &PipelineError {
        match self {
            PipelineError::Dataset { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Decode { line: Some(line), message } => {
                write!(f, "Decode error at line {}: {}", line, message)
            }
            PipelineError::Decode { line: None, message } => {
                write!(f, "Decode error: {}", message)
            }
            PipelineError::ReferentialLookup { kind, key } => {
                write!(f, "Referential lookup failed: {} '{}' was never introduced", kind, key)
            }
            PipelineError::Render(e) => write!(f, "Render error: {}", e),
            PipelineError::SinkWrite(e) => write!(f, "Sink write error: {}", e),
            PipelineError::Capability(e) => write!(f, "Capability error: {}", e),
            PipelineError::SourceOpen { path, source } => {
                write!(f, "Failed to open {}: {}", path, source)
            }
            PipelineError::Dataset { dataset, record, source } => {
                write!(f, "Dataset '{}' failed at record {}: {}", dataset, record, source)
            }
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Render(e) => Some(e),
            PipelineError::SinkWrite(e) => Some(e),
            PipelineError::Capability(e) => Some(e),
            PipelineError::SourceOpen { source, .. } => Some(source),
            PipelineError::Dataset { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<RenderError> for PipelineError {
    fn from(err: RenderError) -> Self {
        PipelineError::Render(err)
    }
}

impl From<CapabilityError> for PipelineError {
    fn from(err: CapabilityError) -> Self {
        PipelineError::Capability(err)
    }
}

impl From<csv_async::Error> for PipelineError {
    fn from(err: csv_async::Error) -> Self {
        let line = err.position().map(|pos| pos.line());
        PipelineError::Decode {
            line,
            message: err.to_string(),
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_cause_unwraps_dataset() {
        let err = PipelineError::Dataset {
            dataset: Dataset::Cities,
            record: 3,
            source: Box::new(PipelineError::ReferentialLookup {
                kind: EntityKind::State,
                key: "SP".to_string(),
            }),
        };

        assert!(matches!(
            err.root_cause(),
            PipelineError::ReferentialLookup { key, .. } if key == "SP"
        ));
        assert_eq!(
            err.to_string(),
            "Dataset 'cities' failed at record 3: Referential lookup failed: state 'SP' was never introduced"
        );
    }

    #[test]
    fn test_decode_display() {
        let err = PipelineError::decode(Some(4), "missing column 'uf'");
        assert_eq!(err.to_string(), "Decode error at line 4: missing column 'uf'");

        let err = PipelineError::decode(None, "stream closed");
        assert_eq!(err.to_string(), "Decode error: stream closed");
    }
}
