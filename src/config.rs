//! Converter configuration.
//!
//! Values resolve with precedence CLI flag > environment variable > YAML
//! config file > built-in default. The CLI layer applies its own overrides
//! after `load`.
//!
//! ```yaml
//! input_dir: data/input
//! output_dir: data/output
//! delimiter: ","
//! line_ending: cr
//! bcrypt_cost: 10
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::decoder::DecoderOptions;

pub const ENV_INPUT_DIR: &str = "SQLSEED_INPUT_DIR";
pub const ENV_OUTPUT_DIR: &str = "SQLSEED_OUTPUT_DIR";
pub const ENV_BCRYPT_COST: &str = "SQLSEED_BCRYPT_COST";

/// Terminator written after every statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    #[default]
    Cr,
    Lf,
    Crlf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Cr => "\r",
            LineEnding::Lf => "\n",
            LineEnding::Crlf => "\r\n",
        }
    }
}

impl std::str::FromStr for LineEnding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cr" => Ok(LineEnding::Cr),
            "lf" => Ok(LineEnding::Lf),
            "crlf" => Ok(LineEnding::Crlf),
            other => Err(format!(
                "Unsupported line ending: '{}'. Supported: cr, lf, crlf",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterConfig {
    /// Directory holding the `<stem>.csv` extracts
    pub input_dir: PathBuf,
    /// Directory receiving the `<stem>.sql` scripts
    pub output_dir: PathBuf,
    pub delimiter: char,
    pub line_ending: LineEnding,
    pub bcrypt_cost: u32,
    pub read_buffer_bytes: usize,
    pub write_buffer_bytes: usize,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input"),
            output_dir: PathBuf::from("output"),
            delimiter: ',',
            line_ending: LineEnding::Cr,
            bcrypt_cost: 10,
            read_buffer_bytes: 64 * 1024,
            write_buffer_bytes: 64 * 1024,
        }
    }
}

impl ConverterConfig {
    /// Load configuration from a YAML file.
    ///
    /// Keys missing from the file keep their defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();

        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;

        Self::from_yaml_str(&contents)
            .map_err(|e| format!("Invalid config file {}: {}", path.display(), e))
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, String> {
        // An empty document deserializes as null, not as an empty mapping.
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Self =
            serde_yaml::from_str(contents).map_err(|e| format!("Failed to parse YAML: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an optional file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, String> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from `lookup` (normally the process environment).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), String>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_INPUT_DIR) {
            tracing::debug!("Using input directory from {}: {}", ENV_INPUT_DIR, dir);
            self.input_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(ENV_OUTPUT_DIR) {
            tracing::debug!("Using output directory from {}: {}", ENV_OUTPUT_DIR, dir);
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(cost) = lookup(ENV_BCRYPT_COST) {
            self.bcrypt_cost = cost
                .trim()
                .parse()
                .map_err(|_| format!("{} must be an integer, got '{}'", ENV_BCRYPT_COST, cost))?;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.delimiter.is_ascii() || self.delimiter == '"' || self.delimiter == '\n' {
            return Err(format!(
                "Delimiter must be a single ASCII character other than quote or newline, got {:?}",
                self.delimiter
            ));
        }
        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(format!(
                "bcrypt_cost must be between 4 and 31, got {}",
                self.bcrypt_cost
            ));
        }
        if self.read_buffer_bytes == 0 || self.write_buffer_bytes == 0 {
            return Err("Buffer sizes must be greater than zero".to_string());
        }
        Ok(())
    }

    pub fn decoder_options(&self) -> DecoderOptions {
        DecoderOptions {
            delimiter: self.delimiter as u8,
            buffer_capacity: self.read_buffer_bytes,
        }
    }
}
