//! sqlseed CLI - convert CSV extracts into INSERT IGNORE seed scripts

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use sqlseed::{
    BcryptHasher, Capabilities, Catalog, ConverterConfig, LineEnding, Param, ParamKind,
    Params, Pipeline, PipelineOptions, UuidGenerator,
};

#[derive(Parser)]
#[command(name = "sqlseed")]
#[command(version, about = "Convert ordered CSV extracts into INSERT IGNORE seed scripts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert every dataset, in order
    Run {
        /// YAML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory holding the CSV extracts (overrides config and env)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Directory receiving the SQL scripts (overrides config and env)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// bcrypt cost for user passwords
        #[arg(long)]
        bcrypt_cost: Option<u32>,

        /// CSV field delimiter
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Statement terminator (cr, lf, crlf)
        #[arg(long)]
        line_ending: Option<LineEnding>,

        /// Write a JSON run report to this file
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// List datasets in processing order
    Datasets,

    /// Render a single statement template
    Render {
        /// SQL text with :name placeholders
        #[arg(short, long)]
        template: String,

        /// Parameter as name=kind:value (kind is string or number)
        #[arg(short, long = "param")]
        params: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config,
            input,
            output,
            bcrypt_cost,
            delimiter,
            line_ending,
            report,
        } => {
            let overrides = Overrides {
                input,
                output,
                bcrypt_cost,
                delimiter,
                line_ending,
            };
            run(config, overrides, report).await
        }
        Commands::Datasets => {
            list_datasets();
            Ok(())
        }
        Commands::Render { template, params } => render_template(&template, &params),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// CLI flags that take precedence over env and config file
struct Overrides {
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    bcrypt_cost: Option<u32>,
    delimiter: Option<char>,
    line_ending: Option<LineEnding>,
}

impl Overrides {
    fn apply(self, config: &mut ConverterConfig) -> Result<(), String> {
        if let Some(input) = self.input {
            config.input_dir = input;
        }
        if let Some(output) = self.output {
            config.output_dir = output;
        }
        if let Some(cost) = self.bcrypt_cost {
            config.bcrypt_cost = cost;
        }
        if let Some(delimiter) = self.delimiter {
            config.delimiter = delimiter;
        }
        if let Some(line_ending) = self.line_ending {
            config.line_ending = line_ending;
        }
        config.validate()
    }
}

async fn run(
    config_path: Option<PathBuf>,
    overrides: Overrides,
    report_path: Option<PathBuf>,
) -> Result<(), String> {
    let mut config = ConverterConfig::load(config_path.as_deref())?;
    overrides.apply(&mut config)?;

    tracing::info!(
        input = %config.input_dir.display(),
        output = %config.output_dir.display(),
        "Starting conversion"
    );

    let hasher = BcryptHasher::new(config.bcrypt_cost).map_err(|e| e.to_string())?;
    let caps = Capabilities::new(Arc::new(UuidGenerator), Arc::new(hasher));
    let mut pipeline = Pipeline::new(caps, PipelineOptions::from_config(&config));

    let report = pipeline
        .run_catalog(&Catalog::from_config(&config))
        .await
        .map_err(|e| e.to_string())?;

    if let Some(path) = report_path {
        report
            .save(&path)
            .map_err(|e| format!("Failed to write report {}: {}", path.display(), e))?;
        tracing::info!("Report written to {}", path.display());
    }

    Ok(())
}

fn list_datasets() {
    let catalog = Catalog::new("<input>", "<output>");
    for (position, entry) in catalog.entries().iter().enumerate() {
        println!(
            "{}. {:<14} {:<18} -> {}",
            position + 1,
            entry.dataset.name(),
            entry.dataset.file_stem(),
            entry.dataset.table()
        );
    }
}

fn render_template(template: &str, raw_params: &[String]) -> Result<(), String> {
    let mut params = Params::new();
    for raw in raw_params {
        let (name, param) = parse_param(raw)?;
        params.insert(name, param);
    }

    let sql = sqlseed::render(template, &params).map_err(|e| e.to_string())?;
    println!("{}", sql);
    Ok(())
}

/// Parse `name=kind:value`; a value of `null` yields an absent value.
fn parse_param(raw: &str) -> Result<(String, Param), String> {
    let (name, typed) = raw
        .split_once('=')
        .ok_or_else(|| format!("Invalid parameter '{}': expected name=kind:value", raw))?;
    let (kind, value) = typed
        .split_once(':')
        .ok_or_else(|| format!("Invalid parameter '{}': expected name=kind:value", raw))?;

    let kind: ParamKind = kind.parse()?;
    let param = if value == "null" {
        Param::null(kind)
    } else {
        Param {
            kind,
            value: Some(value.to_string()),
        }
    };

    Ok((name.trim_start_matches(':').to_string(), param))
}
