//! CLI entry point for the churn data-preparation pipeline.

use anyhow::{anyhow, Context, Result};
use churn_prep::{Pipeline, StepDescriptor};
use clap::Parser;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Customer-churn data preparation pipeline",
    long_about = "Cleans a raw customer-churn CSV export into a dataset ready for\n\
                  feature engineering and model training.\n\n\
                  EXAMPLES:\n  \
                  # Default churn cleaning plan\n  \
                  churn-prep -i data/raw/customer_churn_data.csv -o data/processed/cleared.csv\n\n  \
                  # Custom plan document\n  \
                  churn-prep -i raw.csv -o cleaned.csv --plan plans/cleaning.json"
)]
struct Args {
    /// Path to the raw CSV file to process
    #[arg(short, long)]
    input: PathBuf,

    /// Path of the cleaned CSV file to write
    #[arg(short, long)]
    output: PathBuf,

    /// JSON plan file describing the pipeline steps
    ///
    /// If not specified, the default churn cleaning plan is used
    #[arg(short, long)]
    plan: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings and errors)
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
fn init_logging(level: &str, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// The default cleaning plan for the customer-churn export.
///
/// Built explicitly at call time so callers can swap feature lists without
/// touching process-wide state.
fn default_churn_plan(numeric_features: &[&str]) -> Pipeline {
    Pipeline::new(vec![
        StepDescriptor::new("drop_cols").with_kwarg("subset", json!(["Emite boletos.1", "ID"])),
        StepDescriptor::new("rename_cols"),
        StepDescriptor::new("clear_numeric_strings").with_kwarg("subset", json!(numeric_features)),
        StepDescriptor::new("convert_to_numeric").with_kwarg("subset", json!(numeric_features)),
    ])
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.quiet);

    if !args.input.exists() {
        return Err(anyhow!("Input file not found: {}", args.input.display()));
    }

    info!("Loading dataset from: {}", args.input.display());
    let raw_df = load_csv(&args.input)?;
    info!("Dataset loaded: {:?}", raw_df.shape());

    let pipeline = match &args.plan {
        Some(path) => {
            info!("Using pipeline plan: {}", path.display());
            Pipeline::from_path(path)
                .with_context(|| format!("loading plan {}", path.display()))?
        }
        None => {
            info!("Using default churn cleaning plan");
            default_churn_plan(&["receita_mensal", "receita_total"])
        }
    };
    pipeline.validate()?;

    let cleaned = pipeline
        .run(raw_df)
        .context("running the cleaning pipeline")?;
    info!("Pipeline complete: {:?}", cleaned.shape());

    write_csv(cleaned, &args.output)?;
    info!("Cleaned dataset written to: {}", args.output.display());

    Ok(())
}

/// Load a CSV with header and schema inference.
fn load_csv(path: &PathBuf) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.clone()))?
        .finish()
        .map_err(|e| anyhow!("Failed to read {}: {}", path.display(), e))
}

/// Write the cleaned DataFrame as CSV, creating parent directories if needed.
fn write_csv(mut df: DataFrame, path: &PathBuf) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)
        .map_err(|e| anyhow!("Failed to write {}: {}", path.display(), e))
}
