use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "Hourly electricity demand forecasting pipeline", long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a demand indicator from the ESIOS API into the raw store
    Fetch {
        /// ESIOS indicator id (1293 is realized demand)
        #[arg(long, default_value_t = 1293)]
        indicator: u32,

        /// Number of trailing days to request, ending now
        #[arg(long, default_value_t = 21)]
        days: i64,

        /// API token; falls back to the ESIOS_API_KEY env var
        #[arg(long)]
        token: Option<String>,

        /// Local CSV to ingest when the API call fails
        #[arg(long)]
        fallback_csv: Option<PathBuf>,

        /// Root of the data directory layout
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
    },
    /// Normalize the newest raw file onto an hourly grid and build features
    Featurize {
        /// Raw input file; defaults to the newest file in the raw store
        #[arg(long)]
        input: Option<PathBuf>,

        /// JSON pipeline configuration file; defaults apply when omitted
        #[arg(long)]
        config: Option<PathBuf>,

        /// Gap-fill policy override (forward, backward, interpolate, none)
        #[arg(long)]
        fill: Option<String>,

        /// Root of the data directory layout
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
    },
    /// Train a model on the newest feature table and forecast future hours
    Forecast {
        /// Feature table; defaults to the newest features_* file
        #[arg(long)]
        features: Option<PathBuf>,

        /// Raw copy used to anchor the forecast; defaults to the newest raw_* file
        #[arg(long)]
        raw: Option<PathBuf>,

        /// Number of future hours to forecast
        #[arg(long, default_value_t = 6)]
        horizon: usize,

        /// Hours reserved at the end of the series for validation
        #[arg(long, default_value_t = 168)]
        val_hours: i64,

        /// Number of trees in the bagged ensemble
        #[arg(long, default_value_t = 100)]
        trees: usize,

        /// Seed for bootstrap sampling and feature subsets
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Name for the persisted model blob
        #[arg(long, default_value = "demand_forest")]
        model_name: String,

        /// Root of the data directory layout
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
    },
}
