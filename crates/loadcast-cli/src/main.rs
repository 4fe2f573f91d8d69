use clap::Parser;
use tracing::error;
use tracing_subscriber::FmtSubscriber;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let result = match &cli.command {
        Commands::Fetch {
            indicator,
            days,
            token,
            fallback_csv,
            data_dir,
        } => commands::fetch::handle(
            *indicator,
            *days,
            token.clone(),
            fallback_csv.as_deref(),
            data_dir,
        ),
        Commands::Featurize {
            input,
            config,
            fill,
            data_dir,
        } => commands::featurize::handle(
            input.as_deref(),
            config.as_deref(),
            fill.as_deref(),
            data_dir,
        ),
        Commands::Forecast {
            features,
            raw,
            horizon,
            val_hours,
            trees,
            seed,
            model_name,
            data_dir,
        } => commands::forecast::handle(
            features.as_deref(),
            raw.as_deref(),
            *horizon,
            *val_hours,
            *trees,
            *seed,
            model_name,
            data_dir,
        ),
    };

    if let Err(err) = result {
        error!("{err:#}");
        std::process::exit(1);
    }
}
