use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use listing_prep::prepare::Enrichers;
use listing_prep::{ArchiveSource, SUPPORTED_CITIES};
use rental_insights::runner::{forecast_file, prepare_to_file, run_city};
use rental_insights::{init_tracing, load_config, AppConfig};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "rental_insights")]
#[command(about = "Prepare short-term rental exports and forecast neighbourhood prices", long_about = None)]
struct Cli {
    /// Configuration file layered over config/default.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the extracted city exports
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Directory receiving the output tables
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prepare and forecast one or more cities
    Forecast {
        /// City to process; repeat for several, defaults to the configured cities
        #[arg(long)]
        city: Vec<String>,

        /// Process groups on a single thread
        #[arg(long)]
        sequential: bool,
    },

    /// Only prepare the merged table of a city
    Prepare {
        #[arg(long)]
        city: String,
    },

    /// Forecast an existing table
    ForecastFile {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// List supported cities
    Cities,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref()).context("loading configuration")?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    init_tracing(&config.log_level, config.log_json);

    match cli.command {
        Commands::Forecast { city, sequential } => {
            if sequential {
                config.forecast.parallel = false;
            }
            forecast_cities(&config, city)
        }
        Commands::Prepare { city } => {
            let source = ArchiveSource::new(&config.data_dir, config.prep.parts);
            let (path, rows) = prepare_to_file(&config, &source, &city, &Enrichers::default())
                .with_context(|| format!("preparing {}", city))?;
            println!("{}: {} rows -> {}", city, rows, path.display());
            Ok(())
        }
        Commands::ForecastFile { input, output } => {
            let run = forecast_file(&config, &input, &output)
                .with_context(|| format!("forecasting {}", input.display()))?;
            println!(
                "{} rows ({} groups forecast, {} skipped) -> {}",
                run.frame.height(),
                run.forecasted_groups(),
                run.skipped_groups(),
                output.display()
            );
            Ok(())
        }
        Commands::Cities => {
            for city in SUPPORTED_CITIES {
                println!("{}", city);
            }
            Ok(())
        }
    }
}

fn forecast_cities(config: &AppConfig, cities: Vec<String>) -> anyhow::Result<()> {
    let cities = if cities.is_empty() {
        config.cities.clone()
    } else {
        cities
    };
    if cities.is_empty() {
        bail!("no city given; pass --city or set `cities` in the configuration");
    }

    let source = ArchiveSource::new(&config.data_dir, config.prep.parts);
    let mut failures = 0;
    for city in &cities {
        match run_city(config, &source, city, &Enrichers::default()) {
            Ok(report) => println!("{}", serde_json::to_string(&report)?),
            Err(err) => {
                error!(city = %city, error = %err, "city failed");
                failures += 1;
            }
        }
    }

    info!(cities = cities.len(), failures, "run finished");
    if failures > 0 {
        bail!("{} of {} cities failed", failures, cities.len());
    }
    Ok(())
}
