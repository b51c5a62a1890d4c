//! fars - FARS accident summaries & state maps
//!
//! Command-line front end for the `fars` library.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use fars::logging::init_logging;
use fars::{DataProcessor, DatasetLoader, FarsConfig, StateMapper, StaticMapRenderer, Year};

/// Monthly accident summaries and state maps from FARS data files
#[derive(Parser, Debug)]
#[command(name = "fars")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding accident_<year>.csv.bz2 (overrides the config)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print accident counts per month for each year
    Summarize {
        /// Years to include
        #[arg(required = true)]
        years: Vec<Year>,
    },
    /// Draw the accidents of one state and year
    Map {
        /// STATE number
        #[arg(long)]
        state: u32,

        /// Dataset year
        #[arg(long)]
        year: Year,

        /// Output image (default: state_<STATE>_<YEAR>.png)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    init_logging();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => FarsConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => FarsConfig::default(),
    };
    if let Some(data_dir) = cli.data_dir {
        config = config.with_data_dir(data_dir);
    }

    let loader = DatasetLoader::from_config(&config);

    match cli.command {
        Command::Summarize { years } => {
            let table = DataProcessor::summarize_years(&loader, &years)
                .context("Failed to summarize years")?;
            print!("{}", table);
        }
        Command::Map {
            state,
            year,
            output,
        } => {
            let Some(map) = StateMapper::map_state(&loader, state, year)
                .with_context(|| format!("Failed to map STATE {} in {}", state, year))?
            else {
                return Ok(());
            };

            let output =
                output.unwrap_or_else(|| PathBuf::from(format!("state_{}_{}.png", state, year)));
            StaticMapRenderer::save_png(&map, &config.map, &output)
                .with_context(|| format!("Failed to write map: {}", output.display()))?;
            info!(points = map.points().len(), "wrote {}", output.display());
        }
    }

    Ok(())
}
