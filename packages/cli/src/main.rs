#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the QOF practice geocoding pipeline.
//!
//! Builds the GP practice contact list from the NHS extracts, geocodes it
//! against the Google Geocoding API, and back-fills coordinates that an
//! earlier run left empty.
//!
//! Settings come from a `.env` file when present (`GOOGLE_MAPS_API_KEY`,
//! `TARGET_DIRECTORY`), then the environment, then flags.

mod pipeline;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use qof_map_database::paths;

#[derive(Parser)]
#[command(name = "qof_map", about = "GP practice geocoding pipeline")]
struct Cli {
    /// Directory for pipeline artifacts (defaults to the project `data/`)
    #[arg(long, global = true, env = "TARGET_DIRECTORY")]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the practice contact list (with short and long addresses)
    Contacts {
        /// ODS `epraccur` practice extract (headerless CSV)
        #[arg(long)]
        address_csv: PathBuf,
        /// QOF practice mapping CSV (`practice_code`, `practice_name`)
        #[arg(long)]
        gp_list_csv: PathBuf,
        /// Output parquet (default: `<dir>/GP_contact_info.parquet`)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Geocode every practice in the contact list
    Geocode {
        /// Contact list parquet (default: `<dir>/GP_contact_info.parquet`)
        #[arg(long)]
        input: Option<PathBuf>,
        /// Output parquet (default: `<dir>/practice_coordinates.parquet`)
        #[arg(long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        tuning: GeocodeArgs,
    },
    /// Geocode only practices whose `lat`/`lon` are missing in `target`
    FillMissing {
        /// Practice table parquet with `lat`/`lon` columns
        target: PathBuf,
        /// Output parquet (default: `<target stem>_new.parquet`)
        #[arg(long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        tuning: GeocodeArgs,
    },
}

/// Flags shared by the geocoding commands.
#[derive(Args)]
struct GeocodeArgs {
    /// Google Geocoding API key
    #[arg(long, env = "GOOGLE_MAPS_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    /// Maximum simultaneous lookups in the concurrent phase
    #[arg(long)]
    concurrency: Option<usize>,
    /// Attempts per address form before giving up
    #[arg(long)]
    retries: Option<u32>,
}

impl GeocodeArgs {
    fn settings(self) -> Result<pipeline::GeocodeSettings, Box<dyn std::error::Error>> {
        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or("GOOGLE_MAPS_API_KEY is not set (use --api-key or a .env file)")?;
        Ok(pipeline::GeocodeSettings {
            api_key,
            concurrency: self.concurrency,
            retries: self.retries,
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Must run before parsing so `env = ...` flags see `.env` values.
    dotenvy::dotenv().ok();
    let multi = qof_map_cli_utils::init_logger();
    let cli = Cli::parse();

    let dir = cli.dir.unwrap_or_else(paths::data_dir);
    let start = Instant::now();

    match cli.command {
        Commands::Contacts {
            address_csv,
            gp_list_csv,
            output,
        } => {
            let output = output.unwrap_or_else(|| paths::contact_info_path(&dir));
            pipeline::build_contacts(&address_csv, &gp_list_csv, &output)?;
        }
        Commands::Geocode {
            input,
            output,
            tuning,
        } => {
            let input = input.unwrap_or_else(|| paths::contact_info_path(&dir));
            let output = output.unwrap_or_else(|| paths::coordinates_path(&dir));
            pipeline::geocode(&multi, &tuning.settings()?, &input, &output).await?;
        }
        Commands::FillMissing {
            target,
            output,
            tuning,
        } => {
            let output = output.unwrap_or_else(|| paths::with_stem_suffix(&target, "_new"));
            pipeline::fill_missing(&multi, &tuning.settings()?, &target, &output).await?;
        }
    }

    log::info!("Done in {:.1}s", start.elapsed().as_secs_f64());

    Ok(())
}
