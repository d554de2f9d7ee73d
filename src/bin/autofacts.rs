//! autofacts CLI
//!
//! Batch entry points over the vehicle reference collections:
//! - inject a catalog of candidate models into all four collections
//! - backfill `mileage_logic_text` from a lookup table
//! - verify cross-collection integrity

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use autofacts_core::dataset::backfill::SparseFieldBackfill;
use autofacts_core::dataset::verify;
use autofacts_core::{
    BackfillOptions, CandidateCatalog, CollectionStore, DEFAULT_CONFIG_FILE, DatasetConfig,
    InjectOptions, MileageLogicTable, SynchronizedInserter,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "autofacts")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Synchronized insert, backfill and integrity checks for the vehicle dataset")]
#[command(long_about = "autofacts - vehicle reference dataset maintenance\n\n\
    Collection files are located through a TOML config (default: ./autofacts.toml)\n\
    or a data directory holding the standard file names.\n\n\
    Examples:\n\
      autofacts --data-dir src/main/resources/data inject --catalog batch7.json\n\
      autofacts --config autofacts.toml backfill --table mileage_logic.json --dry-run\n\
      autofacts verify")]
struct Cli {
    /// TOML config mapping collections to files
    #[arg(long, value_name = "FILE", env = "AUTOFACTS_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Directory holding the standard collection files
    #[arg(
        long,
        value_name = "DIR",
        env = "AUTOFACTS_DATA_DIR",
        global = true,
        conflicts_with = "config"
    )]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Insert new candidate models into all four collections
    Inject {
        /// JSON array of {model_def, market, reliability, faults} candidates
        #[arg(short, long, value_name = "FILE")]
        catalog: PathBuf,

        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Fill missing mileage_logic_text on reliability records
    Backfill {
        /// JSON object of model_id -> {mileage -> advice}
        #[arg(short, long, value_name = "FILE")]
        table: PathBuf,

        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Check cross-collection integrity (read-only)
    Verify,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("autofacts=info,autofacts_core=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match execute(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli) -> Result<ExitCode> {
    let config = resolve_config(cli.config.as_deref(), cli.data_dir)?;
    let store = CollectionStore::new(config.resolve());

    match cli.command {
        Commands::Inject { catalog, dry_run } => {
            let catalog = CandidateCatalog::load(&catalog)
                .with_context(|| format!("reading catalog {}", catalog.display()))?;
            let report = SynchronizedInserter::with_options(&store, InjectOptions { dry_run })
                .run(&catalog)?;
            print!("{}", report.to_text());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Backfill { table, dry_run } => {
            let table = MileageLogicTable::load(&table)
                .with_context(|| format!("reading lookup table {}", table.display()))?;
            let report = SparseFieldBackfill::with_options(&store, BackfillOptions { dry_run })
                .run(&table)?;
            print!("{}", report.to_text());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Verify => {
            let report = verify::verify(&store)?;
            print!("{}", report.to_text());
            Ok(if report.error_count() == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

/// Explicit config, then explicit data dir, then `./autofacts.toml`, then the working directory.
fn resolve_config(config: Option<&Path>, data_dir: Option<PathBuf>) -> Result<DatasetConfig> {
    if let Some(path) = config {
        return DatasetConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()));
    }
    if let Some(dir) = data_dir {
        return Ok(DatasetConfig::for_data_dir(dir));
    }
    let default = Path::new(DEFAULT_CONFIG_FILE);
    if default.is_file() {
        return DatasetConfig::load(default)
            .with_context(|| format!("loading config {}", default.display()));
    }
    Ok(DatasetConfig::for_data_dir("."))
}
