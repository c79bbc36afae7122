use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tax_data::{CurrencyLoader, TaxBracketLoader};
use tax_db_sqlite::SqliteRepository;
use tracing_subscriber::EnvFilter;

/// Load currency and tax bracket data from CSV files into the database.
///
/// The currencies CSV has the columns `code,name,symbol,divisor`.
///
/// The tax brackets CSV has the following columns:
/// - currency: The owning currency code (e.g., NZD)
/// - lower_cents: Inclusive lower bound in minor units
/// - upper_cents: Upper bound in minor units (empty for unlimited)
/// - rate: The marginal tax rate as a decimal (e.g., 0.105)
#[derive(Parser, Debug)]
#[command(name = "tax-data-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the CSV file containing tax bracket data
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Path to a CSV file of currencies, loaded before the brackets
    #[arg(short, long)]
    currencies: Option<PathBuf>,

    /// SQLite database path or URL (created if missing)
    #[arg(short, long, default_value = "taxes.db")]
    database: String,

    /// Run database migrations before loading data
    #[arg(short, long, default_value_t = false)]
    migrate: bool,

    /// Run seed files from the specified directory after migrations
    #[arg(short, long)]
    seeds: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let repo = SqliteRepository::new(&args.database)
        .await
        .with_context(|| format!("Failed to connect to database: {}", args.database))?;

    if args.migrate {
        tracing::info!("running migrations");
        repo.run_migrations()
            .await
            .context("Failed to run migrations")?;
    }

    if let Some(seeds_dir) = &args.seeds {
        tracing::info!(dir = %seeds_dir.display(), "running seeds");
        repo.run_seeds(seeds_dir)
            .await
            .with_context(|| format!("Failed to run seeds from: {}", seeds_dir.display()))?;
    }

    if let Some(path) = &args.currencies {
        let file =
            File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;
        let records = CurrencyLoader::parse(file)
            .with_context(|| format!("Failed to parse CSV: {}", path.display()))?;
        let saved = CurrencyLoader::load(&repo, &records)
            .await
            .context("Failed to load currencies into database")?;
        tracing::info!(saved, file = %path.display(), "loaded currencies");
    }

    if let Some(path) = &args.file {
        let file =
            File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;
        let records = TaxBracketLoader::parse(file)
            .with_context(|| format!("Failed to parse CSV: {}", path.display()))?;
        tracing::info!(records = records.len(), "parsed tax bracket CSV");

        let inserted = TaxBracketLoader::load(&repo, &records)
            .await
            .context("Failed to load tax brackets into database")?;
        tracing::info!(inserted, file = %path.display(), "loaded tax brackets");
    }

    if args.currencies.is_none() && args.file.is_none() && !args.migrate && args.seeds.is_none() {
        tracing::warn!("nothing to do; pass --file, --currencies, --migrate or --seeds");
    }

    Ok(())
}
