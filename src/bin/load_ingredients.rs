//! Loads the ingredient catalog from a `name,unit` CSV file.
//!
//! ```bash
//! # uses DATABASE_URL from the environment or .env
//! cargo run --bin load-ingredients
//!
//! cargo run --bin load-ingredients -- --path other.csv --database-url postgres://...
//! ```

use std::{env, fs};

use anyhow::{Context, Result};
use clap::Parser;
use foodgram_sdk::{actions::seed_ingredients_from_csv, migrate, DEFAULT_INGREDIENTS_PATH};
use log::{info, warn};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "load-ingredients",
    about = "Seed the ingredient catalog from a CSV file"
)]
struct LoadArgs {
    /// CSV file with `name,unit` rows
    #[arg(long, default_value = DEFAULT_INGREDIENTS_PATH)]
    path: String,

    /// Database URL override
    #[arg(long)]
    database_url: Option<String>,

    /// Do not apply pending migrations first
    #[arg(long)]
    skip_migrations: bool,

    /// Enable verbose logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = LoadArgs::parse();
    dotenvy::dotenv().ok();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .init();

    let database_url = args
        .database_url
        .or_else(|| env::var("DATABASE_URL").ok())
        .context("DATABASE_URL is not set and --database-url was not given")?;

    let input = fs::read_to_string(&args.path)
        .with_context(|| format!("Failed to read {}", args.path))?;

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    if !args.skip_migrations {
        migrate(&pool).await?;
    }

    info!("Loading ingredients from {}", args.path);
    let report = seed_ingredients_from_csv(&input, &pool).await?;

    for line in &report.invalid {
        warn!("Line {}: {}", line.line, line.info);
    }
    info!(
        "Done: {} inserted, {} updated, {} duplicates, {} invalid",
        report.inserted,
        report.updated,
        report.duplicates.len(),
        report.invalid.len()
    );

    Ok(())
}
