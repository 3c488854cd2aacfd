use std::fs;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use log::info;
use sqlx::PgPool;

mod config;
mod ingest;
mod source;
mod trip;

use config::DbOpts;

/// Load one month of the TLC yellow cab trip export into Postgres.
#[derive(Debug, Parser)]
struct Cli {
    /// Year of the export
    #[arg(long, default_value_t = 2021)]
    year: u16,

    /// Month of the export
    #[arg(long, default_value_t = 1)]
    month: u8,

    #[command(flatten)]
    db: DbOpts,

    /// Rows per write batch
    #[arg(long, default_value_t = 100_000)]
    batch_size: usize,

    /// Destination table, dropped and recreated at the start of the run
    #[arg(long, default_value = "yellow_taxi_data")]
    table: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();
    ensure!(cli.batch_size > 0, "batch size must be positive");

    let pool = PgPool::connect(&cli.db.url())
        .await
        .context("failed to connect to database")?;

    let url = source::dataset_url(cli.year, cli.month);
    info!("downloading {url}");
    let path = source::download(&url).await?;

    let reader = source::open(&path)?;
    ingest::run(&pool, reader, &cli.table, cli.batch_size).await?;

    fs::remove_file(&path).ok();
    Ok(())
}
