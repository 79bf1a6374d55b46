//! # shoptalk loader
//!
//! A small binary that loads the three reference CSV exports into the SQLite
//! database used by the server. Run it once before starting the server, or
//! let the server perform the same load at startup by setting `DATA_DIR`.

use anyhow::Result;
use clap::Parser;
use shoptalk::{ingest::load_reference_data, providers::db::sqlite::SqliteProvider};
use std::path::Path;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about = "Loads the reference CSV exports into SQLite", long_about = None)]
struct Args {
    /// The path to the SQLite database file to load into
    #[arg(long, env = "DB_URL", default_value = "db/shoptalk.db")]
    db_url: String,
    /// The directory containing the reference CSV files
    #[arg(long, env = "DATA_DIR", default_value = "data")]
    data_dir: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    if let Some(parent) = Path::new(&args.db_url).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let provider = SqliteProvider::new(&args.db_url).await?;

    let loaded = load_reference_data(&provider.db, Path::new(&args.data_dir)).await?;
    for (table, rows) in loaded {
        info!("Loaded {rows} rows into '{table}'.");
    }
    info!("Data load complete at '{}'.", args.db_url);

    Ok(())
}
