//! # Reference Data Loading
//!
//! This module loads the product-level CSV exports into SQLite. It includes
//! logic to "sniff" simple column types so numeric metrics stay numeric.
//! Loading replaces each table wholesale, so a re-run always reflects the
//! latest files on disk.

use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};
use turso::{Connection, Database, Value as TursoValue};

/// The reference tables and the CSV files they are loaded from.
pub const REFERENCE_TABLES: [(&str, &str); 3] = [
    ("ad_sales", "Product-Level Ad Sales and Metrics.csv"),
    ("total_sales", "Product-Level Total Sales and Metrics.csv"),
    ("eligibility", "Product-Level Eligibility.csv"),
];

/// Custom error types for the CSV loading process.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Database error: {0}")]
    Database(#[from] turso::Error),
    #[error("Failed to read CSV file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse CSV: {0}")]
    Parse(#[from] csv::Error),
    #[error("No data to load from '{0}'.")]
    NoData(String),
    #[error("Reference file not found: {0}")]
    MissingFile(String),
    #[error("Failed to get database connection: {0}")]
    Connection(String),
}

/// Loads all three reference CSV files from `data_dir` into the database.
///
/// Returns the table names with their loaded row counts. Fails before
/// touching the database if any of the expected files is missing.
pub async fn load_reference_data(
    db: &Database,
    data_dir: &Path,
) -> Result<Vec<(String, usize)>, IngestError> {
    for (_, file_name) in REFERENCE_TABLES {
        let csv_path = data_dir.join(file_name);
        if !csv_path.exists() {
            return Err(IngestError::MissingFile(csv_path.display().to_string()));
        }
    }

    let mut loaded = Vec::with_capacity(REFERENCE_TABLES.len());
    for (table_name, file_name) in REFERENCE_TABLES {
        let count = load_csv_file(db, table_name, &data_dir.join(file_name)).await?;
        loaded.push((table_name.to_string(), count));
    }
    Ok(loaded)
}

/// Parses one CSV file and loads it into `table_name`, replacing any
/// previous contents of that table.
pub async fn load_csv_file(
    db: &Database,
    table_name: &str,
    csv_path: &Path,
) -> Result<usize, IngestError> {
    let conn = db
        .connect()
        .map_err(|e| IngestError::Connection(e.to_string()))?;

    info!("Loading '{table_name}' from: {}", csv_path.display());
    let csv_data = std::fs::read_to_string(csv_path)?;

    let mut reader = csv::Reader::from_reader(csv_data.as_bytes());
    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(IngestError::NoData(csv_path.display().to_string()));
    }

    // Collect all records to analyze the first row for types
    let records: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>()?;
    if records.is_empty() {
        return Err(IngestError::NoData(csv_path.display().to_string()));
    }

    // Sanitize headers for column names
    let sanitized_headers: Vec<String> = headers
        .iter()
        .map(|h| {
            h.trim()
                .to_lowercase()
                .replace(' ', "_")
                .replace(|c: char| !c.is_alphanumeric() && c != '_', "")
        })
        .collect();

    let column_types = sniff_column_types(&records[0]);
    replace_table(&conn, table_name, &sanitized_headers, &column_types).await?;

    conn.execute("BEGIN TRANSACTION", ()).await?;
    let mut insert_count = 0;

    let columns = sanitized_headers.join(", ");
    let values_placeholders = (0..sanitized_headers.len())
        .map(|_| "?")
        .collect::<Vec<_>>()
        .join(", ");
    let insert_sql =
        format!("INSERT INTO {table_name} ({columns}) VALUES ({values_placeholders})");
    let mut stmt = conn.prepare(&insert_sql).await?;

    for record in records {
        let params: Vec<TursoValue> = record
            .iter()
            .zip(column_types.iter())
            .map(|(field, column_type)| typed_value(field, column_type))
            .collect();

        match stmt.execute(params).await {
            Ok(changes) => {
                if changes > 0 {
                    insert_count += 1;
                }
            }
            Err(e) => {
                warn!("Failed to insert row: {e:?}. Rolling back transaction.");
                conn.execute("ROLLBACK", ()).await?;
                return Err(IngestError::Database(e));
            }
        }
    }

    conn.execute("COMMIT", ()).await?;
    info!("Transaction committed. Loaded {insert_count} rows into '{table_name}'.");

    Ok(insert_count)
}

/// Analyzes the first row of data to infer SQLite column types.
///
/// Dates stay TEXT: the exports use ISO `YYYY-MM-DD` strings, which sort
/// and compare correctly as text in SQLite.
fn sniff_column_types(first_record: &csv::StringRecord) -> Vec<String> {
    first_record
        .iter()
        .map(|field| {
            if field.parse::<i64>().is_ok() {
                return "INTEGER".to_string();
            }
            if field.parse::<f64>().is_ok() {
                return "REAL".to_string();
            }
            "TEXT".to_string()
        })
        .collect()
}

/// Converts one CSV field into a typed value for insertion.
///
/// Empty fields become NULL. A field that no longer matches its sniffed
/// column type falls back to text and lets SQLite's affinity rules decide.
fn typed_value(field: &str, column_type: &str) -> TursoValue {
    if field.is_empty() {
        return TursoValue::Null;
    }
    match column_type {
        "INTEGER" => field
            .parse::<i64>()
            .map(TursoValue::Integer)
            .unwrap_or_else(|_| TursoValue::Text(field.to_string())),
        "REAL" => field
            .parse::<f64>()
            .map(TursoValue::Real)
            .unwrap_or_else(|_| TursoValue::Text(field.to_string())),
        _ => TursoValue::Text(field.to_string()),
    }
}

/// Drops and re-creates a table with simple column types.
async fn replace_table(
    conn: &Connection,
    table_name: &str,
    headers: &[String],
    column_types: &[String],
) -> Result<(), turso::Error> {
    conn.execute(&format!("DROP TABLE IF EXISTS {table_name}"), ())
        .await?;

    let columns_def = headers
        .iter()
        .zip(column_types.iter())
        .map(|(h, t)| format!("\"{h}\" {t}"))
        .collect::<Vec<_>>()
        .join(", ");

    let create_sql = format!("CREATE TABLE {table_name} ({columns_def});");
    info!("Executing CREATE TABLE statement: {create_sql}");
    conn.execute(&create_sql, ()).await?;
    Ok(())
}
