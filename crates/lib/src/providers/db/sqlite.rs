use crate::{errors::AgentError, providers::db::storage::Storage};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt::{self, Debug};
use tracing::debug;
use turso::{Database, Value as TursoValue};

/// A provider for interacting with a local SQLite database using Turso.
///
/// This provider holds a `Database` instance, which manages a connection
/// pool. When cloned, it shares the same underlying database, allowing for
/// concurrent and shared access to the same database file or in-memory
/// instance.
#[derive(Clone)]
pub struct SqliteProvider {
    /// The Turso database instance. It's cloneable and thread-safe.
    pub db: Database,
}

impl SqliteProvider {
    /// Creates a new `SqliteProvider` from a file path or in-memory.
    ///
    /// # Arguments
    ///
    /// * `db_path`: The path to the SQLite database file. Use ":memory:" for
    ///   a unique, isolated in-memory database. To share an in-memory
    ///   database across multiple `SqliteProvider` instances (e.g., in
    ///   tests), create one provider and then `.clone()` it.
    pub async fn new(db_path: &str) -> Result<Self, AgentError> {
        let db = turso::Builder::new_local(db_path)
            .build()
            .await
            .map_err(|e| AgentError::StorageConnection(e.to_string()))?;

        // Enable WAL mode for better concurrency on file-based databases.
        // It has no effect on in-memory databases but is safe to run.
        let conn = db
            .connect()
            .map_err(|e| AgentError::StorageConnection(e.to_string()))?;
        // Use `query` for PRAGMA statements that return a value to avoid "unexpected row" errors.
        conn.query("PRAGMA journal_mode=WAL;", ())
            .await
            .map_err(|e| AgentError::StorageConnection(e.to_string()))?;

        Ok(Self { db })
    }

    /// A helper for tests to pre-populate data by executing multiple SQL statements.
    pub async fn initialize_with_data(&self, init_sql: &str) -> Result<(), AgentError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| AgentError::StorageConnection(e.to_string()))?;

        for statement in init_sql.split(';').filter(|s| !s.trim().is_empty()) {
            conn.execute(statement, ())
                .await
                .map_err(|e| AgentError::QueryExecution(e.to_string()))?;
        }
        Ok(())
    }
}

impl Debug for SqliteProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteProvider").finish_non_exhaustive()
    }
}

impl AsRef<Database> for SqliteProvider {
    fn as_ref(&self) -> &Database {
        &self.db
    }
}

/// Converts a Turso value to a serde_json::Value.
fn turso_value_to_json(v: TursoValue) -> Value {
    match v {
        TursoValue::Null => Value::Null,
        TursoValue::Integer(i) => Value::Number(i.into()),
        TursoValue::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        TursoValue::Text(s) => Value::String(s),
        TursoValue::Blob(_) => Value::String("<blob>".to_string()),
    }
}

#[async_trait]
impl Storage for SqliteProvider {
    fn name(&self) -> &str {
        "SQLite"
    }

    async fn list_tables(&self) -> Result<Vec<String>, AgentError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| AgentError::StorageConnection(e.to_string()))?;

        let mut rows = conn
            .query(
                "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%';",
                (),
            )
            .await
            .map_err(|e| AgentError::SchemaRead(e.to_string()))?;

        let mut tables = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| AgentError::SchemaRead(e.to_string()))?
        {
            if let Ok(TursoValue::Text(name)) = row.get_value(0) {
                tables.push(name);
            }
        }
        Ok(tables)
    }

    /// Renders every user table as a `Table '<name>':` block followed by one
    /// indented `<column> (<type>)` line per column.
    ///
    /// There is deliberately no caching here: the loader replaces tables
    /// wholesale, and a stale description would make the model write SQL
    /// against columns that no longer exist.
    async fn describe_schema(&self) -> Result<String, AgentError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| AgentError::StorageConnection(e.to_string()))?;

        let tables = self.list_tables().await?;
        debug!("Describing schema for {} tables.", tables.len());

        let mut blocks = Vec::with_capacity(tables.len());
        for table in tables {
            let mut rows = conn
                .query(&format!("PRAGMA table_info({table});"), ())
                .await
                .map_err(|e| AgentError::SchemaRead(e.to_string()))?;

            let mut lines = vec![format!("Table '{table}':")];
            while let Some(row) = rows
                .next()
                .await
                .map_err(|e| AgentError::SchemaRead(e.to_string()))?
            {
                // PRAGMA table_info columns: cid, name, type, notnull, dflt_value, pk
                if let (Ok(TursoValue::Text(name)), Ok(TursoValue::Text(type_str))) =
                    (row.get_value(1), row.get_value(2))
                {
                    lines.push(format!("  {name} ({type_str})"));
                }
            }
            blocks.push(lines.join("\n"));
        }

        Ok(blocks.join("\n\n"))
    }

    /// Executes a query on SQLite and returns one JSON object per row.
    async fn execute_query(&self, query: &str) -> Result<Vec<Value>, AgentError> {
        debug!(query = %query, "--> Executing SQLite query");

        // Get a new connection for this query.
        let conn = self
            .db
            .connect()
            .map_err(|e| AgentError::StorageConnection(e.to_string()))?;

        let mut stmt = conn
            .prepare(query)
            .await
            .map_err(|e| AgentError::QueryExecution(e.to_string()))?;

        let column_names: Vec<String> = stmt
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let mut rows = stmt
            .query(())
            .await
            .map_err(|e| AgentError::QueryExecution(e.to_string()))?;

        let mut json_results: Vec<Value> = Vec::new();

        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| AgentError::QueryExecution(e.to_string()))?
        {
            let mut row_map = serde_json::Map::new();
            for (i, name) in column_names.iter().enumerate() {
                let value = row
                    .get_value(i)
                    .map_err(|e| AgentError::QueryExecution(e.to_string()))?;
                row_map.insert(name.clone(), turso_value_to_json(value));
            }
            json_results.push(Value::Object(row_map));
        }

        Ok(json_results)
    }
}
