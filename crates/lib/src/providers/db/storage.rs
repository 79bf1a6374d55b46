use crate::errors::AgentError;
use async_trait::async_trait;
use dyn_clone::DynClone;
use serde_json::Value;
use std::fmt::Debug;

/// A trait for interacting with a storage backend.
///
/// This trait defines a common interface for executing queries and
/// describing schema information, so the agent pipeline never depends on a
/// concrete database.
#[async_trait]
pub trait Storage: Send + Sync + DynClone + Debug {
    /// Returns the name of the storage provider (e.g., "SQLite").
    fn name(&self) -> &str;

    /// Lists the user-visible tables, excluding any engine-internal ones.
    async fn list_tables(&self) -> Result<Vec<String>, AgentError>;

    /// Renders the live schema as plain text suitable for a model prompt.
    ///
    /// The description is regenerated on every call so that tables created
    /// or replaced since the previous request are always visible.
    async fn describe_schema(&self) -> Result<String, AgentError>;

    /// Executes a read-only SQL query and returns one JSON object per row.
    ///
    /// An empty result set is `Ok(vec![])`, never an error.
    async fn execute_query(&self, query: &str) -> Result<Vec<Value>, AgentError>;
}

dyn_clone::clone_trait_object!(Storage);
