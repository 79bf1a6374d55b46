use thiserror::Error;

/// Custom error types for the agent pipeline.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Failed to build Reqwest client: {0}")]
    ReqwestClientBuild(reqwest::Error),
    #[error("Failed to send request to the AI provider: {0}")]
    AiRequest(reqwest::Error),
    #[error("Failed to deserialize the AI provider response: {0}")]
    AiDeserialization(reqwest::Error),
    #[error("AI provider returned an error: {0}")]
    AiApi(String),
    #[error("AI provider stream failed: {0}")]
    AiStream(String),
    #[error("Failed to connect to storage: {0}")]
    StorageConnection(String),
    #[error("Failed to read the database schema: {0}")]
    SchemaRead(String),
    #[error("Query execution failed: {0}")]
    QueryExecution(String),
    #[error("Failed to serialize result to JSON: {0}")]
    JsonSerialization(#[from] serde_json::Error),
    #[error("API key is missing")]
    MissingApiKey,
    #[error("AI provider is missing")]
    MissingAiProvider,
    #[error("Storage provider is missing")]
    MissingStorageProvider,
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}
