//! # Application State
//!
//! This module defines the shared application state (`AppState`) and the logic
//! for building it at startup. The `AppState` holds all shared resources, such
//! as the configuration, the question-answering agent, and the database provider,
//! making them accessible to all request handlers.

use crate::config::AppConfig;
use shoptalk::{
    ingest::load_reference_data,
    providers::{
        ai::{gemini::GeminiProvider, local::LocalAiProvider, AiProvider},
        db::sqlite::SqliteProvider,
    },
    AgentClient, AgentClientBuilder,
};
use std::{path::Path, sync::Arc, time::Duration};
use tracing::{info, warn};

/// The shared application state, accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration, loaded from `config.yml`.
    pub config: Arc<AppConfig>,
    /// The question-answering agent shared by all `/ask` requests.
    pub agent: Arc<AgentClient>,
    /// The primary database provider, kept around for data loading and tests.
    pub sqlite_provider: Arc<SqliteProvider>,
}

/// Builds the shared application state from the configuration.
///
/// This function initializes all necessary services:
/// - It instantiates the configured AI provider client.
/// - It sets up the connection to the SQLite database.
/// - It loads the reference CSV exports when `data_dir` is configured.
pub async fn build_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let request_timeout = Duration::from_secs(config.ai.request_timeout_secs);
    let ai_provider: Box<dyn AiProvider> = match config.ai.provider.as_str() {
        "gemini" => {
            let api_key = config
                .ai
                .api_key
                .clone()
                .ok_or_else(|| anyhow::anyhow!("AI_API_KEY is required for the gemini provider"))?;
            // If api_url is not provided in config, construct it from the model name.
            let api_url = config.ai.api_url.clone().unwrap_or_else(|| {
                format!(
                    "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
                    config.ai.model_name
                )
            });
            Box::new(GeminiProvider::new(api_url, api_key)?.with_request_timeout(request_timeout))
        }
        "local" => {
            // For local providers, the URL is always required.
            let api_url = config
                .ai
                .api_url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("ai.api_url is required for the local provider"))?;
            Box::new(
                LocalAiProvider::new(
                    api_url,
                    config.ai.api_key.clone(),
                    Some(config.ai.model_name.clone()),
                )?
                .with_request_timeout(request_timeout),
            )
        }
        other => {
            return Err(anyhow::anyhow!("Unsupported AI provider: {other}"));
        }
    };

    // The database file may live in a directory that does not exist yet.
    if let Some(parent) = Path::new(&config.db_url).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let sqlite_provider = SqliteProvider::new(&config.db_url).await?;
    info!(db_path = %config.db_url, "Initialized local storage provider (SQLite).");

    // Load the reference CSVs when a data directory is configured. A failed
    // load leaves any previously loaded tables untouched, so the server can
    // still start and answer questions against the existing data.
    if let Some(data_dir) = &config.data_dir {
        match load_reference_data(&sqlite_provider.db, Path::new(data_dir)).await {
            Ok(tables) => {
                for (table, rows) in tables {
                    info!("Loaded {rows} rows into '{table}'.");
                }
            }
            Err(e) => warn!("Reference data load from '{data_dir}' failed: {e}"),
        }
    }

    let agent = AgentClientBuilder::new()
        .ai_provider(ai_provider)
        .storage_provider(Box::new(sqlite_provider.clone()))
        .build()?;

    Ok(AppState {
        config: Arc::new(config),
        agent: Arc::new(agent),
        sqlite_provider: Arc::new(sqlite_provider),
    })
}
