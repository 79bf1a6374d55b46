#![allow(dead_code)]
//! # Common Test Utilities
//!
//! This module provides shared mock providers so the pipeline tests are
//! isolated and repeatable.

use async_trait::async_trait;
use futures::stream;
use serde_json::Value;
use shoptalk::providers::ai::AiProvider;
use shoptalk::providers::db::storage::Storage;
use shoptalk::{AgentClient, AgentClientBuilder, AgentError, TextStream};
use std::fmt::Debug;
use std::sync::{Arc, Once, RwLock};

static INIT: Once = Once::new();

/// Initializes the tracing subscriber for tests.
pub fn setup_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt::init();
    });
}

// --- Mock AI Provider for Logic Testing ---

#[derive(Clone, Debug, Default)]
pub struct MockAiProvider {
    /// `(system_prompt, user_prompt)` pairs seen by `generate`.
    pub call_history: Arc<RwLock<Vec<(String, String)>>>,
    /// `(system_prompt, user_prompt)` pairs seen by `generate_stream`.
    pub stream_history: Arc<RwLock<Vec<(String, String)>>>,
    /// Scripted `generate` responses, served in order.
    pub responses: Arc<RwLock<Vec<String>>>,
    /// Fragments yielded by every `generate_stream` call.
    pub fragments: Arc<RwLock<Vec<String>>>,
    /// When set, streams end with this error after the scripted fragments.
    pub stream_error: Arc<RwLock<Option<String>>>,
    /// When set, `generate` fails with this message instead of answering.
    pub generate_error: Arc<RwLock<Option<String>>>,
}

impl MockAiProvider {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(RwLock::new(responses.into_iter().rev().collect())),
            ..Self::default()
        }
    }

    pub fn with_fragments(responses: Vec<String>, fragments: Vec<String>) -> Self {
        let provider = Self::new(responses);
        *provider.fragments.write().unwrap() = fragments;
        provider
    }

    pub fn fail_stream_with(self, message: &str) -> Self {
        *self.stream_error.write().unwrap() = Some(message.to_string());
        self
    }

    pub fn fail_generate_with(self, message: &str) -> Self {
        *self.generate_error.write().unwrap() = Some(message.to_string());
        self
    }
}

#[async_trait]
impl AiProvider for MockAiProvider {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, AgentError> {
        self.call_history
            .write()
            .unwrap()
            .push((system_prompt.to_string(), user_prompt.to_string()));

        if let Some(message) = self.generate_error.read().unwrap().clone() {
            return Err(AgentError::AiApi(message));
        }

        if let Some(response) = self.responses.write().unwrap().pop() {
            Ok(response)
        } else {
            Ok("Default mock response".to_string())
        }
    }

    async fn generate_stream(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<TextStream, AgentError> {
        self.stream_history
            .write()
            .unwrap()
            .push((system_prompt.to_string(), user_prompt.to_string()));

        let mut items: Vec<Result<String, AgentError>> = self
            .fragments
            .read()
            .unwrap()
            .iter()
            .cloned()
            .map(Ok)
            .collect();
        if let Some(message) = self.stream_error.read().unwrap().clone() {
            items.push(Err(AgentError::AiStream(message)));
        }
        Ok(Box::pin(stream::iter(items)))
    }
}

// --- Mock Storage Provider for Testing ---

#[derive(Clone, Debug)]
pub struct MockStorage {
    /// The schema description handed to the synthesizer.
    pub schema: Arc<RwLock<String>>,
    /// Rows returned by every `execute_query` call.
    pub rows: Arc<RwLock<Vec<Value>>>,
    /// Every statement that reached `execute_query`.
    pub executed: Arc<RwLock<Vec<String>>>,
    pub query_error: Arc<RwLock<Option<String>>>,
    pub schema_error: Arc<RwLock<Option<String>>>,
}

impl MockStorage {
    pub fn new(schema: &str, rows: Vec<Value>) -> Self {
        Self {
            schema: Arc::new(RwLock::new(schema.to_string())),
            rows: Arc::new(RwLock::new(rows)),
            executed: Arc::new(RwLock::new(Vec::new())),
            query_error: Arc::new(RwLock::new(None)),
            schema_error: Arc::new(RwLock::new(None)),
        }
    }

    pub fn fail_queries_with(self, message: &str) -> Self {
        *self.query_error.write().unwrap() = Some(message.to_string());
        self
    }

    pub fn fail_schema_with(self, message: &str) -> Self {
        *self.schema_error.write().unwrap() = Some(message.to_string());
        self
    }
}

#[async_trait]
impl Storage for MockStorage {
    fn name(&self) -> &str {
        "MockDB"
    }

    async fn list_tables(&self) -> Result<Vec<String>, AgentError> {
        Ok(vec![
            "ad_sales".to_string(),
            "total_sales".to_string(),
            "eligibility".to_string(),
        ])
    }

    async fn describe_schema(&self) -> Result<String, AgentError> {
        if let Some(message) = self.schema_error.read().unwrap().clone() {
            return Err(AgentError::SchemaRead(message));
        }
        Ok(self.schema.read().unwrap().clone())
    }

    async fn execute_query(&self, query: &str) -> Result<Vec<Value>, AgentError> {
        self.executed.write().unwrap().push(query.to_string());
        if let Some(message) = self.query_error.read().unwrap().clone() {
            return Err(AgentError::QueryExecution(message));
        }
        Ok(self.rows.read().unwrap().clone())
    }
}

/// Builds an `AgentClient` wired to the two mocks.
pub fn client_with(ai: &MockAiProvider, storage: &MockStorage) -> AgentClient {
    AgentClientBuilder::new()
        .ai_provider(Box::new(ai.clone()))
        .storage_provider(Box::new(storage.clone()))
        .build()
        .expect("both providers are set")
}
