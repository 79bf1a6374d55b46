use crate::errors::AgentError;
use crate::providers::{ai::AiProvider, db::storage::Storage};
use futures::Stream;
use std::fmt;
use std::pin::Pin;

/// A stream of text fragments produced incrementally by an AI provider.
///
/// Fragments arrive in generation order. A failed item terminates the
/// stream; callers must not poll past the first error.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, AgentError>> + Send>>;

/// The stream handed to the transport layer.
///
/// By the time fragments flow, response headers are long gone, so there is
/// no error channel here: failures have already been folded into a final
/// human-readable fragment.
pub type AnswerStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// The result of turning a question into SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlOutcome {
    /// A single executable statement, ready to run against storage.
    Statement(String),
    /// The question is conversational; no data access is required.
    NoQueryNeeded,
    /// The model produced nothing usable as a read-only query.
    Unparseable,
}

/// A client that answers natural language questions about data held in a
/// storage provider, delegating language work to an AI provider.
#[derive(Clone)]
pub struct AgentClient {
    pub ai_provider: Box<dyn AiProvider>,
    pub storage_provider: Box<dyn Storage>,
}

impl fmt::Debug for AgentClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentClient")
            .field("storage", &self.storage_provider.name())
            .finish_non_exhaustive()
    }
}

/// A builder for creating `AgentClient` instances.
#[derive(Default)]
pub struct AgentClientBuilder {
    ai_provider: Option<Box<dyn AiProvider>>,
    storage_provider: Option<Box<dyn Storage>>,
}

impl AgentClientBuilder {
    /// Creates a new `AgentClientBuilder`.
    ///
    /// # Examples
    ///
    /// ```
    /// use shoptalk::AgentClientBuilder;
    ///
    /// let builder = AgentClientBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the AI provider.
    pub fn ai_provider(mut self, provider: Box<dyn AiProvider>) -> Self {
        self.ai_provider = Some(provider);
        self
    }

    /// Sets the storage provider.
    pub fn storage_provider(mut self, provider: Box<dyn Storage>) -> Self {
        self.storage_provider = Some(provider);
        self
    }

    /// Builds the `AgentClient`, failing if either provider is missing.
    pub fn build(self) -> Result<AgentClient, AgentError> {
        Ok(AgentClient {
            ai_provider: self.ai_provider.ok_or(AgentError::MissingAiProvider)?,
            storage_provider: self
                .storage_provider
                .ok_or(AgentError::MissingStorageProvider)?,
        })
    }
}
