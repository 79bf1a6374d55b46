pub mod gemini;
pub mod local;
pub(crate) mod sse;

use crate::errors::AgentError;
use crate::types::TextStream;
use async_trait::async_trait;
use dyn_clone::DynClone;
use std::fmt::Debug;

/// A trait for interacting with an AI provider.
///
/// This trait defines a common interface for language model work, whether
/// the model sits behind the Gemini API or an OpenAI-compatible endpoint.
#[async_trait]
pub trait AiProvider: Send + Sync + Debug + DynClone {
    /// Generates a complete response from a given system and user prompt.
    async fn generate(&self, system_prompt: &str, user_prompt: &str)
        -> Result<String, AgentError>;

    /// Generates a response as a stream of text fragments.
    ///
    /// Errors raised while establishing the stream are returned directly;
    /// errors mid-stream surface as the stream's final item.
    async fn generate_stream(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<TextStream, AgentError>;
}

dyn_clone::clone_trait_object!(AiProvider);
