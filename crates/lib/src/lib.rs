//! # Natural Language Answers over Sales Data
//!
//! This crate turns natural language questions about e-commerce sales data
//! into streamed, human-readable answers. A question is converted to SQL
//! (or answered directly when no data access is needed), executed against a
//! storage provider, and the result is narrated by a configurable AI
//! provider as a stream of text fragments.

pub mod errors;
pub mod ingest;
pub mod prompts;
pub mod providers;
pub mod synthesizer;
pub mod types;

pub use errors::AgentError;
pub use types::{AgentClient, AgentClientBuilder, AnswerStream, SqlOutcome, TextStream};

use futures::{future, stream, StreamExt};
use serde_json::Value;
use tracing::{debug, error, info};

/// The fragment sent when the model's response cannot be used as a query.
pub const INVALID_QUERY_MESSAGE: &str = "Could not generate or determine a valid SQL query.";

impl AgentClient {
    /// Answers a question as a stream of text fragments.
    ///
    /// The stream is lazy: no schema read, model call, or query runs until
    /// the first fragment is polled. Every failure past that point is
    /// folded into a final human-readable fragment, because the transport
    /// has usually committed a success status by the time fragments flow.
    pub fn answer(&self, question: &str) -> AnswerStream {
        let client = self.clone();
        let question = question.to_string();
        Box::pin(stream::once(async move { client.run_pipeline(&question).await }).flatten())
    }

    /// Drives one question through synthesis, execution, and narration.
    async fn run_pipeline(&self, question: &str) -> AnswerStream {
        info!("[answer] received question: {question:?}");

        let outcome = match self.synthesize(question).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("[answer] synthesis error: {e:?}");
                return error_fragment(&e);
            }
        };

        match outcome {
            SqlOutcome::NoQueryNeeded => {
                info!("[answer] no query needed; answering conversationally.");
                into_answer_stream(self.respond_conversationally(question).await)
            }
            SqlOutcome::Unparseable => {
                info!("[answer] model response was not usable as a query.");
                single_fragment(INVALID_QUERY_MESSAGE.to_string())
            }
            SqlOutcome::Statement(sql) => {
                info!(sql = %sql, "[answer] executing statement");
                match self.storage_provider.execute_query(&sql).await {
                    Ok(rows) => into_answer_stream(self.narrate(question, &rows).await),
                    Err(e @ AgentError::QueryExecution(_)) => {
                        error!("[answer] query execution error: {e:?}");
                        single_fragment(e.to_string())
                    }
                    Err(e) => {
                        error!("[answer] storage error: {e:?}");
                        error_fragment(&e)
                    }
                }
            }
        }
    }

    /// Converts a question into a [`SqlOutcome`].
    ///
    /// Known "highest CPC" questions short-circuit to a pre-verified
    /// statement; everything else goes to the model along with a fresh
    /// schema description.
    pub async fn synthesize(&self, question: &str) -> Result<SqlOutcome, AgentError> {
        if let Some(sql) = synthesizer::cpc_shortcut(question) {
            info!("[synthesize] highest-CPC question detected; using the pre-verified statement.");
            return Ok(SqlOutcome::Statement(sql.to_string()));
        }

        let schema = self.storage_provider.describe_schema().await?;
        let system_prompt = synthesizer::build_sql_system_prompt();
        let user_prompt = synthesizer::build_sql_user_prompt(question, &schema);

        debug!(system_prompt = %system_prompt, user_prompt = %user_prompt, "--> Sending prompts to AI Provider");

        let raw_response = self
            .ai_provider
            .generate(&system_prompt, &user_prompt)
            .await?;

        debug!("<-- Response from AI: {}", &raw_response);

        synthesizer::extract_sql(&raw_response)
    }

    /// Narrates a query result as a stream of text fragments.
    ///
    /// An empty result is rendered as an explicit "no rows" note so the
    /// model says it found nothing instead of inventing an answer.
    pub async fn narrate(&self, question: &str, rows: &[Value]) -> Result<TextStream, AgentError> {
        let rendered = if rows.is_empty() {
            "The query returned no rows.".to_string()
        } else {
            serde_json::to_string_pretty(rows)?
        };

        let user_prompt = prompts::NARRATION_USER_PROMPT
            .replace("{question}", question)
            .replace("{result}", &rendered);

        debug!(user_prompt = %user_prompt, "--> Sending narration prompt to AI Provider");

        self.ai_provider
            .generate_stream(prompts::NARRATION_SYSTEM_PROMPT, &user_prompt)
            .await
    }

    /// Answers a conversational question without touching storage.
    pub async fn respond_conversationally(
        &self,
        question: &str,
    ) -> Result<TextStream, AgentError> {
        let user_prompt = prompts::GENERAL_USER_PROMPT.replace("{question}", question);
        self.ai_provider
            .generate_stream(prompts::GENERAL_SYSTEM_PROMPT, &user_prompt)
            .await
    }
}

/// Wraps a single message as a complete answer stream.
fn single_fragment(message: String) -> AnswerStream {
    Box::pin(stream::iter([message]))
}

/// Renders an error as the only fragment of an answer stream.
fn error_fragment(error: &AgentError) -> AnswerStream {
    single_fragment(format!("An unexpected error occurred: {error}"))
}

/// Folds a fallible narration stream into an infallible answer stream.
///
/// A mid-stream error becomes one final fragment; nothing is forwarded
/// after it.
fn into_answer_stream(outcome: Result<TextStream, AgentError>) -> AnswerStream {
    let fragments = match outcome {
        Ok(fragments) => fragments,
        Err(e) => return error_fragment(&e),
    };

    Box::pin(fragments.scan(false, |failed, item| {
        if *failed {
            return future::ready(None);
        }
        future::ready(Some(match item {
            Ok(text) => text,
            Err(e) => {
                *failed = true;
                format!("An unexpected error occurred: {e}")
            }
        }))
    }))
}
