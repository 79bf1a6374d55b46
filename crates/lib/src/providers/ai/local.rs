use crate::{
    errors::AgentError,
    providers::ai::{sse, AiProvider},
    types::TextStream,
};
use async_trait::async_trait;
use futures::{future, StreamExt};
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::time::Duration;

// --- OpenAI-compatible request and response structures ---

#[derive(Serialize)]
struct LocalAiRequest<'a> {
    messages: Vec<LocalAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    temperature: f32,
    max_tokens: i32,
    stream: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct LocalAiMessage {
    role: String,
    content: String,
}

#[derive(Deserialize, Debug)]
struct LocalAiResponse {
    choices: Vec<LocalAiChoice>,
}

#[derive(Deserialize, Debug)]
struct LocalAiChoice {
    message: LocalAiMessage,
}

#[derive(Deserialize, Debug)]
struct LocalAiStreamChunk {
    #[serde(default)]
    choices: Vec<LocalAiStreamChoice>,
}

#[derive(Deserialize, Debug)]
struct LocalAiStreamChoice {
    #[serde(default)]
    delta: LocalAiDelta,
}

#[derive(Deserialize, Debug, Default)]
struct LocalAiDelta {
    #[serde(default)]
    content: Option<String>,
}

// --- Local Provider implementation ---

/// A provider for interacting with a local or OpenAI-compatible API.
#[derive(Clone, Debug)]
pub struct LocalAiProvider {
    client: ReqwestClient,
    api_url: String,
    api_key: Option<String>,
    model: Option<String>,
    request_timeout: Option<Duration>,
}

impl LocalAiProvider {
    /// Creates a new `LocalAiProvider`.
    pub fn new(
        api_url: String,
        api_key: Option<String>,
        model: Option<String>,
    ) -> Result<Self, AgentError> {
        let client = ReqwestClient::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(AgentError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            api_url,
            api_key,
            model,
            request_timeout: None,
        })
    }

    /// Caps the total time spent on a single blocking `generate` call.
    ///
    /// Streaming calls are not capped: a healthy stream may legitimately
    /// stay open for longer than any sensible per-request budget.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    fn messages(system_prompt: &str, user_prompt: &str) -> Vec<LocalAiMessage> {
        vec![
            LocalAiMessage {
                role: "system".to_string(),
                content: system_prompt.to_string(),
            },
            LocalAiMessage {
                role: "user".to_string(),
                content: user_prompt.to_string(),
            },
        ]
    }

    fn delta_text(payload: &str) -> Result<Option<String>, AgentError> {
        let chunk: LocalAiStreamChunk = serde_json::from_str(payload)
            .map_err(|e| AgentError::AiStream(format!("malformed stream event: {e}")))?;
        Ok(chunk
            .choices
            .first()
            .and_then(|c| c.delta.content.clone())
            .filter(|text| !text.is_empty()))
    }
}

#[async_trait]
impl AiProvider for LocalAiProvider {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, AgentError> {
        let request_body = LocalAiRequest {
            messages: Self::messages(system_prompt, user_prompt),
            model: self.model.as_deref(),
            temperature: 0.0,
            max_tokens: 1500,
            stream: false,
        };

        let mut request_builder = self.client.post(&self.api_url);

        if let Some(key) = &self.api_key {
            request_builder = request_builder.bearer_auth(key);
        }
        if let Some(timeout) = self.request_timeout {
            request_builder = request_builder.timeout(timeout);
        }

        let response = request_builder
            .json(&request_body)
            .send()
            .await
            .map_err(AgentError::AiRequest)?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AgentError::AiApi(error_text));
        }

        let local_ai_response: LocalAiResponse = response
            .json()
            .await
            .map_err(AgentError::AiDeserialization)?;

        let raw_response = local_ai_response
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .unwrap_or_default();

        Ok(raw_response)
    }

    async fn generate_stream(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<TextStream, AgentError> {
        let request_body = LocalAiRequest {
            messages: Self::messages(system_prompt, user_prompt),
            model: self.model.as_deref(),
            temperature: 0.0,
            max_tokens: 1500,
            stream: true,
        };

        let mut request_builder = self.client.post(&self.api_url);

        if let Some(key) = &self.api_key {
            request_builder = request_builder.bearer_auth(key);
        }

        let response = request_builder
            .json(&request_body)
            .send()
            .await
            .map_err(AgentError::AiRequest)?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AgentError::AiApi(error_text));
        }

        let fragments = sse::data_events(response)
            .take_while(|event| {
                let done = matches!(event, Ok(payload) if payload == "[DONE]");
                future::ready(!done)
            })
            .filter_map(|event| {
                future::ready(match event {
                    Ok(payload) => Self::delta_text(&payload).transpose(),
                    Err(e) => Some(Err(e)),
                })
            });

        Ok(Box::pin(fragments))
    }
}
