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

// --- Gemini-specific request and response structures ---

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Deserialize, Debug)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    // Streaming responses may close with a candidate that carries only a
    // finish reason and no content.
    #[serde(default)]
    content: Option<ContentResponse>,
}

#[derive(Deserialize, Debug, Default)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize, Debug)]
struct PartResponse {
    text: String,
}

// --- Gemini Provider implementation ---

/// A provider for interacting with the Google Gemini API.
#[derive(Clone, Debug)]
pub struct GeminiProvider {
    client: ReqwestClient,
    api_url: String,
    stream_api_url: String,
    api_key: String,
    request_timeout: Option<Duration>,
}

impl GeminiProvider {
    /// Creates a new `GeminiProvider` from a `generateContent` endpoint URL.
    pub fn new(api_url: String, api_key: String) -> Result<Self, AgentError> {
        let client = ReqwestClient::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(AgentError::ReqwestClientBuild)?;
        let stream_api_url = api_url.replace(":generateContent", ":streamGenerateContent");
        Ok(Self {
            client,
            api_url,
            stream_api_url,
            api_key,
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

    fn request_body(system_prompt: &str, user_prompt: &str) -> GeminiRequest {
        let system_instruction = (!system_prompt.is_empty()).then(|| Content {
            parts: vec![Part {
                text: system_prompt.to_string(),
            }],
        });
        GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: user_prompt.to_string(),
                }],
            }],
            system_instruction,
        }
    }

    fn extract_text(response: GeminiResponse) -> Option<String> {
        response
            .candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()
            .map(|p| p.text.clone())
    }
}

#[async_trait]
impl AiProvider for GeminiProvider {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, AgentError> {
        let request_body = Self::request_body(system_prompt, user_prompt);

        let mut request = self
            .client
            .post(&self.api_url)
            .query(&[("key", &self.api_key)])
            .json(&request_body);
        if let Some(timeout) = self.request_timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(AgentError::AiRequest)?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AgentError::AiApi(error_text));
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(AgentError::AiDeserialization)?;

        Ok(Self::extract_text(gemini_response).unwrap_or_default())
    }

    async fn generate_stream(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<TextStream, AgentError> {
        let request_body = Self::request_body(system_prompt, user_prompt);

        let response = self
            .client
            .post(&self.stream_api_url)
            .query(&[("alt", "sse"), ("key", self.api_key.as_str())])
            .json(&request_body)
            .send()
            .await
            .map_err(AgentError::AiRequest)?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AgentError::AiApi(error_text));
        }

        let fragments = sse::data_events(response).filter_map(|event| {
            future::ready(match event {
                Ok(payload) => match serde_json::from_str::<GeminiResponse>(&payload) {
                    Ok(chunk) => Self::extract_text(chunk)
                        .filter(|text| !text.is_empty())
                        .map(Ok),
                    Err(e) => Some(Err(AgentError::AiStream(format!(
                        "malformed stream event: {e}"
                    )))),
                },
                Err(e) => Some(Err(e)),
            })
        });

        Ok(Box::pin(fragments))
    }
}
