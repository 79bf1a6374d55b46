//! # API Route Handlers
//!
//! This module contains the Axum route handlers for the `shoptalk-server`:
//! the liveness endpoints and the streaming question endpoint.

use crate::{errors::AppError, state::AppState};
use axum::{
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use futures::StreamExt;
use serde::Deserialize;
use serde_json::Value;
use std::convert::Infallible;
use tracing::info;

/// The request body for the `/ask` endpoint.
#[derive(Deserialize)]
pub struct AskRequest {
    pub question: String,
}

/// The handler for the root (`/`) endpoint.
pub async fn root() -> &'static str {
    "shoptalk server is running."
}

/// The handler for the liveness (`/status`) endpoint.
pub async fn status() -> &'static str {
    "OK"
}

/// The handler for the `/ask` endpoint.
///
/// Validates the request body, then hands the response body over to the
/// agent's answer stream. Failures past this point arrive as text fragments
/// inside the stream rather than as HTTP errors, since the response is
/// already committed.
pub async fn ask_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Response, AppError> {
    let request: AskRequest = serde_json::from_value(payload)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {e}")))?;
    info!(question = %request.question, "Received question");

    let fragments = app_state.agent.answer(&request.question);
    let body = Body::from_stream(fragments.map(Ok::<_, Infallible>));

    Ok(([(header::CONTENT_TYPE, "text/event-stream")], body).into_response())
}
