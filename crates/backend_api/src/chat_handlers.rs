use ai_client::{AssistantClient, ChatRequest};
use axum::{extract::State, Json};
use serde::Serialize;

use crate::{error::ApiError, router::SharedState, Result};

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

/// POST /api/chat
/// Forwards the message, history and page context to the assistant endpoint
pub async fn chat(
    State(state): State<SharedState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    let config = state
        .assistant
        .clone()
        .ok_or_else(|| ApiError::Internal("Gemini API key not configured".to_string()))?;

    // The HTTP client is blocking, so it is built and used off the async workers.
    let reply = tokio::task::spawn_blocking(move || {
        AssistantClient::new(config).and_then(|client| client.chat(&request))
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?
    .map_err(|e| {
        tracing::warn!("Assistant call failed: {:#}", e);
        ApiError::Assistant(format!("{e:#}"))
    })?;

    Ok(Json(ChatResponse { response: reply }))
}
