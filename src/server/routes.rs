use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::AppState;
use super::errors::ChatError;

const INDEX_TEMPLATE: &str = "index.html";

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatResponse {
    pub respuesta: String,
}

/// Page and chat routes.
#[inline]
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/chat", post(chat))
}

/// GET / - Serve the chat page.
async fn index(State(state): State<Arc<AppState>>) -> Response {
    let path = state.templates_dir.join(INDEX_TEMPLATE);
    match tokio::fs::read_to_string(&path).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Failed to read template {}: {}", path.display(), e);
            (StatusCode::NOT_FOUND, "Template not found").into_response()
        }
    }
}

/// POST /chat - Answer one message. Always 200, failures become fixed replies.
async fn chat(State(state): State<Arc<AppState>>, body: Bytes) -> Json<ChatResponse> {
    let respuesta = match respond(&state, &body).await {
        Ok(answer) => answer,
        Err(e) => e.reply().to_string(),
    };
    Json(ChatResponse { respuesta })
}

async fn respond(state: &AppState, body: &[u8]) -> Result<String, ChatError> {
    let message = extract_message(body).ok_or(ChatError::EmptyMessage)?;
    let pipeline = state.pipeline.as_ref().ok_or(ChatError::NotReady)?;

    debug!("Answering with {} pipeline", pipeline.kind());
    pipeline.answer(&message).await.map_err(|e| {
        error!("Failed to answer question: {}", e);
        ChatError::from(e)
    })
}

/// The `mensaje` string of a JSON object body, if present and non-empty
fn extract_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value
        .get("mensaje")
        .and_then(serde_json::Value::as_str)
        .filter(|message| !message.is_empty())
        .map(str::to_string)
}
