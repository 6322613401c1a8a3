//! JSON API for the chat widget
//!
//! ```text
//! POST /api/chat   {"message": "..."}  ->  {"response": "..."}
//! ```

use crate::app::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

pub const MISSING_KEY_REPLY: &str =
    "Error: OpenAI API key not configured. Please set the OPENAI_API_KEY environment variable.";

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// POST /api/chat
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let message = payload
        .ok()
        .and_then(|Json(request)| request.message)
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty());

    let Some(message) = message else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "No message provided" })),
        )
            .into_response();
    };

    let Some(chat) = state.chat.as_ref() else {
        return Json(ChatResponse {
            response: MISSING_KEY_REPLY.to_string(),
        })
        .into_response();
    };

    match chat.reply(&message).await {
        Ok(response) => Json(ChatResponse { response }).into_response(),
        Err(e) => {
            error!("Error in chat API call: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ChatResponse {
                    response: format!("I'm sorry, I encountered an error: {}", e),
                }),
            )
                .into_response()
        }
    }
}
