//! AI Chat API
//!
//! One-shot request/response chat with the AI model.
//! Flow: user message -> message store -> conversation bridge -> message store -> response
//!
//! The bridge keeps one dialogue per session id, so follow-up requests with
//! the same session id continue the same conversation.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::chat::models::{NewMessage, Sender};
use crate::error::AppError;
use crate::state::AppState;

#[allow(missing_docs)]
#[derive(Debug, Default, Deserialize)]
pub struct AiChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[allow(missing_docs)]
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct AiChatResponse {
    pub response: String,
}

/// POST /api/chat/ai - Send a message to the AI and return its reply
///
/// Both `message` and `session_id` must be present and non-empty, otherwise
/// the request is rejected before anything is stored.
///
/// The user message is stored before the model is called. If storing the
/// AI reply fails afterwards, the reply is still returned and the session
/// history keeps the user message without its answer.
pub async fn chat_ai(
    State(state): State<AppState>,
    Json(request): Json<AiChatRequest>,
) -> Result<Json<AiChatResponse>, AppError> {
    let (message, session_id) = match (request.message, request.session_id) {
        (Some(message), Some(session_id)) if !message.is_empty() && !session_id.is_empty() => {
            (message, session_id)
        }
        _ => {
            return Err(AppError::BadRequest(
                "Missing message or session_id".to_string(),
            ))
        }
    };

    info!(
        session_id = %session_id,
        message_len = message.len(),
        "AI chat request received"
    );

    state
        .db
        .add_message(&NewMessage::text(message.as_str(), &Sender::User, session_id.as_str()))
        .await?;

    let reply = state.bridge.get_response(&message, &session_id).await;

    if let Err(e) = state
        .db
        .add_message(&NewMessage::text(reply.as_str(), &Sender::Ai, session_id.as_str()))
        .await
    {
        error!(
            session_id = %session_id,
            error = %e,
            "Failed to save AI reply, returning it anyway"
        );
    }

    Ok(Json(AiChatResponse { response: reply }))
}
