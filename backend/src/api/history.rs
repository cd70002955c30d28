//! Chat history API

use crate::chat::Message;
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::Json,
};

/// GET /api/history/:session_id - All messages of a session, oldest first
pub async fn get_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<Message>>, AppError> {
    let messages = state.db.get_messages(&session_id).await?;

    tracing::debug!(
        session_id = %session_id,
        count = messages.len(),
        "Loaded chat history"
    );

    Ok(Json(messages))
}
