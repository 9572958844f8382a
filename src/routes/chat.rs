use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use crate::db;
use crate::error::AppError;
use crate::models::ChatMessage;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub user_id: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
}

/// Placeholder assistant: echoes the message back.
pub async fn send(
    State(state): State<SharedState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let response = format!("AI response to: {}", req.message);

    let message = ChatMessage {
        id: uuid::Uuid::new_v4().to_string(),
        session_id: req.session_id,
        user_id: req.user_id,
        message: req.message,
        response: response.clone(),
        timestamp: state.clock.now(),
    };
    db::chat_messages::create(state.store.as_ref(), &message).await?;

    Ok(Json(ChatResponse {
        response,
        session_id: message.session_id,
    }))
}

pub async fn history(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<ChatMessage>>, AppError> {
    let messages = db::chat_messages::list_by_session(state.store.as_ref(), &session_id).await?;
    Ok(Json(messages))
}
