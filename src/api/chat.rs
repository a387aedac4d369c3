use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::state::AppState;
use crate::db::{ChatHistoryRepository, ChatMessage, ChatSession, User};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct SaveChatRequest {
    pub query: Option<String>,
    pub response: Option<String>,
    pub session_id: Option<String>,
}

/// Session label shown in the conversation list: the query's first
/// 25 characters.
fn derive_session_name(query: &str) -> String {
    let head: String = query.chars().take(25).collect();
    format!("{}...", head)
}

/// GET /chat/sessions (requires auth)
pub async fn list_sessions(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<ChatSession>>, AppError> {
    let sessions = ChatHistoryRepository::list_sessions(&state.db, &user.id).await?;
    Ok(Json(sessions))
}

/// GET /chat/session/:session_id (requires auth)
pub async fn get_session(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<ChatMessage>>, AppError> {
    let chats = ChatHistoryRepository::list_session(&state.db, &user.id, &session_id).await?;
    Ok(Json(chats))
}

/// POST /chat/save (requires auth)
pub async fn save_chat(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(req): Json<SaveChatRequest>,
) -> Result<(StatusCode, Json<ChatMessage>), AppError> {
    let (Some(query), Some(response)) = (req.query, req.response) else {
        return Err(AppError::Validation("Query and response are required".to_string()));
    };

    // Reuse the caller's session or start a fresh one
    let session_id = req
        .session_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let session_name = derive_session_name(&query);

    let chat = ChatHistoryRepository::create(
        &state.db,
        &user.id,
        session_id,
        session_name,
        query,
        response,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(chat)))
}
