use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::ai::analyze_user_spending;
use crate::api::state::AppState;
use crate::db::User;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct AnalyzeSpendingRequest {
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeSpendingResponse {
    pub response: String,
}

/// POST /ai/analyze-spending (requires auth)
///
/// Analysis failures never surface as HTTP errors; the service degrades to
/// a fixed apology and this handler still answers 200.
pub async fn analyze_spending(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(req): Json<AnalyzeSpendingRequest>,
) -> Result<Json<AnalyzeSpendingResponse>, AppError> {
    let query = match req.query {
        Some(query) if !query.trim().is_empty() => query,
        _ => return Err(AppError::Validation("Query is required".to_string())),
    };

    let response = analyze_user_spending(&state.db, &state.ai, &user.id, &query).await;

    Ok(Json(AnalyzeSpendingResponse { response }))
}
