use chrono::Utc;
use sqlx::{Pool, Sqlite};

use crate::ai::analyzer::{build_prompt, month_start_timestamp, SpendingAnalysis};
use crate::ai::client::OpenAiClient;
use crate::db::{ExpenseRepository, UserRepository};
use crate::error::AppError;

/// Returned instead of an error whenever analysis fails for any reason.
pub const ANALYSIS_FALLBACK_REPLY: &str =
    "Sorry, I encountered an error while analyzing your spending.";

/// Analyze the user's current-month spending against their query.
///
/// Failures (store, missing user, external API) never escape: they are
/// logged and degrade to a fixed apology so the endpoint stays
/// conversational.
pub async fn analyze_user_spending(
    pool: &Pool<Sqlite>,
    client: &OpenAiClient,
    user_id: &str,
    query: &str,
) -> String {
    match try_analyze(pool, client, user_id, query).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!("AI spending analysis failed: {}", e);
            ANALYSIS_FALLBACK_REPLY.to_string()
        }
    }
}

async fn try_analyze(
    pool: &Pool<Sqlite>,
    client: &OpenAiClient,
    user_id: &str,
    query: &str,
) -> Result<String, AppError> {
    let now = Utc::now();
    let today = now.date_naive();

    let expenses = ExpenseRepository::list_between(
        pool,
        user_id,
        month_start_timestamp(today),
        now.timestamp(),
    )
    .await?;

    let user = UserRepository::get_by_id(pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let analysis = SpendingAnalysis::compute(&expenses, user.monthly_budget, today);
    let prompt = build_prompt(query, &analysis.render(&expenses));

    let reply = client.complete(&prompt).await?;
    Ok(reply.trim().to_string())
}
