use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub monthly_budget: f64,
    // Defined on the record but not maintained by any endpoint.
    pub budget_used: f64,
    pub created_at: i64,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RepeatedExpense {
    pub id: String,
    pub user_id: String,
    pub description: String,
    pub category: String,
    pub amount: f64,
    pub is_active: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub user_id: String,
    pub description: String,
    pub category: String,
    pub amount: f64,
    pub date: i64,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub user_id: String,
    pub session_id: String,
    pub session_name: String,
    pub query: String,
    pub response: String,
    pub timestamp: i64,
}

/// One conversation group as reported by `GET /chat/sessions`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ChatSession {
    pub session_id: String,
    pub session_name: String,
    pub last_updated: i64,
}
