use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use crate::db::models::{ChatMessage, ChatSession};
use crate::error::AppError;

pub struct ChatHistoryRepository;

impl ChatHistoryRepository {
    pub async fn create(
        pool: &Pool<Sqlite>,
        user_id: &str,
        session_id: String,
        session_name: String,
        query: String,
        response: String,
    ) -> Result<ChatMessage, AppError> {
        let id = Uuid::new_v4().to_string();
        let timestamp = chrono::Utc::now().timestamp();

        let chat = sqlx::query_as::<_, ChatMessage>(
            r#"
INSERT INTO chat_history (id, user_id, session_id, session_name, query, response, timestamp)
VALUES (?, ?, ?, ?, ?, ?, ?)
RETURNING *
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(&session_id)
        .bind(&session_name)
        .bind(&query)
        .bind(&response)
        .bind(timestamp)
        .fetch_one(pool)
        .await?;

        Ok(chat)
    }

    /// One group per distinct session id: the name comes from the group's
    /// earliest entry, `last_updated` from its newest, newest session first.
    pub async fn list_sessions(
        pool: &Pool<Sqlite>,
        user_id: &str,
    ) -> Result<Vec<ChatSession>, AppError> {
        let sessions = sqlx::query_as::<_, ChatSession>(
            r#"
SELECT session_id,
       (SELECT c2.session_name FROM chat_history c2
        WHERE c2.user_id = c.user_id AND c2.session_id = c.session_id
        ORDER BY c2.timestamp ASC LIMIT 1) AS session_name,
       MAX(timestamp) AS last_updated
FROM chat_history c
WHERE user_id = ?
GROUP BY session_id
ORDER BY last_updated DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(sessions)
    }

    pub async fn list_session(
        pool: &Pool<Sqlite>,
        user_id: &str,
        session_id: &str,
    ) -> Result<Vec<ChatMessage>, AppError> {
        let chats = sqlx::query_as::<_, ChatMessage>(
            r#"
SELECT * FROM chat_history
WHERE user_id = ? AND session_id = ?
ORDER BY timestamp ASC
            "#,
        )
        .bind(user_id)
        .bind(session_id)
        .fetch_all(pool)
        .await?;

        Ok(chats)
    }
}
