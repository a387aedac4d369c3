use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

// Implement From for common error types
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::ExternalApi(err.to_string())
    }
}

// Axum IntoResponse implementation for HTTP errors.
// Client errors carry their message directly; server errors answer with a
// generic message and put the detail under "error".
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message, detail) = match self {
            AppError::Validation(msg) => (axum::http::StatusCode::BAD_REQUEST, msg, None),
            AppError::Auth(msg) => (axum::http::StatusCode::UNAUTHORIZED, msg, None),
            AppError::NotFound(msg) => (axum::http::StatusCode::NOT_FOUND, msg, None),
            AppError::Database(err) => (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                "Server error".to_string(),
                Some(err.to_string()),
            ),
            AppError::Config(msg) => (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                "Server error".to_string(),
                Some(msg),
            ),
            AppError::ExternalApi(msg) => (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                "Server error".to_string(),
                Some(msg),
            ),
            AppError::Internal(msg) => (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                "Server error".to_string(),
                Some(msg),
            ),
        };

        let body = match detail {
            Some(detail) => serde_json::json!({
                "message": message,
                "error": detail,
            }),
            None => serde_json::json!({
                "message": message,
            }),
        };

        (status, axum::Json(body)).into_response()
    }
}
