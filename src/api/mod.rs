pub mod ai;
pub mod chat;
pub mod expenses;
pub mod middleware;
pub mod state;
pub mod users;

pub use middleware::RateLimiter;
pub use state::AppState;

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

pub fn create_router(state: AppState, rate_limiter: Arc<RateLimiter>) -> Router {
    let request_timeout = Duration::from_secs(state.config.request_timeout_secs);

    let public = Router::new()
        .route("/health", get(health))
        .route("/users/register", post(users::register))
        .route("/users/login", post(users::login));

    let protected = Router::new()
        .route(
            "/users/budget",
            get(users::get_budget).put(users::update_budget),
        )
        .route("/users/add-repeated-expense", post(users::add_repeated_expense))
        .route("/users/repeated-expenses", get(users::list_repeated_expenses))
        .route(
            "/users/update-repeated-expense/:id",
            put(users::update_repeated_expense),
        )
        .route(
            "/users/delete-repeated-expense/:id",
            delete(users::delete_repeated_expense),
        )
        .route("/expenses/add", post(expenses::add_expense))
        .route("/expenses", get(expenses::list_expenses))
        .route("/expenses/monthly-spending", get(expenses::monthly_spending))
        .route("/expenses/by-date/:date", get(expenses::expenses_by_date))
        .route("/expenses/update/:id", put(expenses::update_expense))
        .route("/expenses/:id", delete(expenses::delete_expense))
        .route("/ai/analyze-spending", post(ai::analyze_spending))
        .route("/chat/sessions", get(chat::list_sessions))
        .route("/chat/session/:session_id", get(chat::get_session))
        .route("/chat/save", post(chat::save_chat))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        // Add rate limiting middleware
        .layer(axum_middleware::from_fn(move |req, next| {
            let limiter = rate_limiter.clone();
            middleware::rate_limit_middleware(limiter, req, next)
        }))
        // Add request timeout
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> axum::Json<HealthResponse> {
    axum::Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::OpenAiClient;
    use crate::config::Config;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use sqlx::sqlite::SqlitePoolOptions;
    use tower::ServiceExt;

    fn test_config() -> Config {
        Config {
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "router-test-secret".to_string(),
            token_expiry_hours: 24,
            openai_api_key: String::new(),
            openai_api_base: "https://api.openai.com/v1".to_string(),
            openai_model: "gpt-4o-mini".to_string(),
            ai_max_tokens: 200,
            db_max_connections: 1,
            db_min_connections: 1,
            request_timeout_secs: 30,
            rate_limit_max_requests: 10_000,
            rate_limit_window_secs: 60,
        }
    }

    async fn test_app() -> Router {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();

        let config = Arc::new(test_config());
        let state = AppState {
            db: pool,
            ai: OpenAiClient::new(&config).unwrap(),
            config,
        };
        create_router(state, Arc::new(RateLimiter::new(10_000, 60)))
    }

    async fn send_json(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn register_and_login(app: &Router, username: &str, email: &str) -> String {
        let (status, _) = send_json(
            app,
            "POST",
            "/users/register",
            None,
            Some(json!({"username": username, "email": email, "password": "hunter2secret"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send_json(
            app,
            "POST",
            "/users/login",
            None,
            Some(json!({"email": email, "password": "hunter2secret"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = test_app().await;
        let (status, body) = send_json(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let app = test_app().await;

        let payload = json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": "hunter2secret",
        });
        let (status, _) =
            send_json(&app, "POST", "/users/register", None, Some(payload.clone())).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send_json(
            &app,
            "POST",
            "/users/register",
            None,
            Some(json!({
                "username": "alice2",
                "email": "alice@example.com",
                "password": "hunter2secret",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "User already exists");
    }

    #[tokio::test]
    async fn login_issues_a_usable_token() {
        let app = test_app().await;
        let token = register_and_login(&app, "alice", "alice@example.com").await;

        let (status, body) =
            send_json(&app, "GET", "/users/budget", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["monthly_budget"], 0.0);

        // Wrong password
        let (status, _) = send_json(
            &app,
            "POST",
            "/users/login",
            None,
            Some(json!({"email": "alice@example.com", "password": "wrong-password"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn protected_routes_require_a_valid_token() {
        let app = test_app().await;

        let (status, _) = send_json(&app, "GET", "/expenses", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) =
            send_json(&app, "GET", "/expenses", Some("not-a-real-token"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn expenses_are_not_visible_across_users() {
        let app = test_app().await;
        let alice = register_and_login(&app, "alice", "alice@example.com").await;
        let bob = register_and_login(&app, "bob", "bob@example.com").await;

        let (status, body) = send_json(
            &app,
            "POST",
            "/expenses/add",
            Some(&alice),
            Some(json!({"description": "Groceries", "category": "Food", "amount": 42.5})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let expense_id = body["expense"]["id"].as_str().unwrap().to_string();

        let uri = format!("/expenses/update/{}", expense_id);
        let (status, _) = send_json(
            &app,
            "PUT",
            &uri,
            Some(&bob),
            Some(json!({"amount": 1.0})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let uri = format!("/expenses/{}", expense_id);
        let (status, _) = send_json(&app, "DELETE", &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // The owner still sees it
        let (status, body) = send_json(&app, "GET", "/expenses", Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_repeated_expense_id_is_not_found() {
        let app = test_app().await;
        let token = register_and_login(&app, "alice", "alice@example.com").await;

        let (status, _) = send_json(
            &app,
            "DELETE",
            "/users/delete-repeated-expense/no-such-id",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn budget_updates_round_trip() {
        let app = test_app().await;
        let token = register_and_login(&app, "alice", "alice@example.com").await;

        let (status, body) = send_json(
            &app,
            "PUT",
            "/users/budget",
            Some(&token),
            Some(json!({"monthly_budget": 1500.0})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["monthly_budget"], 1500.0);
        // The password hash must never serialize
        assert!(body["user"].get("password").is_none());

        let (status, _) = send_json(
            &app,
            "PUT",
            "/users/budget",
            Some(&token),
            Some(json!({"monthly_budget": -5.0})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn chat_save_groups_into_sessions() {
        let app = test_app().await;
        let token = register_and_login(&app, "alice", "alice@example.com").await;

        let (status, body) = send_json(
            &app,
            "POST",
            "/chat/save",
            Some(&token),
            Some(json!({"query": "Am I over budget this month?", "response": "No."})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let session_id = body["session_id"].as_str().unwrap().to_string();
        assert_eq!(body["session_name"], "Am I over budget this mon...");

        let (status, _) = send_json(
            &app,
            "POST",
            "/chat/save",
            Some(&token),
            Some(json!({
                "query": "And last month?",
                "response": "Also no.",
                "session_id": session_id,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send_json(&app, "GET", "/chat/sessions", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let uri = format!("/chat/session/{}", session_id);
        let (status, body) = send_json(&app, "GET", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn analyze_spending_requires_a_query() {
        let app = test_app().await;
        let token = register_and_login(&app, "alice", "alice@example.com").await;

        let (status, body) = send_json(
            &app,
            "POST",
            "/ai/analyze-spending",
            Some(&token),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Query is required");
    }
}
