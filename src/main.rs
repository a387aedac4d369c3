use std::sync::Arc;
use std::time::Duration;

use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use finwise_server::{
    ai::OpenAiClient,
    api::{create_router, AppState, RateLimiter},
    config::Config,
    error::AppError,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,finwise_server=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🚀 Starting Finwise server v{}...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Arc::new(Config::from_env()?);
    tracing::info!("✅ Configuration loaded");

    // Setup database with proper connection pooling
    let db = SqlitePoolOptions::new()
        .max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&config.database_url)
        .await?;

    tracing::info!("✅ Database connected: {}", config.database_url);

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .map_err(|e| AppError::Internal(format!("Migration failed: {}", e)))?;

    tracing::info!("✅ Database migrations completed");

    // Chat-completion client, injected into state rather than held globally
    let ai = OpenAiClient::new(&config)?;
    if ai.is_configured() {
        tracing::info!("✅ AI client configured (model: {})", config.openai_model);
    } else {
        tracing::warn!("⚠️ OPENAI_API_KEY is empty - /ai/analyze-spending will degrade");
    }

    // Create rate limiter
    let rate_limiter = Arc::new(RateLimiter::new(
        config.rate_limit_max_requests,
        config.rate_limit_window_secs,
    ));
    tracing::info!(
        "✅ Rate limiter configured ({} req/{}s per IP)",
        config.rate_limit_max_requests,
        config.rate_limit_window_secs
    );

    // Create shared application state
    let state = AppState {
        db,
        ai,
        config: config.clone(),
    };

    // Spawn background task for rate limiter cleanup
    {
        let limiter = rate_limiter.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(300)); // Every 5 minutes
            loop {
                interval.tick().await;
                limiter.cleanup().await;
                tracing::debug!("🧹 Rate limiter cache cleaned up");
            }
        });
        tracing::info!("✅ Rate limiter cleanup task started");
    }

    // Build router
    let app = create_router(state, rate_limiter);

    // Bind and serve
    let addr = config.server_address();
    tracing::info!("🌐 Server listening on http://{}", addr);
    tracing::info!("🏥 Health check: http://{}/health", addr);
    tracing::info!("");
    tracing::info!("📚 API Endpoints:");
    tracing::info!("  POST   /users/register                    - Register new user");
    tracing::info!("  POST   /users/login                       - Login, returns a bearer token");
    tracing::info!("  GET    /users/budget                      - Get monthly budget (auth)");
    tracing::info!("  PUT    /users/budget                      - Set monthly budget (auth)");
    tracing::info!("  POST   /users/add-repeated-expense        - Add recurring template (auth)");
    tracing::info!("  GET    /users/repeated-expenses           - List recurring templates (auth)");
    tracing::info!("  PUT    /users/update-repeated-expense/:id - Update recurring template (auth)");
    tracing::info!("  DELETE /users/delete-repeated-expense/:id - Delete recurring template (auth)");
    tracing::info!("  POST   /expenses/add                      - Add expense (auth)");
    tracing::info!("  GET    /expenses                          - List expenses (auth)");
    tracing::info!("  GET    /expenses/monthly-spending         - Current-month aggregation (auth)");
    tracing::info!("  GET    /expenses/by-date/:date            - Expenses on a day (auth)");
    tracing::info!("  PUT    /expenses/update/:id               - Update expense (auth)");
    tracing::info!("  DELETE /expenses/:id                      - Delete expense (auth)");
    tracing::info!("  POST   /ai/analyze-spending               - AI spending analysis (auth)");
    tracing::info!("  GET    /chat/sessions                     - List chat sessions (auth)");
    tracing::info!("  GET    /chat/session/:id                  - Fetch one session (auth)");
    tracing::info!("  POST   /chat/save                         - Save a chat turn (auth)");
    tracing::info!("");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
