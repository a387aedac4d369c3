use std::sync::Arc;

use sqlx::{Pool, Sqlite};

use crate::ai::OpenAiClient;
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub db: Pool<Sqlite>,
    pub ai: OpenAiClient,
    pub config: Arc<Config>,
}
