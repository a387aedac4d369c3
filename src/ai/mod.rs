pub mod analyzer;
pub mod client;
pub mod service;

pub use analyzer::{build_prompt, SpendingAnalysis};
pub use client::OpenAiClient;
pub use service::analyze_user_spending;
