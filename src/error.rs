use std::path::PathBuf;

use thiserror::Error;

/// Fatal startup failures. Every variant aborts the process before the
/// dispatcher starts consuming updates.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("Invalid SOCKS5 proxy: {0}")]
    Proxy(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Telegram rejected the bot token: {0}")]
    Auth(#[source] teloxide::RequestError),

    #[error("Telegram callback failed: {message}")]
    WebhookRegistration { message: String },

    #[error("Invalid webhook settings: {0}")]
    InvalidWebhook(String),

    #[error("Failed to load TLS certificate or key: {0}")]
    Tls(#[source] std::io::Error),

    #[error("Telegram API call failed: {0}")]
    Api(#[from] teloxide::RequestError),
}
