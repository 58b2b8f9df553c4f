use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload")]
    MalformedPayload,

    #[error("Action failed")]
    ActionFailed,

    #[error("Not found")]
    NotFound,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::MalformedPayload => StatusCode::BAD_REQUEST,
            AppError::ActionFailed => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound => StatusCode::NOT_FOUND,
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{table} record is not a JSON object")]
    NotARecord { table: &'static str },

    #[error("{table} record has no id")]
    MissingId { table: &'static str },

    #[error("{table}/{id} not found")]
    NotFound { table: String, id: String },

    #[error("{table}/{id} already exists")]
    Conflict { table: String, id: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {key} value: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("Failed to read secret {name}: {source}")]
    Secret {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Why a notification transport did not deliver.
///
/// `Unavailable` lets the dispatcher move on to the next transport,
/// `Failed` ends the attempt.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("transport unavailable: {0}")]
    Unavailable(String),

    #[error("delivery failed: {0}")]
    Failed(String),
}

#[derive(Error, Debug)]
pub enum MailError {
    #[error("Mail API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Mail API rejected the message with status {0}")]
    Rejected(u16),

    #[error("No recipient")]
    NoRecipient,
}

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
