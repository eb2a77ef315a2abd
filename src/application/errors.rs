//! Application layer errors

use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("AI service error: {0}")]
    AiService(#[from] AiServiceError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure of one call to the AI service.
///
/// Every endpoint reports through this single type so callers only need to
/// know which endpoint failed and why.
#[derive(Error, Debug)]
#[error("AI service call to /{endpoint} failed: {cause}")]
pub struct AiServiceError {
    pub endpoint: &'static str,
    #[source]
    pub cause: AiFailure,
}

impl AiServiceError {
    pub fn new(endpoint: &'static str, cause: AiFailure) -> Self {
        Self { endpoint, cause }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(&self.cause, AiFailure::Transport(e) if e.is_timeout())
    }
}

/// Underlying cause of an [`AiServiceError`]
#[derive(Error, Debug)]
pub enum AiFailure {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response body: {0}")]
    Decode(String),
}

/// Storage errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Write rejected: {0}")]
    Rejected(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Storage task failed: {0}")]
    Task(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_error_names_endpoint_and_cause() {
        let err = AiServiceError::new(
            "ask",
            AiFailure::Status { status: 500, body: "boom".to_string() },
        );
        assert_eq!(err.to_string(), "AI service call to /ask failed: status 500: boom");
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_store_error_converts_into_bot_error() {
        let err: BotError = StoreError::Rejected("duplicate".to_string()).into();
        assert!(matches!(err, BotError::Storage(_)));
        assert_eq!(err.to_string(), "Storage error: Write rejected: duplicate");
    }
}
