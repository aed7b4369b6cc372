use thiserror::Error;

#[derive(Debug, Error)]
pub enum LimiterError {
    /// `retry_after` is the epoch-ms instant the current window ends.
    #[error("Too many decryption attempts; retry after {retry_after}")]
    AttemptsExhausted { retry_after: i64 },

    #[error("Attempt counter unavailable: {0}")]
    Unavailable(String),

    #[error("Not authenticated: {0}")]
    NotAuthenticated(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
