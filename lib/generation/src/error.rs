use std::time::Duration;

pub type Result<T, E = BackendError> = std::result::Result<T, E>;

/// Failure of a single text-generation call
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error("Backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid backend response: {0}")]
    InvalidResponse(String),

    #[error("Backend call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}
