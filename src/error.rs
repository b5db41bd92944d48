use thiserror::Error;

/// Everything that can go wrong between a controller and the content API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never completed (connection refused, timeout, TLS, ...).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response. `message` is the body's `error` field when present.
    #[error("{message}")]
    Server { status: u16, message: String },

    /// An identity-requiring call was attempted without a session token.
    #[error("authorization required")]
    AuthorizationRequired,

    #[error("expected a file of type {expected}/*, got {actual}")]
    InvalidMediaType {
        expected: &'static str,
        actual: String,
    },

    /// Client-side pre-check failed before any request was made.
    #[error("{0}")]
    Validation(String),

    #[error("could not decode response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True when the failure was decided locally without touching the network.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ApiError::AuthorizationRequired
                | ApiError::InvalidMediaType { .. }
                | ApiError::Validation(_)
        )
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
