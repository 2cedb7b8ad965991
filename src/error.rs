use reqwest::{header::InvalidHeaderValue, StatusCode};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("request did not complete: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server responded with {status}")]
    Status {
        status: StatusCode,
        detail: Option<String>,
    },

    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("credential storage failed: {0}")]
    Storage(#[from] std::io::Error),

    #[error("stored credential is not a valid header value")]
    InvalidHeader(#[from] InvalidHeaderValue),
}

impl ClientError {
    /// Server-supplied `detail` for application-level failures.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ClientError::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }
}
