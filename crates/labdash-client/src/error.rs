//! Error types for backend communication

use thiserror::Error;

/// Result type alias for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur while talking to the inventory backend
#[derive(Error, Debug)]
pub enum ClientError {
    /// The request never produced an HTTP response
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status
    #[error("Backend returned {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Message from the `error` field of the body, or the status reason
        message: String,
    },

    /// The response body does not match the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Push channel failure
    #[error("WebSocket error: {message}")]
    WebSocket {
        /// Error message
        message: String,
    },

    /// Core error (configuration, validation)
    #[error(transparent)]
    Core(#[from] labdash_core::Error),
}

impl ClientError {
    /// Create a backend status error
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Create a push channel error
    pub fn websocket(message: impl Into<String>) -> Self {
        Self::WebSocket {
            message: message.into(),
        }
    }

    /// Message the backend attached to a rejection, if this is one
    #[must_use]
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => Some(message),
            _ => None,
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::websocket(err.to_string())
    }
}
