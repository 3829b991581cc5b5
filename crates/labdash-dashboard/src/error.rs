//! Error types for the dashboard service

use labdash_client::ClientError;
use thiserror::Error;

/// Result type alias for dashboard operations
pub type Result<T> = std::result::Result<T, DashboardError>;

/// Errors that can occur while running the dashboard
#[derive(Error, Debug)]
pub enum DashboardError {
    /// `start` called on a running dashboard
    #[error("Dashboard is already running")]
    AlreadyRunning,

    /// The dashboard was torn down and cannot be restarted
    #[error("Dashboard has been torn down")]
    TornDown,

    /// Missing or unusable session
    #[error("Session error: {message}")]
    Session {
        /// Error message
        message: String,
    },

    /// Backend communication error
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Core error (configuration, I/O, serialization)
    #[error(transparent)]
    Core(#[from] labdash_core::Error),
}

impl DashboardError {
    /// Create a session error
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for DashboardError {
    fn from(err: std::io::Error) -> Self {
        Self::Core(err.into())
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(err: serde_json::Error) -> Self {
        Self::Core(err.into())
    }
}
