//! Error types and handling for the `HazardWatch` application

use thiserror::Error;

/// Main error type for the `HazardWatch` application
#[derive(Error, Debug)]
pub enum HazardWatchError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Upstream feed communication errors
    #[error("Feed error: {message}")]
    Feed { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Cache operation errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl HazardWatchError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new upstream feed error
    pub fn feed<S: Into<String>>(message: S) -> Self {
        Self::Feed {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message for panel display
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            HazardWatchError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            HazardWatchError::Feed { .. } => {
                "Unable to reach the upstream service. Please check your internet connection."
                    .to_string()
            }
            HazardWatchError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            HazardWatchError::Cache { .. } => {
                "Cache operation failed. You may need to clear your cache.".to_string()
            }
            HazardWatchError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            HazardWatchError::General { message } => message.clone(),
        }
    }
}
