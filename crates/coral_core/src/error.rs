//! Error types for the Coral connection workflow.

use crate::models::FieldErrors;
use thiserror::Error;

/// Main error type for the Coral core layer.
#[derive(Debug, Error)]
pub enum CoralError {
    /// One or more form fields failed validation.
    #[error("Validation failed: {errors}")]
    Validation {
        /// Field-level violations, in declaration order.
        errors: FieldErrors,
    },

    /// Reaching the Redis server failed.
    #[error("Connection error: {message}")]
    Connection {
        /// Human-readable error message.
        message: String,
        /// Optional underlying error source.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Local SQLite storage error.
    #[error("Storage error: {message}")]
    Storage {
        /// Human-readable error message.
        message: String,
        /// Actionable hint for the user.
        hint: Option<String>,
        /// Optional underlying error source.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Unexpected internal error.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
    },
}

impl CoralError {
    /// Create a validation error from collected field violations.
    pub fn validation(errors: FieldErrors) -> Self {
        Self::Validation { errors }
    }

    /// Create a new connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection { message: message.into(), source: None }
    }

    /// Create a new connection error with source.
    pub fn connection_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Connection { message: message.into(), source: Some(Box::new(source)) }
    }

    /// Create a new storage error.
    pub fn storage(message: impl Into<String>, hint: Option<&str>) -> Self {
        Self::Storage { message: message.into(), hint: hint.map(String::from), source: None }
    }

    /// Create a new internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Check if this error carries field-level validation failures.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Get the field violations if this is a validation error.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation { errors } => Some(errors),
            _ => None,
        }
    }

    /// Get the error category name.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "Validation",
            Self::Connection { .. } => "Connection",
            Self::Storage { .. } => "Storage",
            Self::Internal { .. } => "Internal",
        }
    }

    /// Get actionable hint for the user.
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Validation { .. } => Some("Correct the highlighted fields"),
            Self::Connection { .. } => Some("Check that the Redis server is running"),
            Self::Storage { hint, .. } => hint.as_deref(),
            Self::Internal { .. } => Some("Please report this issue"),
        }
    }
}

/// Convert from rusqlite::Error to CoralError.
impl From<rusqlite::Error> for CoralError {
    fn from(err: rusqlite::Error) -> Self {
        CoralError::Storage {
            message: err.to_string(),
            hint: Some("The local database may be corrupted".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

/// Convert from std::io::Error to CoralError.
impl From<std::io::Error> for CoralError {
    fn from(err: std::io::Error) -> Self {
        CoralError::Storage {
            message: err.to_string(),
            hint: Some("Check file permissions and disk space".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

/// Convert from serde_json::Error to CoralError.
impl From<serde_json::Error> for CoralError {
    fn from(err: serde_json::Error) -> Self {
        CoralError::Storage {
            message: format!("JSON error: {err}"),
            hint: Some("Data may be corrupted".to_string()),
            source: Some(Box::new(err)),
        }
    }
}
