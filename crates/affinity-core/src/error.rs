//! Error types for Affinity

use thiserror::Error;

/// Result type alias using Affinity's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Affinity error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Validation errors (E001-E099)
    #[error("Validation failed: {message} (fields: {})", fields.join(", "))]
    Validation {
        fields: Vec<String>,
        message: String,
    },

    // Backend errors (E100-E199)
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Backend operation '{operation}' timed out after {millis}ms")]
    Timeout { operation: String, millis: u64 },

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    Configuration(String),

    // Ingestion errors (E700-E799)
    #[error("Failed to decode ingestion record: {0}")]
    Decode(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic errors
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a validation error listing the offending fields
    pub fn validation<I, S>(fields: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Validation {
            fields: fields.into_iter().map(Into::into).collect(),
            message: message.into(),
        }
    }

    /// Validation error for a single field
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        Self::validation([field], message)
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "E001",
            Self::Backend(_) => "E100",
            Self::Database(_) => "E101",
            Self::Timeout { .. } => "E102",
            Self::Configuration(_) => "E600",
            Self::Decode(_) => "E700",
            Self::Serialization(_) => "E701",
            Self::Other(_) | Self::Io(_) => "E9999",
        }
    }

    /// Whether a caller-side retry could succeed. The core itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Backend(_) | Self::Database(_) | Self::Timeout { .. }
        )
    }

    /// Offending field names for validation errors
    pub fn fields(&self) -> &[String] {
        match self {
            Self::Validation { fields, .. } => fields,
            _ => &[],
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::Validation { fields, .. } => Some(format!("Provide valid values for: {}", fields.join(", "))),
            Self::Timeout { .. } => Some("affinity config set backend.timeout_ms <millis>".to_string()),
            Self::Configuration(_) => Some("affinity config list".to_string()),
            _ => None,
        }
    }
}
