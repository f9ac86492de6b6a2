//! Error types for the shared vocabulary

use thiserror::Error;

/// Result type alias for common operations
pub type Result<T> = std::result::Result<T, CommonError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommonError {
    #[error("Unknown entity token: {0}")]
    UnknownEntityToken(String),

    #[error("Invalid object name '{name}': {reason}")]
    InvalidObjectName { name: String, reason: String },
}

impl CommonError {
    pub fn invalid_object_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidObjectName {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
