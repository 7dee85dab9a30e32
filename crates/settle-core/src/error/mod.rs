//! Error types and result aliases for settle operations.
//!
//! Provides a unified error type that covers key parsing, document parsing
//! and file access, with actionable error messages.

use thiserror::Error;

/// Unified error type for all settle operations
#[derive(Error, Debug)]
pub enum SettleError {
    // Key errors
    #[error("Invalid settings key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    // Document errors
    #[error("Malformed document {source_name}: {message}")]
    MalformedDocument {
        source_name: String,
        message: String,
    },

    // Invocation errors
    #[error("Invalid usage: {reason}")]
    Usage { reason: String },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for settle operations
pub type SettleResult<T> = Result<T, SettleError>;

impl SettleError {
    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Create a malformed document error for an in-memory or on-disk source
    pub fn malformed(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedDocument {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create an invalid key error
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            SettleError::InvalidKey { .. } => {
                Some("Write settings as 'Section:Key=value', using ':' between path segments")
            },
            SettleError::MalformedDocument { .. } => {
                Some("Check that the file is valid JSON with an object at the top level")
            },
            SettleError::Usage { .. } => {
                Some("Pass the settings files in order from most generic to most specific")
            },
            SettleError::Io { .. } => Some("Check that the file exists and is writable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_display_messages() {
        let err = SettleError::invalid_key("Logging", "missing '='");
        assert_eq!(err.to_string(), "Invalid settings key 'Logging': missing '='");

        let err = SettleError::malformed("appsettings.json", "expected value at line 1 column 1");
        assert_eq!(
            err.to_string(),
            "Malformed document appsettings.json: expected value at line 1 column 1"
        );
    }

    #[test]
    fn test_io_error_keeps_source() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = SettleError::io("Failed to read appsettings.json".to_string(), source);

        assert_eq!(err.to_string(), "IO error: Failed to read appsettings.json");
        assert_eq!(err.source().unwrap().to_string(), "gone");
    }

    #[test]
    fn test_input_errors_have_suggestions() {
        let err = SettleError::malformed("a.json", "trailing comma");
        assert!(err.suggestion().is_some());

        let err = SettleError::invalid_key("Logging:Level", "expected 'key=value', found no '='");
        assert!(err.suggestion().unwrap().contains("Section:Key=value"));
    }
}
