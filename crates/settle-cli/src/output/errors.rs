//! Error message formatting with actionable suggestions.
//!
//! Provides user-friendly error formatting that includes the error, a
//! suggestion for fixing it, and the chain of underlying causes.

use settle_core::error::SettleError;
use super::colors::ColorSupport;
use std::error::Error;

/// Error formatter with suggestions
pub struct ErrorFormatter {
    colors: ColorSupport,
}

impl ErrorFormatter {
    /// Create a new error formatter
    pub fn new() -> Self {
        Self {
            colors: ColorSupport::detect(),
        }
    }

    /// Format an error with context and suggestions
    pub fn format_error(&self, error: &SettleError) -> String {
        let mut output = String::new();

        // Main error message
        output.push_str(&self.colors.red("error"));
        output.push_str(": ");
        output.push_str(&error.to_string());
        output.push('\n');

        // Add source chain if available
        let mut source = error.source();
        while let Some(err) = source {
            output.push_str(&self.colors.dim("caused by"));
            output.push_str(": ");
            output.push_str(&err.to_string());
            output.push('\n');
            source = err.source();
        }

        // Add suggestion if available
        if let Some(suggestion) = error.suggestion() {
            output.push('\n');
            output.push_str(&self.colors.dim("help"));
            output.push_str(": ");
            output.push_str(suggestion);
            output.push('\n');
        }

        output
    }
}

impl Default for ErrorFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_with_cause_and_help() {
        let formatter = ErrorFormatter {
            colors: ColorSupport::disabled(),
        };
        let source = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only file system");
        let err = SettleError::io("Failed to replace /etc/app/appsettings.json".to_string(), source);

        let text = formatter.format_error(&err);
        assert_eq!(
            text,
            "error: IO error: Failed to replace /etc/app/appsettings.json\n\
             caused by: read-only file system\n\
             \n\
             help: Check that the file exists and is writable\n"
        );
    }
}
