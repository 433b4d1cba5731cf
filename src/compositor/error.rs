//! Compositor error types.
//!
//! Defines errors that can occur while rendering a watermark.

use std::fmt;

/// Errors that can occur during watermark rendering.
///
/// Both variants are deterministic functions of bad input; there are no
/// transient failures and nothing here is worth retrying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Malformed style parameters (opacity out of range, font size <= 0, ...)
    InvalidSpec(String),

    /// Base image has zero width or height
    EmptyImage,
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSpec(msg) => write!(f, "Invalid watermark spec: {}", msg),
            Self::EmptyImage => write!(f, "Base image has zero width or height"),
        }
    }
}

impl std::error::Error for RenderError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RenderError::InvalidSpec("opacity must be between 0.0 and 1.0".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid watermark spec: opacity must be between 0.0 and 1.0"
        );

        let err = RenderError::EmptyImage;
        assert_eq!(err.to_string(), "Base image has zero width or height");
    }

    #[test]
    fn test_error_debug() {
        let err = RenderError::InvalidSpec("test".to_string());
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("InvalidSpec"));
        assert!(debug_str.contains("test"));
    }
}
