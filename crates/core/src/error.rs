//! Error types for polynest.

use thiserror::Error;

/// Result type alias for polynest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while nesting polygons into containers.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid (degenerate) polygon provided.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Invalid container dimensions.
    #[error("Invalid boundary: {0}")]
    InvalidBoundary(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Minkowski difference / NFP computation failed.
    #[error("NFP computation failed: {0}")]
    NfpError(String),

    /// A shape cannot be placed alone in an empty container, whatever its orientation.
    #[error("Ungeometrical demand: {0}")]
    UngeometricalDemand(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UngeometricalDemand("polygon with 4 vertices exceeds 10x10".into());
        assert_eq!(
            err.to_string(),
            "Ungeometrical demand: polygon with 4 vertices exceeds 10x10"
        );

        let err = Error::ConfigError("cooling rate must be positive".into());
        assert!(err.to_string().starts_with("Configuration error"));
    }
}
