//! Error types and result aliases for Arco.
//!
//! This module defines the shared error types used across all Arco components.
//! Errors are structured for programmatic handling and include context for debugging.

/// The result type used throughout Arco.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Arco operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input was provided (configuration values, identifiers).
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidInput("ARCO_X must be a boolean".to_string());
        assert_eq!(err.to_string(), "invalid input: ARCO_X must be a boolean");
    }
}
