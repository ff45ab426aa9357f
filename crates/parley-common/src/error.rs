//! Parley Common Error Types
//!
//! Centralized error handling for all Parley components

use std::fmt;

/// Main error type for Parley operations
#[derive(Debug)]
pub enum ParleyError {
    /// Generic error with message
    Generic(String),
    /// Connection or network failure talking to the backend
    Transport(String),
    /// Non-success status or a response body without the expected fields
    Protocol(String),
    /// Configuration errors
    Config(String),
    /// IO-related errors
    Io(std::io::Error),
    /// Serialization/deserialization errors
    Serde(serde_json::Error),
}

impl ParleyError {
    /// Whether this error came from the backend call rather than local setup
    pub fn is_backend_failure(&self) -> bool {
        matches!(self, ParleyError::Transport(_) | ParleyError::Protocol(_))
    }
}

impl fmt::Display for ParleyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParleyError::Generic(msg) => write!(f, "Parley error: {}", msg),
            ParleyError::Transport(msg) => write!(f, "Transport error: {}", msg),
            ParleyError::Protocol(msg) => write!(f, "Protocol error: {}", msg),
            ParleyError::Config(msg) => write!(f, "Configuration error: {}", msg),
            ParleyError::Io(err) => write!(f, "IO error: {}", err),
            ParleyError::Serde(err) => write!(f, "Serialization error: {}", err),
        }
    }
}

impl std::error::Error for ParleyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParleyError::Io(err) => Some(err),
            ParleyError::Serde(err) => Some(err),
            _ => None,
        }
    }
}

/// Convenience result type for Parley operations
pub type Result<T> = std::result::Result<T, ParleyError>;

impl From<std::io::Error> for ParleyError {
    fn from(err: std::io::Error) -> Self {
        ParleyError::Io(err)
    }
}

impl From<serde_json::Error> for ParleyError {
    fn from(err: serde_json::Error) -> Self {
        ParleyError::Serde(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_human_readable() {
        let err = ParleyError::Transport("connection refused".to_string());
        assert_eq!(err.to_string(), "Transport error: connection refused");

        let err = ParleyError::Protocol("HTTP 500".to_string());
        assert_eq!(err.to_string(), "Protocol error: HTTP 500");
    }

    #[test]
    fn test_backend_failure_classification() {
        assert!(ParleyError::Transport("x".into()).is_backend_failure());
        assert!(ParleyError::Protocol("x".into()).is_backend_failure());
        assert!(!ParleyError::Config("x".into()).is_backend_failure());
        assert!(!ParleyError::Generic("x".into()).is_backend_failure());
    }

    #[test]
    fn test_from_serde_error() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: ParleyError = serde_err.into();
        assert!(matches!(err, ParleyError::Serde(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
