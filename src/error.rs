//! Error types for postloop
//!
//! Centralized error handling using thiserror. Expected outcomes such as a
//! query matching nothing are not errors; they surface as result flags.

use thiserror::Error;

use crate::repository::RepositoryError;

/// All error types that can occur in postloop
#[derive(Debug, Error)]
pub enum Error {
    /// Query criteria could not be built (bad page size, unparsable value)
    #[error("Invalid criteria: {0}")]
    InvalidCriteria(String),

    /// The content repository failed
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// A hook callback reported a failure
    #[error("Hook '{hook}' failed: {message}")]
    Hook { hook: String, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Build a hook failure, the error a callback returns to abort dispatch.
    pub fn hook(hook: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Hook {
            hook: hook.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for postloop operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_criteria_error() {
        let err = Error::InvalidCriteria("page size -3".to_string());
        assert_eq!(err.to_string(), "Invalid criteria: page size -3");
    }

    #[test]
    fn test_hook_error() {
        let err = Error::hook("the_post", "listener exploded");
        assert_eq!(err.to_string(), "Hook 'the_post' failed: listener exploded");
    }

    #[test]
    fn test_repository_error_conversion() {
        let err: Error = RepositoryError::Unavailable("offline".to_string()).into();
        assert!(matches!(err, Error::Repository(_)));
        assert!(err.to_string().contains("offline"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
