//! Caller-facing error of a top-contributors query

use topcontrib_core::StreamError;

use crate::query::ValidationError;

/// Either the query was rejected up front or the fetch failed.
#[derive(Debug, Clone, PartialEq)]
pub enum ContribError {
    /// Bad location or cap; no request was made
    Validation(ValidationError),
    /// Transport, status, decode or transform failure from the stream
    Fetch(StreamError),
}

impl std::fmt::Display for ContribError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(e) => write!(f, "{e}"),
            Self::Fetch(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ContribError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Validation(e) => Some(e),
            Self::Fetch(e) => Some(e),
        }
    }
}

impl ContribError {
    /// Whether the caller should be told "bad request" rather than "server error"
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<ValidationError> for ContribError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<StreamError> for ContribError {
    fn from(e: StreamError) -> Self {
        Self::Fetch(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_display_is_message() {
        let err = ContribError::from(ValidationError::new("location can not be empty"));
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "location can not be empty");
    }

    #[test]
    fn fetch_display_is_stream_error() {
        let err = ContribError::from(StreamError::Status {
            status: 502,
            message: "Bad Gateway".to_string(),
        });
        assert!(!err.is_validation());
        assert_eq!(err.to_string(), "HTTP 502: Bad Gateway");
    }
}
