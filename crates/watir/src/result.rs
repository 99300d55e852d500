//! Result and error types for watir.

use crate::driver::DriverError;
use thiserror::Error;

/// Result type for watir operations
pub type WatirResult<T> = Result<T, WatirError>;

/// Errors that can occur while driving a browser session
#[derive(Debug, Error)]
pub enum WatirError {
    /// An element could not be located (or went stale and could not be relocated)
    #[error("unable to locate element: {message}")]
    UnknownObject {
        /// Error message, usually carrying the selector
        message: String,
    },

    /// A frame could not be entered
    #[error("unable to locate frame: {message}")]
    UnknownFrame {
        /// Error message
        message: String,
    },

    /// The element is disabled and cannot be interacted with
    #[error("object is disabled: {message}")]
    ObjectDisabled {
        /// Error message
        message: String,
    },

    /// The element is read-only and cannot accept keys
    #[error("object is read only: {message}")]
    ObjectReadOnly {
        /// Error message
        message: String,
    },

    /// No option matched a select-list value
    #[error("{message}")]
    NoValueFound {
        /// Error message
        message: String,
    },

    /// The selector is malformed
    #[error("invalid selector: {message}")]
    InvalidSelector {
        /// Error message
        message: String,
    },

    /// A wait condition was not met in time
    #[error("timed out after {timeout_ms}ms, {message}")]
    Timeout {
        /// Description of the condition
        message: String,
        /// Timeout in milliseconds
        timeout_ms: u64,
    },

    /// No window matched the window selector
    #[error("no matching window found: {message}")]
    NoMatchingWindowFound {
        /// Error message
        message: String,
    },

    /// Operation not valid in the current state
    #[error("invalid state: {message}")]
    InvalidState {
        /// Error message
        message: String,
    },

    /// Failure reported by the WebDriver collaborator
    #[error("driver error: {0}")]
    Driver(#[from] DriverError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration could not be loaded or is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },
}

impl WatirError {
    pub(crate) fn unknown_object(message: impl Into<String>) -> Self {
        Self::UnknownObject {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_selector(message: impl Into<String>) -> Self {
        Self::InvalidSelector {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// True for the errors that mean "the thing is not there": an element or
    /// frame that could not be located.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::UnknownObject { .. } | Self::UnknownFrame { .. })
    }

    /// True when the collaborator reported a stale element reference.
    #[must_use]
    pub const fn is_stale(&self) -> bool {
        matches!(self, Self::Driver(DriverError::StaleElementReference))
    }

    /// True for wait timeouts.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        assert!(WatirError::unknown_object("x").is_not_found());
        assert!(WatirError::UnknownFrame {
            message: "f".into()
        }
        .is_not_found());
        assert!(!WatirError::invalid_selector("x").is_not_found());
    }

    #[test]
    fn test_stale_classification() {
        let err: WatirError = DriverError::StaleElementReference.into();
        assert!(err.is_stale());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_timeout_display_carries_budget() {
        let err = WatirError::Timeout {
            message: "waiting for dialog".into(),
            timeout_ms: 1500,
        };
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "timed out after 1500ms, waiting for dialog");
    }
}
