//! Feed loading errors
//!
//! Document-level failures abort a load and surface as [`FeedError`].
//! Record-level failures do not: the record is skipped and described by a
//! [`FeedRejection`] next to the loaded snapshot.

use serde::Serialize;
use thiserror::Error;

/// Feed error types.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Document is not valid JSON or has the wrong top-level shape
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Document could not be read
    #[error("Read error: {0}")]
    ReadError(String),
}

impl FeedError {
    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            FeedError::ParseError(_) => "FEED_PARSE_ERROR",
            FeedError::ReadError(_) => "FEED_READ_ERROR",
        }
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            FeedError::ReadError(err.to_string())
        } else {
            FeedError::ParseError(err.to_string())
        }
    }
}

/// Result type for feed operations.
pub type FeedResult<T> = Result<T, FeedError>;

/// A record that was skipped, or that replaced an earlier one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedRejection {
    /// Document section the record came from (e.g. `rasa_auths`)
    pub section: &'static str,
    /// Position of the record within its section
    pub index: usize,
    /// What was wrong
    pub reason: String,
}

impl FeedRejection {
    pub(crate) fn new(section: &'static str, index: usize, reason: impl Into<String>) -> Self {
        let rejection = Self {
            section,
            index,
            reason: reason.into(),
        };
        tracing::warn!(
            section = rejection.section,
            index = rejection.index,
            reason = %rejection.reason,
            "Rejected feed record"
        );
        rejection
    }
}
