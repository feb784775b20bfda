//! Error types shared across the crate.

use thiserror::Error;

/// Why an inbound webhook failed authentication.
///
/// The `Display` text is returned verbatim to Slack in the 401 body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("request too old")]
    StaleTimestamp,
    #[error("signature invalid")]
    InvalidSignature,
}

/// Failures talking to Slack outside the request/response cycle.
#[derive(Debug, Error)]
pub enum SlackError {
    #[error("invalid response url {url:?}: {source}")]
    InvalidResponseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("callback delivery failed: {0}")]
    Delivery(#[from] reqwest::Error),

    #[error("callback rejected with status {status}: {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// A single resolver backend failed to answer a query.
#[derive(Debug, Error)]
#[error("{source_name} lookup failed: {message}")]
pub struct SearchError {
    pub source_name: String,
    pub message: String,
}

impl SearchError {
    pub fn new(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}
