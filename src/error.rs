//! Typed errors for the upstream HTTP surfaces.
//!
//! Application code works with `anyhow::Result`; these variants exist so
//! `main` can tell an upstream failure apart from a local one.

use thiserror::Error;

/// Failure talking to the hackathon API or the Slack Web API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} timed out after {seconds}s")]
    Timeout { url: String, seconds: u64 },

    #[error("cannot connect to {url}")]
    Connect { url: String },

    #[error("HTTP {status} from {url}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("failed to decode response from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("unexpected response shape from {url}: expected {expected}")]
    UnexpectedShape { url: String, expected: &'static str },

    #[error("Slack API error: {0}")]
    Slack(String),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ApiError {
    /// Classify a transport error the way the CLI reports it.
    pub fn from_reqwest(url: &str, timeout_seconds: u64, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout {
                url: url.to_string(),
                seconds: timeout_seconds,
            }
        } else if err.is_connect() {
            ApiError::Connect {
                url: url.to_string(),
            }
        } else if err.is_decode() {
            ApiError::Decode {
                url: url.to_string(),
                reason: err.to_string(),
            }
        } else {
            ApiError::Request {
                url: url.to_string(),
                source: err,
            }
        }
    }
}
