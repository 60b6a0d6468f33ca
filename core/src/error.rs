//! Error types for the breed data layer.
//!
//! # Design
//! `ApiError` is what callers see from a top-level fetch: they render a
//! retry affordance for any of its variants. `LookupError` describes why a
//! single item was dropped from a batch; it never escapes a batch as an
//! `Err`, it is reported alongside the records instead.

use thiserror::Error;

/// Errors returned by `HttpClient` and the top level of every repository.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection-level failure (DNS, refused, reset). Never retried here.
    #[error("Network error: unable to connect; verify the service is running and reachable ({url}: {reason})")]
    NetworkUnavailable { url: String, reason: String },

    /// The upstream answered with a non-2xx status. `message` is the
    /// upstream `detail` when present, otherwise a synthesized summary.
    #[error("{message}")]
    RequestFailed {
        status: u16,
        status_text: String,
        data: serde_json::Value,
        message: String,
    },

    /// The body decoded as JSON but not into any shape this layer accepts.
    #[error("unexpected upstream shape: {0}")]
    UpstreamShapeMismatch(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Why one item of a batch was left out of the result.
#[derive(Debug, Error)]
pub enum LookupError {
    /// Neither the summary value nor the fallback value could be read.
    #[error("summary lookup failed ({summary}); fallback lookup failed ({fallback})")]
    BothLookupsFailed {
        summary: Box<ApiError>,
        fallback: Box<ApiError>,
    },

    /// The item decoded but carried no usable breed name.
    #[error("record has no breed name")]
    MissingBreedName,

    /// The item was not an object or did not decode as one.
    #[error("malformed item: {0}")]
    Malformed(String),

    /// A listed run carried neither `run_id` nor `dag_run_id`.
    #[error("run has no id")]
    MissingRunId,
}

/// A failed round-trip below the HTTP layer, reported by a `Transport`.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Invalid environment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}
