use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// The main error type for plantid operations.
#[derive(Debug, Error)]
pub enum PlantIdError {
    #[error("Failed to read image {path}: {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to probe image {path}: {message}")]
    ImageProbe { path: PathBuf, message: String },

    #[error("Unsupported project: {0}")]
    UnsupportedProject(String),

    #[error("Unsupported organ: {0}")]
    UnsupportedOrgan(String),

    #[error("Unsupported output format: {0}")]
    UnsupportedOutput(String),

    #[error("Invalid endpoint URL '{url}': {message}")]
    InvalidEndpoint { url: String, message: String },

    #[error("Failed to write JSON output: {0}")]
    JsonWrite(#[source] serde_json::Error),

    #[error(transparent)]
    Identification(#[from] IdentifyError),
}

/// Classification of a failed identification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The API key is missing or was rejected by the service.
    InvalidCredential,
    /// The image could not be decoded or has no pixels.
    InvalidImage,
    /// The service did not answer within the timeout.
    Timeout,
    /// The service could not be reached.
    ConnectionFailed,
    /// The service rejected the request parameters (HTTP 400).
    BadRequest,
    /// The uploaded image was rejected as too large (HTTP 413).
    PayloadTooLarge,
    /// Any other non-200 HTTP status.
    UpstreamFailure,
    /// The service returned no candidates.
    NoMatch,
    /// A 200 response that does not have the expected shape.
    MalformedResponse,
}

impl ErrorKind {
    /// Short human-readable summary, shown before any detail.
    pub fn summary(self) -> &'static str {
        match self {
            ErrorKind::InvalidCredential => "Invalid API key",
            ErrorKind::InvalidImage => "Invalid image",
            ErrorKind::Timeout => "Request timed out. Please try again.",
            ErrorKind::ConnectionFailed => {
                "Connection error. Please check your internet connection."
            }
            ErrorKind::BadRequest => "Bad request",
            ErrorKind::PayloadTooLarge => "Image too large. Please use a smaller image.",
            ErrorKind::UpstreamFailure => "API request failed",
            ErrorKind::NoMatch => {
                "No plants identified. Try a clearer image or different angle."
            }
            ErrorKind::MalformedResponse => "Malformed response from identification service",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.summary())
    }
}

/// A classified identification failure.
///
/// Every failure is terminal for the invocation that produced it.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize)]
#[error("{}", message(.kind, .detail))]
pub struct IdentifyError {
    pub kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl IdentifyError {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, detail: None }
    }

    pub fn with_detail(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: Some(detail.into()),
        }
    }
}

impl From<ErrorKind> for IdentifyError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

fn message(kind: &ErrorKind, detail: &Option<String>) -> String {
    match detail.as_deref() {
        Some(detail) if !detail.is_empty() => {
            format!("{}: {detail}", kind.summary().trim_end_matches('.'))
        }
        _ => kind.summary().to_string(),
    }
}
