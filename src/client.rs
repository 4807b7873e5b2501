//! HTTP transport for the Pl@ntNet identification endpoint.
//!
//! The client only moves bytes: it posts the multipart body produced by
//! [`IdentificationRequest::multipart_body`] and hands the status and body
//! (or the transport failure) to [`interpret`]. One blocking call per
//! identification, no retries.

use std::time::Duration;

use tracing::info;
use url::Url;

use crate::error::PlantIdError;
use crate::model::Outcome;
use crate::request::{IdentificationRequest, MultipartBody};
use crate::response::{interpret, TransportError};

/// Base URL of the identification API; the project is appended as a path segment.
pub const DEFAULT_ENDPOINT: &str = "https://my-api.plantnet.org/v2/identify";

/// Time budget for one identification call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL without the project segment.
    pub endpoint: String,
    /// Global timeout for connecting, sending and reading the reply.
    pub timeout: Duration,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: concat!("plantid/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Status and body of a completed HTTP exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

/// Sends a prepared multipart body to a URL.
pub trait Transport {
    fn post(&self, url: &Url, body: &MultipartBody) -> Result<HttpReply, TransportError>;
}

/// Blocking transport backed by a `ureq` agent.
///
/// Non-2xx statuses are returned as replies rather than errors so the
/// interpreter sees every status code.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    user_agent: String,
}

impl UreqTransport {
    pub fn new(timeout: Duration, user_agent: impl Into<String>) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();

        Self {
            agent: config.into(),
            user_agent: user_agent.into(),
        }
    }
}

impl std::fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UreqTransport")
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

impl Transport for UreqTransport {
    fn post(&self, url: &Url, body: &MultipartBody) -> Result<HttpReply, TransportError> {
        let mut response = self
            .agent
            .post(url.as_str())
            .header("User-Agent", &self.user_agent)
            .header("Content-Type", &body.content_type())
            .send(body.as_bytes())
            .map_err(classify_transport_error)?;

        let status = response.status().as_u16();
        // Bodies are not guaranteed UTF-8; the status must still be classified.
        let bytes = response
            .body_mut()
            .read_to_vec()
            .map_err(classify_transport_error)?;
        let body = String::from_utf8_lossy(&bytes).into_owned();

        Ok(HttpReply { status, body })
    }
}

fn classify_transport_error(error: ureq::Error) -> TransportError {
    match error {
        ureq::Error::Timeout(_) => TransportError::Timeout,
        ureq::Error::Io(ref io) if io.kind() == std::io::ErrorKind::TimedOut => {
            TransportError::Timeout
        }
        other => TransportError::Connection(other.to_string()),
    }
}

/// Identification client: request layout plus transport plus interpretation.
#[derive(Clone, Debug)]
pub struct PlantNetClient<T = UreqTransport> {
    base: Url,
    transport: T,
}

impl PlantNetClient<UreqTransport> {
    /// Creates a client that talks HTTP with `ureq`.
    ///
    /// # Errors
    /// Returns [`PlantIdError::InvalidEndpoint`] if the endpoint is not an
    /// absolute http(s) URL.
    pub fn new(config: &ClientConfig) -> Result<Self, PlantIdError> {
        let transport = UreqTransport::new(config.timeout, config.user_agent.clone());
        Self::with_transport(&config.endpoint, transport)
    }
}

impl<T: Transport> PlantNetClient<T> {
    /// Creates a client over a caller-supplied transport.
    pub fn with_transport(endpoint: &str, transport: T) -> Result<Self, PlantIdError> {
        let base = parse_endpoint(endpoint)?;
        Ok(Self { base, transport })
    }

    /// Base URL requests are sent to.
    pub fn endpoint(&self) -> &Url {
        &self.base
    }

    /// Sends one identification request and classifies the reply.
    pub fn identify(&self, request: &IdentificationRequest) -> Outcome {
        let url = request.endpoint(&self.base);
        let body = request.multipart_body();

        info!(
            url = %redact_api_key(&url),
            project = %request.project(),
            organ = %request.organ(),
            bytes = body.as_bytes().len(),
            "Sending identification request"
        );

        let outcome = match self.transport.post(&url, &body) {
            Ok(reply) => {
                info!(status = reply.status, "Identification API responded");
                interpret(Some(reply.status), &reply.body, None)
            }
            Err(error) => interpret(None, "", Some(&error)),
        };

        match &outcome {
            Ok(identification) => info!(
                total_matches = identification.total_matches,
                best = identification
                    .best()
                    .map(|c| c.scientific_name.as_str())
                    .unwrap_or_default(),
                "Identification succeeded"
            ),
            Err(error) => info!(kind = ?error.kind, "Identification failed: {}", error),
        }

        outcome
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Url, PlantIdError> {
    let url = Url::parse(endpoint.trim()).map_err(|source| PlantIdError::InvalidEndpoint {
        url: endpoint.to_string(),
        message: source.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(PlantIdError::InvalidEndpoint {
            url: endpoint.to_string(),
            message: "expected an absolute http(s) URL".to_string(),
        });
    }

    Ok(url)
}

/// Renders a URL with the `api-key` query value masked.
pub fn redact_api_key(url: &Url) -> String {
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if key == "api-key" {
                "***".to_string()
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();

    if !pairs.is_empty() {
        redacted.query_pairs_mut().clear().extend_pairs(pairs);
    }
    redacted.to_string()
}
