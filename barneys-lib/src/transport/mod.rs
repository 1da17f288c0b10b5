//! HTTP transport for the processor endpoints.
//!
//! Every processor call is a single JSON `POST`. The [`Transport`] trait is
//! the seam between the protocol code and the network: the reqwest-backed
//! [`HttpTransport`] is used in production, tests substitute their own.
//!
//! ## Feature Flags
//!
//! [`HttpTransport`] needs the `http-transport` feature (on by default).

#[cfg(feature = "http-transport")]
mod http;
mod traits;

#[cfg(feature = "http-transport")]
pub use http::HttpTransport;
pub use traits::{decode_json, Transport};

use serde::{Deserialize, Serialize};

/// Transport configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Verify the server's TLS certificate.
    ///
    /// Turning this off is only meant for the processor's SIT environment.
    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,

    /// Maximum number of redirects to follow.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

fn default_timeout_ms() -> u64 {
    45_000
}

fn default_verify_tls() -> bool {
    true
}

fn default_max_redirects() -> usize {
    5
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            verify_tls: default_verify_tls(),
            max_redirects: default_max_redirects(),
        }
    }
}

/// A JSON POST to send.
#[derive(Clone, PartialEq, Eq)]
pub struct PostRequest {
    /// Absolute endpoint URL.
    pub url: String,
    /// Serialized JSON body.
    pub body: Vec<u8>,
    /// Bearer token for the `Authorization` header, if any.
    pub bearer_token: Option<String>,
}

impl PostRequest {
    /// Unauthenticated request.
    pub fn new(url: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            url: url.into(),
            body,
            bearer_token: None,
        }
    }

    /// Attach a bearer token.
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }
}

impl std::fmt::Debug for PostRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostRequest")
            .field("url", &self.url)
            .field("body_len", &self.body.len())
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "******"))
            .finish()
    }
}

/// Status and body of a completed request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body bytes.
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Create a response.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as (lossy) UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Transport-level failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The request did not complete within the timeout.
    #[error("request to {target} timed out after {timeout_ms}ms")]
    Timeout {
        /// Endpoint URL
        target: String,
        /// Configured timeout
        timeout_ms: u64,
    },

    /// Connection could not be established (DNS, refused, TLS handshake).
    #[error("connection to {target} failed: {reason}")]
    Connect {
        /// Endpoint URL
        target: String,
        /// Underlying error message
        reason: String,
    },

    /// Any other network failure while sending or reading the response.
    #[error("network error: {0}")]
    Network(String),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    /// The server answered with a non-success status.
    #[error("processor returned HTTP {status}: {body}")]
    Remote {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// The body was not the expected JSON.
    #[error("malformed response ({reason}): {raw}")]
    MalformedResponse {
        /// Raw response body
        raw: String,
        /// Decoder message
        reason: String,
    },
}

impl TransportError {
    /// HTTP status, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the request failed before reaching the server.
    pub fn is_unsent(&self) -> bool {
        matches!(self, Self::Connect { .. })
    }

    /// Whether repeating the same request could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Connect { .. } | Self::Network(_) => true,
            Self::Remote { status, .. } => *status == 429 || (500..600).contains(status),
            Self::Client(_) | Self::MalformedResponse { .. } => false,
        }
    }
}
