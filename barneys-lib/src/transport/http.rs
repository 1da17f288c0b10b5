//! reqwest-backed transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use super::{PostRequest, RawResponse, Transport, TransportConfig, TransportError};

/// Production transport built on a shared `reqwest::Client`.
///
/// The timeout bounds the whole request (connect, send, and reading the
/// body), so a server that never answers fails with
/// [`TransportError::Timeout`] instead of hanging the payment attempt.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    config: TransportConfig,
}

impl HttpTransport {
    /// Build a transport from configuration.
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        if !config.verify_tls {
            #[cfg(feature = "tracing")]
            tracing::warn!("TLS certificate verification is disabled for processor requests");
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .danger_accept_invalid_certs(!config.verify_tls)
            .use_rustls_tls()
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// The configuration in use.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    fn map_reqwest_error(&self, url: &str, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout {
                target: url.to_string(),
                timeout_ms: self.config.timeout_ms,
            }
        } else if e.is_connect() {
            TransportError::Connect {
                target: url.to_string(),
                reason: e.to_string(),
            }
        } else if e.is_builder() {
            TransportError::Client(e.to_string())
        } else {
            TransportError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, request), fields(url = %request.url, body_len = request.body.len())))]
    async fn post(&self, request: PostRequest) -> Result<RawResponse, TransportError> {
        let PostRequest {
            url,
            body,
            bearer_token,
        } = request;

        let mut builder = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(body);

        if let Some(token) = bearer_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(&url, e))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_reqwest_error(&url, e))?;

        #[cfg(feature = "tracing")]
        tracing::debug!(status, body_len = body.len(), "processor responded");

        Ok(RawResponse::new(status, body.to_vec()))
    }
}
