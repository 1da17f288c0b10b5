//! Processor client.
//!
//! [`ProcessorClient`] owns the configuration, a [`Transport`] and a
//! [`CodeGenerator`]. The handshake itself lives in
//! [`authenticate`](ProcessorClient::authenticate) and the submitters
//! ([`submit`](ProcessorClient::submit),
//! [`cash_in_gcash`](ProcessorClient::cash_in_gcash)); this module only
//! holds the pieces they share.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ProcessorConfig;
use crate::envelope;
use crate::errors::Cause;
use crate::protocol::{ApiResponse, EncryptedRequest};
use crate::totp::CodeGenerator;
use crate::transport::{decode_json, PostRequest, Transport, TransportError};
use crate::Result;

#[cfg(feature = "http-transport")]
use crate::{totp::Totp, transport::HttpTransport, BarneysError};

/// Client for the processor's login and transaction endpoints.
///
/// Stateless between calls: sessions are returned to the caller and passed
/// back in explicitly.
#[derive(Debug)]
pub struct ProcessorClient<T, G> {
    config: ProcessorConfig,
    transport: T,
    codes: G,
}

/// Client over HTTP with wall-clock codes.
#[cfg(feature = "http-transport")]
pub type HttpProcessorClient = ProcessorClient<HttpTransport, Totp>;

#[cfg(feature = "http-transport")]
impl ProcessorClient<HttpTransport, Totp> {
    /// Build an HTTP client from validated configuration.
    pub fn new(config: ProcessorConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(config.transport.clone())
            .map_err(|e| BarneysError::config("transport", e.to_string()))?;
        let codes = Totp::new(config.totp.clone());
        Ok(Self::with_parts(config, transport, codes))
    }
}

impl<T, G> ProcessorClient<T, G>
where
    T: Transport,
    G: CodeGenerator,
{
    /// Assemble a client from its parts.
    pub fn with_parts(config: ProcessorConfig, transport: T, codes: G) -> Self {
        Self {
            config,
            transport,
            codes,
        }
    }

    /// The configuration in use.
    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// The transport in use.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The code generator in use.
    pub fn codes(&self) -> &G {
        &self.codes
    }

    /// Serialize `payload`, encrypt it under the current code for `secret`
    /// and wrap it in the outer `{"data": …}` body.
    pub(crate) fn seal<P: Serialize>(&self, payload: &P, secret: &str) -> Result<Vec<u8>, Cause> {
        let plaintext = serde_json::to_vec(payload)?;
        let code = self.codes.generate(secret)?;
        let sealed = envelope::encrypt(&plaintext, code.as_str());
        Ok(serde_json::to_vec(&EncryptedRequest::new(sealed))?)
    }

    /// Send `request` and decode the `data` object of a 200 response.
    ///
    /// Any other status, including other 2xx codes, is a
    /// [`TransportError::Remote`].
    pub(crate) async fn exchange<R: DeserializeOwned>(
        &self,
        request: PostRequest,
    ) -> Result<R, Cause> {
        let response = self.transport.post(request).await?;
        if response.status != 200 {
            return Err(TransportError::Remote {
                status: response.status,
                body: response.text(),
            }
            .into());
        }
        let body: ApiResponse<R> = decode_json(&response)?;
        Ok(body.data)
    }
}
