//! Scripted transport and recording code generator.

use std::collections::VecDeque;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::totp::{CodeGenerator, FixedClock, Totp, TotpCode, TotpError, TotpParams};
use crate::transport::{PostRequest, RawResponse, Transport, TransportError};

/// Transport that replays queued responses and records every request.
///
/// Once the queue is empty every call fails with
/// [`TransportError::Network`].
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: RwLock<VecDeque<Result<RawResponse, TransportError>>>,
    requests: RwLock<Vec<PostRequest>>,
}

impl MockTransport {
    /// Create an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw response.
    pub fn push_response(&self, status: u16, body: impl Into<Vec<u8>>) {
        self.responses
            .write()
            .unwrap()
            .push_back(Ok(RawResponse::new(status, body)));
    }

    /// Queue a JSON response.
    pub fn push_json(&self, status: u16, body: serde_json::Value) {
        self.push_response(status, body.to_string());
    }

    /// Queue a transport failure.
    pub fn push_error(&self, error: TransportError) {
        self.responses.write().unwrap().push_back(Err(error));
    }

    /// Requests sent so far.
    pub fn requests(&self) -> Vec<PostRequest> {
        self.requests.read().unwrap().clone()
    }

    /// Number of responses not yet consumed.
    pub fn pending(&self) -> usize {
        self.responses.read().unwrap().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post(&self, request: PostRequest) -> Result<RawResponse, TransportError> {
        self.requests.write().unwrap().push(request);
        self.responses
            .write()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Network("no scripted response".to_string())))
    }
}

/// Fixed-clock TOTP generator that records every secret it is asked for.
#[derive(Debug)]
pub struct RecordingCodeGenerator {
    inner: Totp<FixedClock>,
    secrets: RwLock<Vec<String>>,
}

impl RecordingCodeGenerator {
    /// Processor parameters, clock pinned at `unix_time`.
    pub fn at(unix_time: u64) -> Self {
        Self {
            inner: Totp::with_clock(TotpParams::default(), FixedClock(unix_time)),
            secrets: RwLock::new(Vec::new()),
        }
    }

    /// Secrets requested so far, in order.
    pub fn secrets(&self) -> Vec<String> {
        self.secrets.read().unwrap().clone()
    }
}

impl CodeGenerator for RecordingCodeGenerator {
    fn generate(&self, secret: &str) -> Result<TotpCode, TotpError> {
        self.secrets.write().unwrap().push(secret.to_string());
        self.inner.generate(secret)
    }
}
