//! Barneys payment-processor client.
//!
//! Talks to the processor's third-party API with a two-phase handshake:
//!
//! 1. **Login**: the merchant credential is encrypted under a TOTP code
//!    derived from the merchant's default secret and exchanged for a bearer
//!    token and a rotating session secret.
//! 2. **Submit**: every later payload is encrypted under a fresh code from
//!    the session secret and sent with the bearer token.
//!
//! Payloads travel as OpenSSL-compatible `Salted__` AES-256-CBC envelopes
//! (see [`envelope`]); codes follow RFC 6238 with the processor's
//! parameters (see [`totp`]).
//!
//! # Features
//!
//! - `http-transport` (default): reqwest-backed [`HttpTransport`]
//! - `tracing` (default): spans and events through `tracing`
//! - `test-utils`: [`test_utils`] mocks and fixtures for downstream tests
//!
//! # Example
//!
//! ```ignore
//! use barneys_lib::{Credential, ProcessorClient, ProcessorConfig, TransactionRequest};
//!
//! let client = ProcessorClient::new(ProcessorConfig::from_env()?)?;
//! let session = client.authenticate(&Credential::new("merchant", "api-key")).await?;
//! let result = client
//!     .submit(&session, &TransactionRequest::new("DRT202406061486792"))
//!     .await?;
//! println!("status: {:?}", result.status);
//! ```

pub mod attempt;
pub mod auth;
pub mod client;
pub mod config;
pub mod envelope;
pub mod errors;
pub mod gateway;
pub mod protocol;
pub mod retry;
pub mod session_cache;
pub mod submit;
pub mod totp;
pub mod transport;

/// Test utilities for processor flows.
///
/// This module is only available with the `test-utils` feature or in test builds.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use attempt::{AttemptState, PaymentAttempt, Submission, SubmissionOutcome};
pub use auth::Session;
pub use client::ProcessorClient;
#[cfg(feature = "http-transport")]
pub use client::HttpProcessorClient;
pub use config::{DefaultSecret, EndpointPaths, GatewaySettings, ProcessorConfig};
pub use errors::{BarneysError, BarneysErrorCode, Cause};
pub use gateway::{CommerceHost, PaymentGateway, PaymentOutcome, PaymentStatus};
pub use protocol::{
    CashInDetail, CashInResult, Credential, TransactionRequest, TransactionResult,
};
pub use retry::{retry_with_backoff, RetryPolicy};
pub use session_cache::SessionCache;
pub use totp::{CodeGenerator, Totp, TotpCode, TotpParams};
#[cfg(feature = "http-transport")]
pub use transport::HttpTransport;
pub use transport::{Transport, TransportConfig, TransportError};

/// Common result alias for processor operations.
pub type Result<T, E = BarneysError> = std::result::Result<T, E>;
