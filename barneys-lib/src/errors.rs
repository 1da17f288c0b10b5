//! Error types for processor operations.
//!
//! Component failures (TOTP, envelope, transport) are collected into a
//! [`Cause`] and wrapped into the error of the step that was running, so a
//! caller always learns *which* phase of the handshake failed and *why*.
//! Nothing in this crate retries on its own; [`BarneysError::is_retryable`]
//! only tells the host whether doing so is worthwhile.

use crate::attempt::AttemptState;
use crate::envelope::EnvelopeError;
use crate::submit::GCASH_CASH_IN_OPERATION;
use crate::totp::TotpError;
use crate::transport::TransportError;

/// Stable error codes for host integrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum BarneysErrorCode {
    /// Invalid configuration
    InvalidConfig = 1000,
    /// Authentication step failed
    Auth = 3000,
    /// Post-login submission failed
    Submit = 4000,
    /// Illegal payment attempt transition
    InvalidState = 5000,
    /// Commerce host collaborator failed
    Host = 6000,
}

/// Why a protocol step failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Cause {
    /// Code generation failed (bad secret or parameters).
    #[error(transparent)]
    Totp(#[from] TotpError),

    /// Envelope could not be produced or opened.
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    /// Network, HTTP status or response decoding failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Payload could not be serialized to JSON.
    #[error("failed to encode payload: {0}")]
    Encode(String),

    /// The session lacks a field this call needs.
    #[error("session has no {0}")]
    MissingSessionField(&'static str),
}

impl Cause {
    /// Underlying transport error, if any.
    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            Self::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Cause {
    fn from(err: serde_json::Error) -> Self {
        Self::Encode(err.to_string())
    }
}

/// Errors returned by the processor client.
#[derive(Debug, thiserror::Error)]
pub enum BarneysError {
    /// Configuration is unusable.
    #[error("invalid {field}: {reason}")]
    Config {
        /// Offending field
        field: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Login handshake failed.
    #[error("authentication failed: {cause}")]
    Auth {
        /// Underlying failure
        cause: Cause,
    },

    /// A call made with the session failed.
    #[error("{operation} failed: {cause}")]
    Submit {
        /// Which submitter was running
        operation: &'static str,
        /// Underlying failure
        cause: Cause,
    },

    /// A payment attempt was driven out of order.
    #[error("invalid payment attempt transition {from:?} -> {to:?}")]
    InvalidState {
        /// Current state
        from: AttemptState,
        /// Requested state
        to: AttemptState,
    },

    /// The commerce host reported a failure.
    #[error("commerce host error: {0}")]
    Host(String),
}

impl BarneysError {
    /// Get the error code.
    pub fn code(&self) -> BarneysErrorCode {
        match self {
            Self::Config { .. } => BarneysErrorCode::InvalidConfig,
            Self::Auth { .. } => BarneysErrorCode::Auth,
            Self::Submit { .. } => BarneysErrorCode::Submit,
            Self::InvalidState { .. } => BarneysErrorCode::InvalidState,
            Self::Host(_) => BarneysErrorCode::Host,
        }
    }

    /// The step failure, for `Auth` and `Submit` errors.
    pub fn cause(&self) -> Option<&Cause> {
        match self {
            Self::Auth { cause } | Self::Submit { cause, .. } => Some(cause),
            _ => None,
        }
    }

    /// HTTP status the processor answered with, if that is what failed.
    pub fn remote_status(&self) -> Option<u16> {
        self.cause()
            .and_then(Cause::transport)
            .and_then(TransportError::status)
    }

    /// Returns true if repeating the whole handshake could succeed without
    /// charging twice.
    ///
    /// Login failures and transaction lookups retry on any transient
    /// transport error. A cash-in may already have been accepted once its
    /// request left the client, so it only retries when the connection was
    /// never made.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Submit {
                operation: GCASH_CASH_IN_OPERATION,
                cause,
            } => cause
                .transport()
                .is_some_and(TransportError::is_unsent),
            Self::Auth { cause } | Self::Submit { cause, .. } => {
                cause.transport().is_some_and(TransportError::is_transient)
            }
            _ => false,
        }
    }

    /// Suggested delay before a retry, in milliseconds.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self.cause().and_then(Cause::transport)? {
            TransportError::Remote { status: 429, .. } => Some(5000),
            TransportError::Remote { .. } => Some(2000),
            TransportError::Timeout { .. } => Some(1000),
            TransportError::Connect { .. } => Some(2000),
            TransportError::Network(_) => Some(1000),
            _ => None,
        }
    }

    /// Create a configuration error.
    pub fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
