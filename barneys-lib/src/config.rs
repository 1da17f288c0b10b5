//! Processor client configuration.
//!
//! Endpoint URLs, the default secret, TOTP parameters and transport
//! settings are all configuration; nothing about the target environment is
//! compiled in.
//!
//! # Environment Variables
//!
//! [`ProcessorConfig::from_env`] reads:
//! - `BARNEYS_API_URL` - processor base URL (required)
//! - `BARNEYS_DEFAULT_SECRET` - Base32 default secret (required)
//! - `BARNEYS_TIMEOUT_MS` - request timeout in milliseconds
//! - `BARNEYS_VERIFY_TLS` - `false`/`0` disables certificate checks
//! - `BARNEYS_SESSION_TTL_SECS` - enables session pooling with this TTL

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::totp::TotpParams;
use crate::transport::TransportConfig;
use crate::{BarneysError, Result};

/// Processor SIT (system integration test) base URL.
pub const SIT_BASE_URL: &str = "https://sitapi2.traxionpay.com";

/// Longest accepted session pooling TTL (one day).
pub const MAX_SESSION_POOL_TTL_SECS: u64 = 86_400;

/// The merchant's long-lived secret used only to key login payloads.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefaultSecret(String);

impl DefaultSecret {
    /// Wrap a Base32 secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// The secret value.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the secret is empty.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for DefaultSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DefaultSecret(******)")
    }
}

/// Endpoint paths relative to the base URL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointPaths {
    /// Third-party login.
    #[serde(default = "default_login_path")]
    pub login: String,
    /// Transaction details by reference number.
    #[serde(default = "default_transaction_path")]
    pub transaction_details: String,
    /// GCash cash-in.
    #[serde(default = "default_gcash_cash_in_path")]
    pub gcash_cash_in: String,
}

fn default_login_path() -> String {
    "/api/v1/auth/login/thirdparty".to_string()
}

fn default_transaction_path() -> String {
    "/api/v1/transactions/details/aggregator".to_string()
}

fn default_gcash_cash_in_path() -> String {
    "/api/v1/transactions/external/funds/cash-in/gcash".to_string()
}

impl Default for EndpointPaths {
    fn default() -> Self {
        Self {
            login: default_login_path(),
            transaction_details: default_transaction_path(),
            gcash_cash_in: default_gcash_cash_in_path(),
        }
    }
}

/// Configuration for [`ProcessorClient`](crate::ProcessorClient).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Base URL (e.g., `https://sitapi2.traxionpay.com`).
    pub base_url: String,

    /// Default secret for login payloads.
    pub default_secret: DefaultSecret,

    /// Endpoint paths.
    #[serde(default)]
    pub endpoints: EndpointPaths,

    /// TOTP parameters shared by both handshake phases.
    #[serde(default)]
    pub totp: TotpParams,

    /// HTTP settings.
    #[serde(default)]
    pub transport: TransportConfig,

    /// Reuse sessions across attempts for this many seconds.
    ///
    /// `None` re-authenticates on every payment attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_pool_ttl_secs: Option<u64>,
}

impl ProcessorConfig {
    /// Create a configuration with default paths and transport settings.
    pub fn new(base_url: impl Into<String>, default_secret: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            default_secret: DefaultSecret::new(default_secret),
            endpoints: EndpointPaths::default(),
            totp: TotpParams::default(),
            transport: TransportConfig::default(),
            session_pool_ttl_secs: None,
        }
    }

    /// Configuration for the processor's SIT environment.
    pub fn sit(default_secret: impl Into<String>) -> Self {
        Self::new(SIT_BASE_URL, default_secret)
    }

    /// Load from `BARNEYS_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("BARNEYS_API_URL")
            .map_err(|_| BarneysError::config("BARNEYS_API_URL", "not set"))?;
        let secret = std::env::var("BARNEYS_DEFAULT_SECRET")
            .map_err(|_| BarneysError::config("BARNEYS_DEFAULT_SECRET", "not set"))?;

        let mut config = Self::new(base_url, secret);

        if let Ok(timeout) = std::env::var("BARNEYS_TIMEOUT_MS") {
            let timeout_ms = timeout
                .parse()
                .map_err(|_| BarneysError::config("BARNEYS_TIMEOUT_MS", "not a number"))?;
            config = config.with_timeout_ms(timeout_ms);
        }

        if let Ok(verify) = std::env::var("BARNEYS_VERIFY_TLS") {
            config = config.with_verify_tls(parse_bool(&verify).ok_or_else(|| {
                BarneysError::config("BARNEYS_VERIFY_TLS", "expected true or false")
            })?);
        }

        if let Ok(ttl) = std::env::var("BARNEYS_SESSION_TTL_SECS") {
            let ttl = ttl
                .parse()
                .map_err(|_| BarneysError::config("BARNEYS_SESSION_TTL_SECS", "not a number"))?;
            config = config.with_session_pool_ttl(ttl);
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the request timeout.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.transport.timeout_ms = timeout_ms;
        self
    }

    /// Enable or disable TLS certificate verification.
    pub fn with_verify_tls(mut self, verify: bool) -> Self {
        self.transport.verify_tls = verify;
        self
    }

    /// Set TOTP parameters.
    pub fn with_totp(mut self, totp: TotpParams) -> Self {
        self.totp = totp;
        self
    }

    /// Set endpoint paths.
    pub fn with_endpoints(mut self, endpoints: EndpointPaths) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Enable session pooling.
    pub fn with_session_pool_ttl(mut self, secs: u64) -> Self {
        self.session_pool_ttl_secs = Some(secs);
        self
    }

    /// Full login URL.
    pub fn login_url(&self) -> String {
        self.url(&self.endpoints.login)
    }

    /// Full transaction details URL.
    pub fn transaction_url(&self) -> String {
        self.url(&self.endpoints.transaction_details)
    }

    /// Full GCash cash-in URL.
    pub fn gcash_cash_in_url(&self) -> String {
        self.url(&self.endpoints.gcash_cash_in)
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        let base = self.base_url.trim();
        if base.is_empty() {
            return Err(BarneysError::config("base_url", "must not be empty"));
        }
        if !(base.starts_with("https://") || base.starts_with("http://")) {
            return Err(BarneysError::config(
                "base_url",
                "must start with http:// or https://",
            ));
        }
        if self.default_secret.is_empty() {
            return Err(BarneysError::config("default_secret", "must not be empty"));
        }
        self.totp
            .validate()
            .map_err(|e| BarneysError::config("totp", e.to_string()))?;
        if self
            .session_pool_ttl_secs
            .is_some_and(|ttl| ttl > MAX_SESSION_POOL_TTL_SECS)
        {
            return Err(BarneysError::config(
                "session_pool_ttl_secs",
                format!("must be at most {} seconds", MAX_SESSION_POOL_TTL_SECS),
            ));
        }
        if self.transport.timeout_ms == 0 {
            return Err(BarneysError::config(
                "transport.timeout_ms",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Texts the commerce host shows to shoppers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewaySettings {
    /// Checkout title.
    #[serde(default = "default_title")]
    pub title: String,
    /// Checkout description.
    #[serde(default = "default_description")]
    pub description: String,
    /// Thank-you page and email instructions.
    #[serde(default = "default_instructions")]
    pub instructions: String,
}

fn default_title() -> String {
    "Barneys Payments Gateway".to_string()
}

fn default_description() -> String {
    "Pay with E-wallet".to_string()
}

fn default_instructions() -> String {
    "Pay with E-wallet.".to_string()
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            title: default_title(),
            description: default_description(),
            instructions: default_instructions(),
        }
    }
}
