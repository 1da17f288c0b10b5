//! Login payload and response.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::string_or_number;

fn default_application_id() -> u32 {
    1
}

/// Merchant API credential, encrypted into the login payload.
///
/// Serializes as exactly `{"username":…,"password":…,"applicationId":…}`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    /// API username.
    pub username: String,
    /// API key.
    pub password: String,
    /// Application identifier.
    #[serde(default = "default_application_id")]
    pub application_id: u32,
}

impl Credential {
    /// Credential for the default application.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            application_id: default_application_id(),
        }
    }

    /// Use a different application identifier.
    pub fn with_application_id(mut self, application_id: u32) -> Self {
        self.application_id = application_id;
        self
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"******")
            .field("application_id", &self.application_id)
            .finish()
    }
}

/// `data` object of a login response.
///
/// Token and secret are optional here so that a 200 without them can be
/// reported as a malformed response rather than a decode error.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    /// Bearer token for post-login calls.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Base32 session secret.
    #[serde(default)]
    pub secret_key: Option<String>,
    /// Merchant person code.
    #[serde(default, deserialize_with = "string_or_number")]
    pub person_code: Option<String>,
    /// Merchant wallet code.
    #[serde(default, deserialize_with = "string_or_number")]
    pub wallet_code: Option<String>,
}

impl fmt::Debug for LoginData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginData")
            .field("access_token", &self.access_token.as_ref().map(|_| "******"))
            .field("secret_key", &self.secret_key.as_ref().map(|_| "******"))
            .field("person_code", &self.person_code)
            .field("wallet_code", &self.wallet_code)
            .finish()
    }
}
