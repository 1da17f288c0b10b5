//! Login handshake.
//!
//! The credential is encrypted under a code derived from the merchant's
//! default secret and posted without an `Authorization` header. The
//! response carries the bearer token and the session secret that key every
//! later call.

use std::fmt;

use crate::client::ProcessorClient;
use crate::errors::Cause;
use crate::protocol::{Credential, LoginData};
use crate::totp::CodeGenerator;
use crate::transport::{PostRequest, Transport, TransportError};
use crate::{BarneysError, Result};

/// Result of a successful login.
///
/// Owned by the payment attempt that created it (or by the session cache,
/// when pooling is enabled).
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    access_token: String,
    session_secret: String,
    person_code: Option<String>,
    wallet_code: Option<String>,
}

impl Session {
    /// Session from a token and a Base32 secret.
    pub fn new(access_token: impl Into<String>, session_secret: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            session_secret: session_secret.into(),
            person_code: None,
            wallet_code: None,
        }
    }

    /// Attach the merchant's person and wallet codes.
    pub fn with_wallet(mut self, person_code: impl Into<String>, wallet_code: impl Into<String>) -> Self {
        self.person_code = Some(person_code.into());
        self.wallet_code = Some(wallet_code.into());
        self
    }

    /// Bearer token.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Base32 secret keying post-login payloads.
    pub fn session_secret(&self) -> &str {
        &self.session_secret
    }

    /// Person code, if the login response had one.
    pub fn person_code(&self) -> Option<&str> {
        self.person_code.as_deref()
    }

    /// Wallet code, if the login response had one.
    pub fn wallet_code(&self) -> Option<&str> {
        self.wallet_code.as_deref()
    }

    fn from_login(data: LoginData) -> Result<Self, Cause> {
        let raw = format!("{:?}", data);
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        let missing = match (non_empty(data.access_token), non_empty(data.secret_key)) {
            (Some(access_token), Some(session_secret)) => {
                return Ok(Self {
                    access_token,
                    session_secret,
                    person_code: data.person_code,
                    wallet_code: data.wallet_code,
                })
            }
            (None, _) => "data.accessToken",
            (_, None) => "data.secretKey",
        };

        Err(TransportError::MalformedResponse {
            raw,
            reason: format!("missing {}", missing),
        }
        .into())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"******")
            .field("session_secret", &"******")
            .field("person_code", &self.person_code)
            .field("wallet_code", &self.wallet_code)
            .finish()
    }
}

impl<T, G> ProcessorClient<T, G>
where
    T: Transport,
    G: CodeGenerator,
{
    /// Log in with `credential` and return the session.
    ///
    /// Requires HTTP 200 and non-empty `data.accessToken` and
    /// `data.secretKey`. Every failure is reported as
    /// [`BarneysError::Auth`].
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, credential), fields(username = %credential.username)))]
    pub async fn authenticate(&self, credential: &Credential) -> Result<Session> {
        let result = self.login(credential).await;

        #[cfg(feature = "tracing")]
        match &result {
            Ok(_) => tracing::info!("processor login succeeded"),
            Err(e) => tracing::warn!(error = %e, "processor login failed"),
        }

        result.map_err(|cause| BarneysError::Auth { cause })
    }

    async fn login(&self, credential: &Credential) -> Result<Session, Cause> {
        let body = self.seal(credential, self.config().default_secret.expose())?;
        let request = PostRequest::new(self.config().login_url(), body);
        let data: LoginData = self.exchange(request).await?;
        Session::from_login(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{fixtures, MockTransport, RecordingCodeGenerator};

    fn client(transport: MockTransport) -> ProcessorClient<MockTransport, RecordingCodeGenerator> {
        ProcessorClient::with_parts(
            fixtures::config("https://processor.test"),
            transport,
            RecordingCodeGenerator::at(fixtures::FIXTURE_TIME),
        )
    }

    #[tokio::test]
    async fn test_login_uses_default_secret_and_no_bearer() {
        let transport = MockTransport::new();
        transport.push_json(200, fixtures::login_response("tok1", "SECKEY"));
        let client = client(transport);

        let session = client
            .authenticate(&fixtures::credential())
            .await
            .unwrap();
        assert_eq!(session.access_token(), "tok1");
        assert_eq!(session.session_secret(), "SECKEY");

        assert_eq!(client.codes().secrets(), vec![fixtures::DEFAULT_SECRET]);

        let requests = client.transport().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].url,
            "https://processor.test/api/v1/auth/login/thirdparty"
        );
        assert!(requests[0].bearer_token.is_none());

        let payload = fixtures::open_request(&requests[0].body, fixtures::DEFAULT_SECRET);
        assert_eq!(
            payload,
            serde_json::json!({"username": "merchant", "password": "api-key", "applicationId": 1})
        );
    }

    #[tokio::test]
    async fn test_login_captures_wallet_codes() {
        let transport = MockTransport::new();
        transport.push_json(
            200,
            serde_json::json!({"data": {
                "accessToken": "tok1",
                "secretKey": "SECKEY",
                "personCode": "P-100",
                "walletCode": 42
            }}),
        );
        let session = client(transport)
            .authenticate(&fixtures::credential())
            .await
            .unwrap();
        assert_eq!(session.person_code(), Some("P-100"));
        assert_eq!(session.wallet_code(), Some("42"));
    }

    #[tokio::test]
    async fn test_login_missing_secret_key() {
        let transport = MockTransport::new();
        transport.push_json(200, serde_json::json!({"data": {"accessToken": "tok1"}}));

        let err = client(transport)
            .authenticate(&fixtures::credential())
            .await
            .unwrap_err();
        match err {
            BarneysError::Auth {
                cause: Cause::Transport(TransportError::MalformedResponse { reason, .. }),
            } => assert!(reason.contains("secretKey")),
            other => panic!("expected malformed response, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_login_empty_token_is_rejected() {
        let transport = MockTransport::new();
        transport.push_json(200, fixtures::login_response("", "SECKEY"));

        let err = client(transport)
            .authenticate(&fixtures::credential())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("accessToken"));
    }

    #[tokio::test]
    async fn test_login_requires_exact_200() {
        let transport = MockTransport::new();
        transport.push_json(201, fixtures::login_response("tok1", "SECKEY"));

        let err = client(transport)
            .authenticate(&fixtures::credential())
            .await
            .unwrap_err();
        assert_eq!(err.remote_status(), Some(201));
    }

    #[tokio::test]
    async fn test_login_transport_error_is_auth_error() {
        let transport = MockTransport::new();
        transport.push_error(TransportError::Network("connection reset".into()));

        let err = client(transport)
            .authenticate(&fixtures::credential())
            .await
            .unwrap_err();
        assert!(matches!(err, BarneysError::Auth { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_login_invalid_default_secret() {
        let config = fixtures::config("https://processor.test");
        let config = crate::config::ProcessorConfig {
            default_secret: crate::config::DefaultSecret::new("not base32!"),
            ..config
        };
        let client = ProcessorClient::with_parts(
            config,
            MockTransport::new(),
            RecordingCodeGenerator::at(fixtures::FIXTURE_TIME),
        );

        let err = client
            .authenticate(&fixtures::credential())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BarneysError::Auth {
                cause: Cause::Totp(_)
            }
        ));
        assert!(client.transport().requests().is_empty());
    }

    #[test]
    fn test_session_debug_redacts() {
        let debug = format!("{:?}", Session::new("tok1", "SECKEY"));
        assert!(!debug.contains("tok1"));
        assert!(!debug.contains("SECKEY"));
    }
}
