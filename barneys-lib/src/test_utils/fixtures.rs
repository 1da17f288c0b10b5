//! Test fixtures and data generators.

use crate::config::ProcessorConfig;
use crate::envelope;
use crate::protocol::{CashInDetail, Credential, EncryptedRequest};
use crate::totp::{generate, TotpParams};

/// Default secret used by test configurations.
pub const DEFAULT_SECRET: &str = "ZJGAXJIPORDSMGQE";

/// Timestamp used by fixed-clock generators (2024-06-06T00:00:00Z).
pub const FIXTURE_TIME: u64 = 1_717_632_000;

/// Code for [`DEFAULT_SECRET`] at [`FIXTURE_TIME`] with processor parameters.
pub const DEFAULT_SECRET_CODE: &str = "455742";

/// Reference number seen in processor examples.
pub const REFERENCE_NUMBER: &str = "DRT202406061486792";

/// Envelope of `{"referenceNumber":"DRT202406061486792"}` under password
/// `123456`, produced by `openssl enc -aes-256-cbc -md md5 -base64 -A`.
pub const OPENSSL_REFERENCE_ENVELOPE: &str =
    "U2FsdGVkX1+qg+Xah31sPKAgRfYEyUnyTofRkh2UKxPHj/Bzq09PFofAq4CWHHDzOskqYJT3LBr0TksOfNIgtA==";

/// Test configuration pointing at `base_url`.
pub fn config(base_url: &str) -> ProcessorConfig {
    ProcessorConfig::new(base_url, DEFAULT_SECRET)
}

/// Merchant credential.
pub fn credential() -> Credential {
    Credential::new("merchant", "api-key")
}

/// Successful login response body.
pub fn login_response(access_token: &str, secret_key: &str) -> serde_json::Value {
    serde_json::json!({
        "data": {
            "accessToken": access_token,
            "secretKey": secret_key,
        }
    })
}

/// A GCash line for `amount`.
pub fn cash_in_detail(amount: f64) -> CashInDetail {
    CashInDetail {
        payment_method: "GCSB".to_string(),
        payment_method_id: 131,
        institution_aggregator_id: 28644,
        amount,
        description: "Order #1001".to_string(),
        email: "payer@example.com".to_string(),
        first_name: "Juan".to_string(),
        last_name: "Dela Cruz".to_string(),
        payment_category_id: 3,
        institution_id: 36837,
        aggregator_id: 11,
    }
}

/// Decrypt a captured request body the way the processor would.
///
/// Assumes the request was sealed at [`FIXTURE_TIME`] under `secret`.
///
/// # Panics
///
/// Panics if the body is not a valid envelope for that code.
pub fn open_request(body: &[u8], secret: &str) -> serde_json::Value {
    let request: EncryptedRequest = serde_json::from_slice(body).unwrap();
    let code = generate(secret, &TotpParams::default(), FIXTURE_TIME).unwrap();
    let plaintext = envelope::decrypt(&request.data, code.as_str()).unwrap();
    serde_json::from_slice(&plaintext).unwrap()
}
