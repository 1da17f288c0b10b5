//! Processor wire schemas.
//!
//! Every call has the same outer shape. The request body is
//!
//! ```text
//! {"data": "<Base64 Salted__ envelope of the JSON payload>"}
//! ```
//!
//! and a successful response is a plain (unencrypted) JSON object whose
//! result lives under `data`.
//!
//! # Endpoints
//!
//! | Call                | Default path                                          | Auth          |
//! |---------------------|-------------------------------------------------------|---------------|
//! | Login               | `/api/v1/auth/login/thirdparty`                       | none          |
//! | Transaction details | `/api/v1/transactions/details/aggregator`             | bearer token  |
//! | GCash cash-in       | `/api/v1/transactions/external/funds/cash-in/gcash`   | bearer token  |

mod cash_in;
mod login;
mod transaction;

pub use cash_in::*;
pub use login::*;
pub use transaction::*;

use serde::{Deserialize, Deserializer, Serialize};

/// Outer request body carrying an envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedRequest {
    /// Base64 envelope.
    pub data: String,
}

impl EncryptedRequest {
    /// Wrap an envelope.
    pub fn new(envelope: impl Into<String>) -> Self {
        Self {
            data: envelope.into(),
        }
    }
}

/// Outer response body.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ApiResponse<T> {
    /// Call result.
    pub data: T,
}

/// Accept a JSON string or number as a string.
///
/// The processor has returned codes in both forms.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypted_request_shape() {
        let body = serde_json::to_string(&EncryptedRequest::new("U2FsdGVkX1")).unwrap();
        assert_eq!(body, r#"{"data":"U2FsdGVkX1"}"#);
    }

    #[test]
    fn test_api_response_requires_data() {
        let parsed: Result<ApiResponse<serde_json::Value>, _> =
            serde_json::from_str(r#"{"message":"Unauthorized"}"#);
        assert!(parsed.is_err());
    }
}
