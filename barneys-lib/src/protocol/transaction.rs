//! Transaction details lookup.

use serde::{Deserialize, Serialize};

/// Payload for the transaction details call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    /// Processor reference number (e.g., `DRT202406061486792`).
    pub reference_number: String,
}

impl TransactionRequest {
    /// Look up `reference_number`.
    pub fn new(reference_number: impl Into<String>) -> Self {
        Self {
            reference_number: reference_number.into(),
        }
    }
}

/// `data` object of a transaction details response.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionResult {
    /// Processor status, when reported as a string or number.
    #[serde(
        default,
        deserialize_with = "super::string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<String>,
    /// All other fields, untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let json = serde_json::to_string(&TransactionRequest::new("DRT202406061486792")).unwrap();
        assert_eq!(json, r#"{"referenceNumber":"DRT202406061486792"}"#);
    }

    #[test]
    fn test_result_keeps_unknown_fields() {
        let result: TransactionResult =
            serde_json::from_str(r#"{"status":"ok","amount":150.5,"referenceNumber":"R1"}"#)
                .unwrap();
        assert_eq!(result.status.as_deref(), Some("ok"));
        assert_eq!(result.extra["referenceNumber"], "R1");
        assert_eq!(result.extra.len(), 2);
    }

    #[test]
    fn test_numeric_status() {
        let result: TransactionResult =
            serde_json::from_str(r#"{"status":200,"amount":1}"#).unwrap();
        assert_eq!(result.status.as_deref(), Some("200"));
        assert_eq!(result.extra["amount"], 1);

        let result: TransactionResult = serde_json::from_str(r#"{"status":null}"#).unwrap();
        assert_eq!(result.status, None);
    }
}
