//! GCash cash-in.

use serde::{Deserialize, Serialize};

/// One line of a GCash cash-in request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashInDetail {
    /// Payment method code (e.g., `GCSB`).
    pub payment_method: String,
    /// Payment method identifier.
    #[serde(rename = "paymentMethodID")]
    pub payment_method_id: u64,
    /// Institution aggregator identifier.
    #[serde(rename = "institutionAggregatorID")]
    pub institution_aggregator_id: u64,
    /// Amount in pesos.
    pub amount: f64,
    /// Free-form description shown to the payer.
    pub description: String,
    /// Payer email.
    pub email: String,
    /// Payer first name.
    pub first_name: String,
    /// Payer last name.
    pub last_name: String,
    /// Payment category identifier.
    #[serde(rename = "paymentCategoryID")]
    pub payment_category_id: u64,
    /// Institution identifier.
    #[serde(rename = "institutionID")]
    pub institution_id: u64,
    /// Aggregator identifier.
    #[serde(rename = "aggregatorID")]
    pub aggregator_id: u64,
}

/// Payload for the GCash cash-in call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashInPayload {
    /// Person code from the login response.
    pub person_code: String,
    /// Wallet code from the login response.
    pub wallet_code: String,
    /// Transaction lines.
    pub transaction_details: Vec<CashInDetail>,
}

/// `data` object of a cash-in response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CashInResult {
    /// Where to send the payer to complete the payment.
    pub url: String,
    /// All other fields, untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail() -> CashInDetail {
        CashInDetail {
            payment_method: "GCSB".into(),
            payment_method_id: 131,
            institution_aggregator_id: 28644,
            amount: 1.0,
            description: "Order #1001".into(),
            email: "payer@example.com".into(),
            first_name: "Juan".into(),
            last_name: "Dela Cruz".into(),
            payment_category_id: 3,
            institution_id: 36837,
            aggregator_id: 11,
        }
    }

    #[test]
    fn test_detail_field_names() {
        let value = serde_json::to_value(detail()).unwrap();
        let obj = value.as_object().unwrap();
        for key in [
            "paymentMethod",
            "paymentMethodID",
            "institutionAggregatorID",
            "amount",
            "description",
            "email",
            "firstName",
            "lastName",
            "paymentCategoryID",
            "institutionID",
            "aggregatorID",
        ] {
            assert!(obj.contains_key(key), "missing {}", key);
        }
        assert_eq!(obj.len(), 11);
    }

    #[test]
    fn test_payload_shape() {
        let payload = CashInPayload {
            person_code: "P1".into(),
            wallet_code: "W1".into(),
            transaction_details: vec![detail()],
        };
        let value = serde_json::to_value(payload).unwrap();
        assert_eq!(value["personCode"], "P1");
        assert_eq!(value["walletCode"], "W1");
        assert_eq!(value["transactionDetails"][0]["paymentMethodID"], 131);
    }

    #[test]
    fn test_result_requires_url() {
        assert!(serde_json::from_str::<CashInResult>(r#"{"status":"pending"}"#).is_err());
        let result: CashInResult =
            serde_json::from_str(r#"{"url":"https://pay.test/r/1","status":"pending"}"#).unwrap();
        assert_eq!(result.url, "https://pay.test/r/1");
        assert_eq!(result.extra["status"], "pending");
    }
}
