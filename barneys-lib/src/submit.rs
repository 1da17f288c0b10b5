//! Calls made with an authenticated session.
//!
//! Each payload is encrypted under a fresh code from the session secret
//! (never the default secret) and sent with the session's bearer token.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::auth::Session;
use crate::client::ProcessorClient;
use crate::errors::Cause;
use crate::protocol::{CashInDetail, CashInPayload, CashInResult, TransactionRequest, TransactionResult};
use crate::totp::CodeGenerator;
use crate::transport::{PostRequest, Transport};
use crate::{BarneysError, Result};

/// Operation name of [`ProcessorClient::submit`] in errors and logs.
pub const TRANSACTION_OPERATION: &str = "transaction";

/// Operation name of [`ProcessorClient::cash_in_gcash`] in errors and logs.
pub const GCASH_CASH_IN_OPERATION: &str = "gcash cash-in";

impl<T, G> ProcessorClient<T, G>
where
    T: Transport,
    G: CodeGenerator,
{
    /// Fetch transaction details for `request.reference_number`.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, session, request), fields(reference = %request.reference_number)))]
    pub async fn submit(
        &self,
        session: &Session,
        request: &TransactionRequest,
    ) -> Result<TransactionResult> {
        let url = self.config().transaction_url();
        self.send_authorized(session, url, request)
            .await
            .map_err(|cause| failed(TRANSACTION_OPERATION, cause))
    }

    /// Start a GCash cash-in and return the payer redirect.
    ///
    /// The person and wallet codes come from the session; if either is
    /// missing nothing is sent.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, session, details), fields(lines = details.len())))]
    pub async fn cash_in_gcash(
        &self,
        session: &Session,
        details: Vec<CashInDetail>,
    ) -> Result<CashInResult> {
        let payload = cash_in_payload(session, details)
            .map_err(|cause| failed(GCASH_CASH_IN_OPERATION, cause))?;
        let url = self.config().gcash_cash_in_url();
        self.send_authorized(session, url, &payload)
            .await
            .map_err(|cause| failed(GCASH_CASH_IN_OPERATION, cause))
    }

    async fn send_authorized<P, R>(&self, session: &Session, url: String, payload: &P) -> Result<R, Cause>
    where
        P: Serialize + Sync,
        R: DeserializeOwned,
    {
        let body = self.seal(payload, session.session_secret())?;
        let request = PostRequest::new(url, body).with_bearer(session.access_token());
        self.exchange(request).await
    }
}

fn cash_in_payload(session: &Session, details: Vec<CashInDetail>) -> Result<CashInPayload, Cause> {
    let person_code = session
        .person_code()
        .ok_or(Cause::MissingSessionField("personCode"))?;
    let wallet_code = session
        .wallet_code()
        .ok_or(Cause::MissingSessionField("walletCode"))?;
    Ok(CashInPayload {
        person_code: person_code.to_string(),
        wallet_code: wallet_code.to_string(),
        transaction_details: details,
    })
}

fn failed(operation: &'static str, cause: Cause) -> BarneysError {
    #[cfg(feature = "tracing")]
    tracing::warn!(operation, error = %cause, "processor call failed");
    BarneysError::Submit { operation, cause }
}
