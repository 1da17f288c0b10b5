use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::{PostRequest, RawResponse, TransportError};

/// Sends one JSON POST and returns the raw response.
///
/// Implementations must not retry, and must bound every call by their
/// configured timeout. Non-2xx statuses are returned as a [`RawResponse`];
/// classifying them is left to [`decode_json`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform the request.
    async fn post(&self, request: PostRequest) -> Result<RawResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn post(&self, request: PostRequest) -> Result<RawResponse, TransportError> {
        (**self).post(request).await
    }
}

/// Decode a JSON body, surfacing non-2xx statuses as [`TransportError::Remote`].
pub fn decode_json<T: DeserializeOwned>(response: &RawResponse) -> Result<T, TransportError> {
    if !response.is_success() {
        return Err(TransportError::Remote {
            status: response.status,
            body: response.text(),
        });
    }

    serde_json::from_slice(&response.body).map_err(|e| TransportError::MalformedResponse {
        raw: response.text(),
        reason: e.to_string(),
    })
}
