use crate::types::AppError;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;

/// JSON request body, parsed regardless of `Content-Type`.
///
/// API Gateway and browser clients do not always send
/// `application/json`; any body that parses is accepted and anything else
/// is rejected as [`AppError::InvalidInput`].
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::InvalidInput(format!("Failed to read request body: {}", e)))?;

        serde_json::from_slice(&bytes)
            .map(JsonBody)
            .map_err(|e| AppError::InvalidInput(format!("Malformed request body: {}", e)))
    }
}
