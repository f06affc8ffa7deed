//! Response formatting.
//!
//! Every JSON response leaves the service with the same header set: a JSON
//! content type and a permissive CORS triplet. Success and error paths both
//! go through [`json_response`].

use axum::{
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// CORS headers attached to every response.
pub const CORS_HEADERS: [(&str, &str); 3] = [
    ("access-control-allow-headers", "*"),
    ("access-control-allow-origin", "*"),
    ("access-control-allow-methods", "*"),
];

/// Build the fixed response header set.
pub fn response_headers() -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(CORS_HEADERS.len() + 1);
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    for (name, value) in CORS_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    headers
}

/// Serialize `body` as JSON and wrap it with the fixed header set.
pub fn json_response<T: Serialize + ?Sized>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => (status, response_headers(), bytes).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize response body");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                response_headers(),
                br#"{"error":"Internal error: failed to serialize response"}"#.to_vec(),
            )
                .into_response()
        }
    }
}

/// A `200 OK` JSON reply.
///
/// A `String` payload is encoded as a JSON string literal, so the
/// conversational answer arrives as `"..."` rather than raw text.
#[derive(Debug)]
pub struct JsonReply<T>(pub T);

impl<T: Serialize> IntoResponse for JsonReply<T> {
    fn into_response(self) -> Response {
        json_response(StatusCode::OK, &self.0)
    }
}
