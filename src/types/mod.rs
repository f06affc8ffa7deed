use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============= API Request/Response Types =============

/// Body of the extraction request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRequest {
    /// Name of the indexed document, as uploaded by the user
    pub file_name: String,
}

/// Body of the conversational request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRequest {
    /// Name of the indexed document, as uploaded by the user
    pub file_name: String,
    /// The user's question
    pub prompt: String,
    /// Return the retrieved snippets alongside the answer
    #[serde(default)]
    pub include_sources: bool,
}

/// Fields extracted from a document, one model answer per field.
///
/// Values are model text. Some prompts ask for JSON, which then arrives
/// embedded as a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ExtractionResponse {
    pub age: String,
    pub name: String,
    pub meds: String,
    pub injury: String,
}

/// A retrieved snippet that supported an answer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SourceDocument {
    pub content: String,
    #[schema(value_type = Object)]
    pub metadata: serde_json::Value,
    pub score: f32,
}

/// Conversational answer with its supporting snippets.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SourcedAnswer {
    pub answer: String,
    pub source_documents: Vec<SourceDocument>,
}

// ============= Authentication Types =============

/// Claims of the authenticated principal.
///
/// Only `sub` is required; it namespaces the user's objects in storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Index not found: {0}")]
    IndexNotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("LLM error: {0}")]
    LLM(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status this error is reported with.
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;

        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::IndexNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Storage(_) => StatusCode::BAD_GATEWAY,
            AppError::LLM(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Index(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Configuration(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        } else {
            tracing::warn!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = serde_json::json!({
            "error": self.to_string()
        });

        crate::api::response::json_response(status, &body)
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
