/// Document extraction handler.
pub mod extract;
/// Liveness handler.
pub mod health;
/// Conversational QA handler.
pub mod respond;

use crate::types::{
    ConversationRequest, ExtractionRequest, ExtractionResponse, SourceDocument, SourcedAnswer,
};
use utoipa::OpenApi;

/// OpenAPI document for the service.
#[derive(OpenApi)]
#[openapi(
    info(title = "docqa-server", description = "Question answering over indexed documents"),
    paths(extract::generate_info, respond::generate_response, health::health_check),
    components(schemas(
        ExtractionRequest,
        ExtractionResponse,
        ConversationRequest,
        SourcedAnswer,
        SourceDocument
    )),
    tags(
        (name = "qa", description = "Document question answering"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;
