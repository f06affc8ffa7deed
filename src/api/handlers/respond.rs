use crate::{
    api::body::JsonBody,
    api::response::JsonReply,
    auth::middleware::AuthUser,
    rag::{QaMode, QaOutput, QaRequest},
    types::{AppError, ConversationRequest, Result},
    AppState,
};
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};

/// Answer a question about an indexed document within a conversation.
///
/// Prior turns of `conversationid` are used to rewrite follow-up questions;
/// the question and answer are then appended to the conversation. The body
/// is the answer as a JSON string, or a
/// [`SourcedAnswer`](crate::types::SourcedAnswer) when
/// `includeSources` is set.
#[utoipa::path(
    post,
    path = "/generate-response/{conversationid}",
    params(("conversationid" = String, Path, description = "Conversation whose history is read and appended")),
    request_body = ConversationRequest,
    responses(
        (status = 200, description = "Answer as a JSON string, or a SourcedAnswer object when includeSources is true", body = String),
        (status = 400, description = "Malformed request"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No index for this document"),
        (status = 500, description = "History store not configured"),
        (status = 503, description = "Model invocation failed")
    ),
    tag = "qa",
    security(("bearer" = []))
)]
pub async fn generate_response(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(conversation_id): Path<String>,
    JsonBody(payload): JsonBody<ConversationRequest>,
) -> Result<Response> {
    tracing::info!(
        user_id = %claims.sub,
        file_name = %payload.file_name,
        conversation_id = %conversation_id,
        "Conversational request"
    );

    let output = state
        .pipeline
        .run(QaRequest {
            user_id: claims.sub,
            file_name: payload.file_name,
            mode: QaMode::Conversational {
                conversation_id,
                question: payload.prompt,
                include_sources: payload.include_sources,
            },
        })
        .await?;

    match output {
        QaOutput::Answer(answer) => {
            tracing::info!(answer_len = answer.len(), "Conversational answer");
            Ok(JsonReply(answer).into_response())
        }
        QaOutput::Sourced(sourced) => {
            tracing::info!(
                answer_len = sourced.answer.len(),
                sources = sourced.source_documents.len(),
                "Conversational answer"
            );
            Ok(JsonReply(sourced).into_response())
        }
        QaOutput::Extraction(_) => Err(AppError::Internal(
            "Conversational request produced an extraction".to_string(),
        )),
    }
}
