use crate::{
    api::body::JsonBody,
    api::response::JsonReply,
    auth::middleware::AuthUser,
    rag::{QaMode, QaOutput, QaRequest},
    types::{AppError, ExtractionRequest, ExtractionResponse, Result},
    AppState,
};
use axum::extract::{Path, State};

/// Extract patient details from an indexed document.
///
/// Asks four fixed questions (age, name, medications, diagnosis) against the
/// caller's document, each independently and without chat history.
#[utoipa::path(
    post,
    path = "/generate-info/{conversationid}",
    params(("conversationid" = String, Path, description = "Conversation id; accepted but not used for extraction")),
    request_body = ExtractionRequest,
    responses(
        (status = 200, description = "Extracted fields", body = ExtractionResponse),
        (status = 400, description = "Malformed request"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No index for this document"),
        (status = 503, description = "Model invocation failed")
    ),
    tag = "qa",
    security(("bearer" = []))
)]
pub async fn generate_info(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(conversation_id): Path<String>,
    JsonBody(payload): JsonBody<ExtractionRequest>,
) -> Result<JsonReply<ExtractionResponse>> {
    tracing::info!(
        user_id = %claims.sub,
        file_name = %payload.file_name,
        conversation_id = %conversation_id,
        "Extraction request"
    );

    let output = state
        .pipeline
        .run(QaRequest {
            user_id: claims.sub,
            file_name: payload.file_name,
            mode: QaMode::Extraction,
        })
        .await?;

    match output {
        QaOutput::Extraction(response) => {
            tracing::info!(
                age = %response.age,
                name = %response.name,
                meds = %response.meds,
                injury = %response.injury,
                "Extraction result"
            );
            Ok(JsonReply(response))
        }
        _ => Err(AppError::Internal(
            "Extraction produced a conversational answer".to_string(),
        )),
    }
}
