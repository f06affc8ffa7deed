use crate::api::handlers::{self, ApiDoc};
use crate::api::response::JsonReply;
use crate::AppState;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(
            "/api-docs/openapi.json",
            get(|| async { JsonReply(ApiDoc::openapi()) }),
        );

    let protected_routes = Router::new()
        .route(
            "/generate-info/{conversationid}",
            post(handlers::extract::generate_info),
        )
        .route(
            "/generate-response/{conversationid}",
            post(handlers::respond::generate_response),
        )
        .layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            crate::auth::middleware::auth_middleware,
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    public_routes
        .merge(protected_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
