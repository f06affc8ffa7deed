//! HTTP API Handlers and Routes
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//! - [`api::body`](crate::api::body) - Content-type agnostic JSON body extractor
//! - [`api::response`](crate::api::response) - JSON + CORS response formatting
//!
//! # API Endpoints
//!
//! - `POST /generate-info/{conversationid}` - Extract age, name, medications and diagnosis
//! - `POST /generate-response/{conversationid}` - Conversational question answering
//! - `GET /health` - Health check endpoint
//! - `GET /api-docs/openapi.json` - OpenAPI document
//!
//! # Authentication
//!
//! QA endpoints require a principal, either from an API Gateway authorizer
//! (`lambda` feature) or a bearer token:
//! ```text
//! Authorization: Bearer <token>
//! ```

/// Request body extraction.
pub mod body;
/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Response formatting shared by success and error paths.
pub mod response;
/// Router configuration and route definitions.
pub mod routes;
