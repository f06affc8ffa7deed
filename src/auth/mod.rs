//! Principal resolution
//!
//! Every QA route needs the caller's subject id: it is the first segment of
//! every object key the request may read.
//!
//! # Module Structure
//!
//! - [`auth::jwt`](crate::auth::jwt) - Bearer token decoding
//! - [`auth::middleware`](crate::auth::middleware) - Axum layer and extractor
//!
//! # Sources
//!
//! 1. With the `lambda` feature, claims placed in the request context by an
//!    API Gateway authorizer
//! 2. `Authorization: Bearer <jwt>`, HS256-verified when `JWT_SECRET` is set
//!
//! ## Extracting Claims in Handlers
//!
//! ```ignore
//! async fn handler(AuthUser(claims): AuthUser) -> impl IntoResponse {
//!     format!("Hello, {}!", claims.sub)
//! }
//! ```

/// Bearer token decoding.
pub mod jwt;
/// Authentication middleware and extractors for protected routes.
pub mod middleware;
