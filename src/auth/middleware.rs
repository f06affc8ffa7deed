use crate::auth::jwt::AuthService;
use crate::types::{AppError, Claims};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Resolve the principal and insert its [`Claims`] into request extensions.
pub async fn auth_middleware(
    State(auth_service): State<Arc<AuthService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = resolve_claims(&auth_service, &req)?;
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Authorizer claims when present, otherwise the bearer token.
pub fn resolve_claims(auth_service: &AuthService, req: &Request) -> Result<Claims, AppError> {
    if let Some(claims) = gateway_claims(req) {
        return Ok(claims);
    }

    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Auth("Missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Auth("Expected a Bearer token".to_string()))?;

    auth_service.verify_token(token.trim())
}

/// Claims already verified by an API Gateway authorizer.
#[cfg(feature = "lambda")]
fn gateway_claims(req: &Request) -> Option<Claims> {
    use lambda_http::request::RequestContext;
    use lambda_http::RequestExt;

    let claims = match req.request_context_ref()? {
        RequestContext::ApiGatewayV1(ctx) => {
            let claims = ctx.authorizer.fields.get("claims")?;
            Some(Claims {
                sub: claims.get("sub")?.as_str()?.to_string(),
                email: claims
                    .get("email")
                    .and_then(|v| v.as_str())
                    .map(str::to_string),
            })
        }
        RequestContext::ApiGatewayV2(ctx) => {
            let jwt = ctx.authorizer.as_ref()?.jwt.as_ref()?;
            Some(Claims {
                sub: jwt.claims.get("sub")?.clone(),
                email: jwt.claims.get("email").cloned(),
            })
        }
        _ => None,
    };
    claims.filter(|claims| !claims.sub.is_empty())
}

#[cfg(not(feature = "lambda"))]
fn gateway_claims(_req: &Request) -> Option<Claims> {
    None
}

/// Extractor for the authenticated principal
pub struct AuthUser(pub Claims);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| AppError::Auth("No authenticated principal".to_string()))
    }
}


#[cfg(all(test, feature = "lambda"))]
mod lambda_tests {
    use super::*;
    use axum::body::Body;
    use lambda_http::aws_lambda_events::apigw::{
        ApiGatewayProxyRequestContext, ApiGatewayRequestAuthorizerJwtDescription,
        ApiGatewayV2httpRequestContext,
    };
    use lambda_http::request::RequestContext;
    use lambda_http::RequestExt;
    use serde_json::json;

    fn with_context(context: RequestContext, auth: Option<&str>) -> Request {
        let mut builder = Request::builder().uri("/generate-response/c1");
        if let Some(value) = auth {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder
            .body(Body::empty())
            .unwrap()
            .with_request_context(context)
    }

    fn rest_api_context(claims: serde_json::Value) -> RequestContext {
        let mut ctx = ApiGatewayProxyRequestContext::default();
        ctx.authorizer.fields.insert("claims".to_string(), claims);
        RequestContext::ApiGatewayV1(ctx)
    }

    fn http_api_context(sub: &str) -> RequestContext {
        let mut jwt = ApiGatewayRequestAuthorizerJwtDescription::default();
        jwt.claims.insert("sub".to_string(), sub.to_string());
        jwt.claims
            .insert("email".to_string(), "http@example.com".to_string());

        let mut ctx = ApiGatewayV2httpRequestContext::default();
        let mut authorizer = ctx.authorizer.take().unwrap_or_default();
        authorizer.jwt = Some(jwt);
        ctx.authorizer = Some(authorizer);
        RequestContext::ApiGatewayV2(ctx)
    }

    #[test]
    fn test_rest_api_authorizer_claims() {
        let req = with_context(
            rest_api_context(json!({ "sub": "user-9", "email": "a@b" })),
            None,
        );

        let claims = gateway_claims(&req).unwrap();
        assert_eq!(claims.sub, "user-9");
        assert_eq!(claims.email.as_deref(), Some("a@b"));
    }

    #[test]
    fn test_http_api_jwt_claims() {
        let req = with_context(http_api_context("user-7"), None);

        let claims = gateway_claims(&req).unwrap();
        assert_eq!(claims.sub, "user-7");
        assert_eq!(claims.email.as_deref(), Some("http@example.com"));
    }

    #[test]
    fn test_empty_subject_is_not_a_principal() {
        let req = with_context(rest_api_context(json!({ "sub": "" })), None);
        assert!(gateway_claims(&req).is_none());

        let err = resolve_claims(&AuthService::new(None), &req).unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));

        let req = with_context(http_api_context(""), None);
        assert!(gateway_claims(&req).is_none());
    }

    #[test]
    fn test_authorizer_claims_take_precedence_over_bearer() {
        let req = with_context(
            rest_api_context(json!({ "sub": "user-9" })),
            Some("Bearer not-a-jwt"),
        );

        let claims = resolve_claims(&AuthService::new(Some("s3cret".to_string())), &req).unwrap();
        assert_eq!(claims.sub, "user-9");
    }
}
