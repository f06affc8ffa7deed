use crate::types::{AppError, Claims, Result};
use jsonwebtoken::dangerous::insecure_decode;
use jsonwebtoken::{decode, get_current_timestamp, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

/// Clock skew tolerated on `exp`, matching `Validation::leeway`.
const EXPIRY_LEEWAY_SECS: u64 = 60;

/// Claims of a token whose signature was checked upstream.
#[derive(Debug, Deserialize)]
struct UnverifiedClaims {
    #[serde(flatten)]
    claims: Claims,
    exp: u64,
}

/// Resolves bearer tokens to [`Claims`].
///
/// With a secret, tokens must be HS256-signed with it. Without one, tokens
/// are assumed to have been verified upstream (API Gateway authorizer) and
/// only their claims and expiry are checked.
pub struct AuthService {
    jwt_secret: Option<String>,
}

impl AuthService {
    pub fn new(jwt_secret: Option<String>) -> Self {
        Self { jwt_secret }
    }

    pub fn verifies_signatures(&self) -> bool {
        self.jwt_secret.is_some()
    }

    /// Decode a token and return its claims.
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let claims = match &self.jwt_secret {
            Some(secret) => {
                let mut validation = Validation::new(Algorithm::HS256);
                // Identity-provider tokens carry a client id audience we do not pin
                validation.validate_aud = false;
                decode::<Claims>(
                    token,
                    &DecodingKey::from_secret(secret.as_bytes()),
                    &validation,
                )
                .map_err(|e| AppError::Auth(format!("Invalid token: {}", e)))?
                .claims
            }
            None => {
                let data = insecure_decode::<UnverifiedClaims>(token)
                    .map_err(|e| AppError::Auth(format!("Invalid token: {}", e)))?;
                if data.claims.exp.saturating_add(EXPIRY_LEEWAY_SECS) < get_current_timestamp() {
                    return Err(AppError::Auth("Invalid token: ExpiredSignature".to_string()));
                }
                data.claims.claims
            }
        };

        if claims.sub.trim().is_empty() {
            return Err(AppError::Auth("Token has an empty subject".to_string()));
        }
        Ok(claims)
    }
}
