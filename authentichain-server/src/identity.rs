//! Caller identity extraction
//!
//! The server stands in for the host ledger's transaction sender. Every
//! state-changing call carries `Authorization: Bearer <token>`, an HS256 JWT
//! signed with the server's secret whose `sub` claim is the caller's address.

use authentichain_core::{unix_now, Address, CallContext};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

/// Claims of a caller token.
#[derive(Debug, Serialize, Deserialize)]
struct CallerClaims {
    /// Caller address, `0x` + 40 hex digits
    sub: String,
    /// Expiration time (validated by jsonwebtoken)
    exp: u64,
}

/// Signs and validates caller tokens with a shared HS256 secret.
#[derive(Clone)]
pub struct CallerAuth {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl CallerAuth {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_aud = false;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Issue a token naming `address` as the caller, valid for `ttl_secs`.
    pub fn issue(&self, address: Address, ttl_secs: u64) -> Result<String, ApiError> {
        let claims = CallerClaims {
            sub: address.to_string(),
            exp: unix_now().saturating_add(ttl_secs),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| {
            tracing::error!(error = %e, "Failed to sign caller token");
            ApiError::internal("Failed to sign caller token")
        })
    }

    /// Validate a token and return the address it was issued to.
    pub fn verify(&self, token: &str) -> Result<Address, ApiError> {
        let token_data = decode::<CallerClaims>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    ApiError::auth_error("AUTH_TOKEN_EXPIRED", "Caller token has expired")
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    ApiError::auth_error("AUTH_INVALID_TOKEN", "Invalid caller token signature")
                }
                _ => ApiError::auth_error(
                    "AUTH_INVALID_TOKEN",
                    format!("Caller token validation failed: {}", e),
                ),
            })?;

        token_data.claims.sub.parse::<Address>().map_err(|e| {
            ApiError::auth_error(
                "AUTH_INVALID_SUBJECT",
                format!("Token subject is not an address: {}", e),
            )
        })
    }
}

/// Extract the Bearer token from the Authorization header
fn extract_bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    let auth_header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| {
            ApiError::auth_error("AUTH_MISSING_TOKEN", "Missing Authorization header")
        })?;

    let auth_value = auth_header.to_str().map_err(|_| {
        ApiError::auth_error(
            "AUTH_INVALID_TOKEN",
            "Invalid Authorization header encoding",
        )
    })?;

    auth_value.strip_prefix("Bearer ").ok_or_else(|| {
        ApiError::auth_error(
            "AUTH_INVALID_TOKEN",
            "Authorization header must use Bearer scheme",
        )
    })
}

/// Authenticated caller extractor.
///
/// Validates the bearer token against the server's secret and yields the
/// address in its `sub` claim. Returns 401 with a structured error code on
/// any failure, and 503 when no secret is configured.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Address);

impl Caller {
    /// A call context for this caller at the current time.
    pub fn context(&self) -> CallContext {
        CallContext::now(self.0)
    }
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(parts)?;

        let auth = state.caller_auth.as_ref().ok_or_else(|| {
            ApiError::service_unavailable("Caller authentication not configured (missing JWT_SECRET)")
        })?;

        auth.verify(token).map(Caller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authentichain_core::{Registry, RegistryConfig};
    use axum::http::Request;

    const SECRET: &[u8] = b"identity-test-secret";

    fn address(last: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[19] = last;
        Address(bytes)
    }

    fn state(auth: Option<CallerAuth>) -> AppState {
        let registry = Registry::new(RegistryConfig::ungated(address(0xaa)));
        let state = AppState::new(registry, None);
        match auth {
            Some(auth) => state.with_caller_auth(auth),
            None => state,
        }
    }

    async fn extract(state: &AppState, authorization: Option<&str>) -> Result<Caller, ApiError> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = authorization {
            builder = builder.header("Authorization", value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        Caller::from_request_parts(&mut parts, state).await
    }

    fn code(err: &ApiError) -> &str {
        match err {
            ApiError::AuthError { code, .. } => code,
            _ => "",
        }
    }

    #[tokio::test]
    async fn test_valid_token_yields_subject() {
        let auth = CallerAuth::new(SECRET);
        let token = auth.issue(address(1), 60).unwrap();
        let state = state(Some(auth));

        let caller = extract(&state, Some(&format!("Bearer {token}"))).await.unwrap();
        assert_eq!(caller.0, address(1));
    }

    #[tokio::test]
    async fn test_missing_token() {
        let state = state(Some(CallerAuth::new(SECRET)));
        let err = extract(&state, None).await.unwrap_err();
        assert_eq!(code(&err), "AUTH_MISSING_TOKEN");
    }

    #[tokio::test]
    async fn test_non_bearer_scheme() {
        let state = state(Some(CallerAuth::new(SECRET)));
        let err = extract(&state, Some("Basic dXNlcjpwYXNz")).await.unwrap_err();
        assert_eq!(code(&err), "AUTH_INVALID_TOKEN");
    }

    #[tokio::test]
    async fn test_token_signed_with_other_secret() {
        let forged = CallerAuth::new(b"someone-else").issue(address(1), 60).unwrap();
        let state = state(Some(CallerAuth::new(SECRET)));

        let err = extract(&state, Some(&format!("Bearer {forged}"))).await.unwrap_err();
        assert_eq!(code(&err), "AUTH_INVALID_TOKEN");
    }

    #[tokio::test]
    async fn test_expired_token() {
        let auth = CallerAuth::new(SECRET);
        let claims = CallerClaims {
            sub: address(1).to_string(),
            exp: unix_now() - 3600,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &auth.encoding).unwrap();
        let state = state(Some(auth));

        let err = extract(&state, Some(&format!("Bearer {token}"))).await.unwrap_err();
        assert_eq!(code(&err), "AUTH_TOKEN_EXPIRED");
    }

    #[tokio::test]
    async fn test_subject_must_be_an_address() {
        let auth = CallerAuth::new(SECRET);
        let claims = CallerClaims {
            sub: "user_2abc".into(),
            exp: unix_now() + 60,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &auth.encoding).unwrap();
        let state = state(Some(auth));

        let err = extract(&state, Some(&format!("Bearer {token}"))).await.unwrap_err();
        assert_eq!(code(&err), "AUTH_INVALID_SUBJECT");
    }

    #[tokio::test]
    async fn test_unconfigured_auth_is_unavailable() {
        let state = state(None);
        let err = extract(&state, Some("Bearer anything")).await.unwrap_err();
        assert!(matches!(err, ApiError::ServiceUnavailable(_)));
    }
}
