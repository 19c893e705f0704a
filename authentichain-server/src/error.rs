//! API error handling module
//!
//! Provides a unified error type for all API endpoints with structured error variants.

use authentichain_core::RegistryError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// API error type with structured variants for different error categories
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request - client provided invalid input
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Not found - requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error - unexpected server-side failure
    #[error("Internal error: {0}")]
    Internal(String),

    /// Service unavailable - required service is not configured or available
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Caller identity error with specific error code
    #[error("{message}")]
    AuthError { message: String, code: String },

    /// Registry error - rejected state transition or invalid registry input
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}

impl ApiError {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create an internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a service unavailable error
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Create a caller identity error with a specific error code
    pub fn auth_error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AuthError {
            message: message.into(),
            code: code.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::AuthError { .. } => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Registry(ref e) => match e {
                // Lookups of things that were never created → 404
                RegistryError::NotCommitted(_)
                | RegistryError::UnknownRequest(_)
                | RegistryError::NoRequestFor(_) => StatusCode::NOT_FOUND,

                // Request or commitment is in the wrong state → 409
                RegistryError::AlreadyCommitted(_)
                | RegistryError::AlreadyFulfilled(_)
                | RegistryError::NotFulfilled { .. }
                | RegistryError::Expired(_)
                | RegistryError::BalanceOverflow { .. } => StatusCode::CONFLICT,

                // Identity not allowed to perform this call → 403
                RegistryError::NotRequester { .. }
                | RegistryError::NotOwner
                | RegistryError::UnauthorizedCallback(_) => StatusCode::FORBIDDEN,

                // Unfavorable verdict → 422 Unprocessable Entity
                RegistryError::LocationNotVerified { .. } => StatusCode::UNPROCESSABLE_ENTITY,

                RegistryError::InsufficientFee { .. } => StatusCode::PAYMENT_REQUIRED,

                // Client-provided invalid input → 400
                RegistryError::RequestRequired
                | RegistryError::MalformedVerdict(_)
                | RegistryError::InvalidInput(_) => StatusCode::BAD_REQUEST,

                // Attestation network failures → 502
                RegistryError::Attestation(_) | RegistryError::Http(_) => StatusCode::BAD_GATEWAY,

                RegistryError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Get the error code for programmatic error handling
    fn error_code(&self) -> &str {
        match self {
            Self::BadRequest(_) => "INVALID_INPUT",
            Self::AuthError { code, .. } => code.as_str(),
            Self::NotFound(_) => "NOT_FOUND",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Registry(ref e) => match e {
                RegistryError::AlreadyCommitted(_) => "ALREADY_COMMITTED",
                RegistryError::NotCommitted(_) => "NOT_COMMITTED",
                RegistryError::UnknownRequest(_) => "UNKNOWN_REQUEST",
                RegistryError::AlreadyFulfilled(_) => "ALREADY_FULFILLED",
                RegistryError::NotFulfilled { .. } => "NOT_FULFILLED",
                RegistryError::NotRequester { .. } => "NOT_REQUESTER",
                RegistryError::Expired(_) => "REQUEST_EXPIRED",
                RegistryError::LocationNotVerified { .. } => "LOCATION_NOT_VERIFIED",
                RegistryError::NotOwner => "NOT_OWNER",
                RegistryError::UnauthorizedCallback(_) => "UNAUTHORIZED_CALLBACK",
                RegistryError::InsufficientFee { .. } => "INSUFFICIENT_FEE",
                RegistryError::BalanceOverflow { .. } => "BALANCE_OVERFLOW",
                RegistryError::RequestRequired => "REQUEST_REQUIRED",
                RegistryError::NoRequestFor(_) => "NO_REQUEST",
                RegistryError::MalformedVerdict(_) => "MALFORMED_VERDICT",
                RegistryError::InvalidInput(_) => "INVALID_INPUT",
                RegistryError::Serialization(_) => "SERIALIZATION_ERROR",
                RegistryError::Attestation(_) => "ATTESTATION_UNAVAILABLE",
                RegistryError::Http(_) => "UPSTREAM_ERROR",
            },
        }
    }

    /// Get sanitized error message for client response
    fn client_message(&self) -> String {
        match self {
            // Upstream and internal failures hide their details
            Self::Registry(RegistryError::Attestation(_)) => {
                "Attestation service unavailable".to_string()
            }
            Self::Registry(RegistryError::Http(_)) => "Upstream service error".to_string(),
            Self::Registry(RegistryError::Serialization(_)) => {
                "Registry serialization error".to_string()
            }
            Self::Registry(ref e) => e.to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Get the error category for logging
    fn error_category(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::AuthError { .. } => "auth_error",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "internal",
            Self::ServiceUnavailable(_) => "service_unavailable",
            Self::Registry(_) => "registry",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let category = self.error_category();
        let code = self.error_code();
        let internal_message = self.to_string();
        let client_message = self.client_message();

        // Log based on severity, always including internal details
        if status.is_server_error() {
            tracing::error!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                client_message = %client_message,
                "Server error"
            );
        } else if matches!(self, Self::AuthError { .. }) || status == StatusCode::FORBIDDEN {
            tracing::warn!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                "Authorization error"
            );
        } else {
            tracing::warn!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                "Client error"
            );
        }

        // All error responses include a `code` field for programmatic error handling
        let body = serde_json::json!({
            "error": client_message,
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}
