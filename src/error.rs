//! Error handling module with type-safe, non-exhaustive error types
//!
//! This module provides a unified error handling approach with:
//! - Non-exhaustive enums for forward compatibility
//! - A precise error code for logs and a coarse category for responses
//! - Automatic conversion from `jsonwebtoken` errors
//! - Sanitization of sensitive information in responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::policy::PolicyError;

/// Sensitive patterns that should be sanitized from error messages
const SENSITIVE_PATTERNS: &[&str] = &[
    "password",
    "secret",
    "token",
    "key",
    "credential",
    "bearer",
    "authorization",
    "private",
];

/// Errors raised by the gate, the token validator and the login step.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum GateError {
    /// No bearer token was presented
    #[error("Token missing from request")]
    TokenMissing,

    /// Token could not be parsed or decoded
    #[error("Token malformed: {reason}")]
    TokenMalformed {
        /// Description of the malformation
        reason: String,
    },

    /// Token is past its expiry
    #[error("Token expired at {expired_at}")]
    TokenExpired {
        /// When the token expired
        expired_at: DateTime<Utc>,
    },

    /// Token was not signed by trusted key material
    #[error("Token signature invalid")]
    TokenSignatureInvalid,

    /// Principal lacks the role the route requires
    #[error("Role {required} required")]
    RoleInsufficient {
        /// The role the route demands
        required: String,
    },

    /// No policy rule matched the request
    #[error("No access rule matches {path}")]
    RouteNotClassified {
        /// Path that fell through the table
        path: String,
    },

    /// Request path was rejected before classification
    #[error("Request path rejected: {reason}")]
    PathRejected {
        /// Why the path was rejected
        reason: String,
    },

    /// Login identifier or password did not match
    #[error("Bad credentials")]
    BadCredentials,

    /// Signing key material could not be loaded or refreshed
    #[error("Key store error: {reason}")]
    KeyStore {
        /// Description of the key store failure
        reason: String,
    },

    /// Route policy table is misconfigured
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// Internal error (details sanitized in responses)
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Precise error codes, used in logs and metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    TokenMissing,
    TokenMalformed,
    TokenExpired,
    TokenSignatureInvalid,
    RoleInsufficient,
    RouteNotClassified,
    PathRejected,
    BadCredentials,
    KeyStoreUnavailable,
    PolicyMisconfigured,
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TokenMissing => "AUTH_TOKEN_MISSING",
            Self::TokenMalformed => "AUTH_TOKEN_MALFORMED",
            Self::TokenExpired => "AUTH_TOKEN_EXPIRED",
            Self::TokenSignatureInvalid => "AUTH_TOKEN_SIGNATURE_INVALID",
            Self::RoleInsufficient => "AUTH_ROLE_INSUFFICIENT",
            Self::RouteNotClassified => "ROUTE_NOT_CLASSIFIED",
            Self::PathRejected => "PATH_REJECTED",
            Self::BadCredentials => "AUTH_BAD_CREDENTIALS",
            Self::KeyStoreUnavailable => "KEY_STORE_UNAVAILABLE",
            Self::PolicyMisconfigured => "POLICY_MISCONFIGURED",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    /// The response category this code collapses into
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::TokenMissing
            | Self::TokenMalformed
            | Self::TokenExpired
            | Self::TokenSignatureInvalid
            | Self::BadCredentials => ErrorCategory::Unauthenticated,
            Self::RoleInsufficient | Self::RouteNotClassified => ErrorCategory::Forbidden,
            Self::PathRejected => ErrorCategory::BadRequest,
            Self::KeyStoreUnavailable | Self::PolicyMisconfigured | Self::Internal => {
                ErrorCategory::Internal
            }
        }
    }

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> StatusCode {
        self.category().http_status()
    }
}

/// Coarse failure category exposed to clients.
///
/// Responses carry only the category so a caller cannot tell an expired
/// token from a forged one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Unauthenticated,
    Forbidden,
    BadRequest,
    Internal,
}

impl ErrorCategory {
    /// Category string sent in response bodies
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::Forbidden => "FORBIDDEN",
            Self::BadRequest => "BAD_REQUEST",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    /// HTTP status for the category
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "Full authentication is required to access this resource",
            Self::Forbidden => "Access is denied",
            Self::BadRequest => "The request was rejected",
            Self::Internal => "Internal error",
        }
    }
}

/// Structured error response with correlation ID
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// HTTP status code
    pub status: u16,
    /// Reason phrase of the status
    pub error: String,
    /// Failure category for programmatic handling
    pub code: &'static str,
    /// Human-readable message (uniform per category)
    pub message: String,
    /// Request path, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Correlation ID for tracing
    pub correlation_id: Uuid,
}

impl ErrorResponse {
    /// Create a new error response from a GateError
    pub fn from_error(error: &GateError, path: Option<&str>, correlation_id: Uuid) -> Self {
        let category = error.code().category();
        let status = category.http_status();

        ErrorResponse {
            status: status.as_u16(),
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            code: category.as_str(),
            message: category.message().to_string(),
            path: path.map(str::to_string),
            correlation_id,
        }
    }

    /// Convert to an HTTP response
    pub fn into_http_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, Json(self)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                axum::http::header::WWW_AUTHENTICATE,
                axum::http::HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}

impl GateError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::TokenMissing => ErrorCode::TokenMissing,
            Self::TokenMalformed { .. } => ErrorCode::TokenMalformed,
            Self::TokenExpired { .. } => ErrorCode::TokenExpired,
            Self::TokenSignatureInvalid => ErrorCode::TokenSignatureInvalid,
            Self::RoleInsufficient { .. } => ErrorCode::RoleInsufficient,
            Self::RouteNotClassified { .. } => ErrorCode::RouteNotClassified,
            Self::PathRejected { .. } => ErrorCode::PathRejected,
            Self::BadCredentials => ErrorCode::BadCredentials,
            Self::KeyStore { .. } => ErrorCode::KeyStoreUnavailable,
            Self::Policy(_) => ErrorCode::PolicyMisconfigured,
            Self::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Get the HTTP status this error maps to
    pub fn http_status(&self) -> StatusCode {
        self.code().http_status()
    }

    /// True for the token rejections that end in 401
    pub fn is_unauthenticated(&self) -> bool {
        self.code().category() == ErrorCategory::Unauthenticated
    }

    /// Build the HTTP response for this error on the given path
    pub fn to_response(&self, path: Option<&str>, correlation_id: Uuid) -> Response {
        ErrorResponse::from_error(self, path, correlation_id).into_http_response()
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let correlation_id = Uuid::new_v4();
        tracing::info!(
            correlation_id = %correlation_id,
            error_code = self.code().as_str(),
            "Request rejected"
        );
        self.to_response(None, correlation_id)
    }
}

/// Sanitize a message by removing sensitive information
pub fn sanitize_message(message: &str) -> String {
    if contains_sensitive_info(message) {
        return "details redacted".to_string();
    }
    message.to_string()
}

/// Check if a string contains sensitive information
pub fn contains_sensitive_info(text: &str) -> bool {
    let lower = text.to_lowercase();
    SENSITIVE_PATTERNS.iter().any(|p| lower.contains(p))
}

// ============================================================================
// From trait implementations for automatic error conversion
// ============================================================================

impl From<jsonwebtoken::errors::Error> for GateError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => GateError::TokenExpired {
                expired_at: Utc::now(),
            },
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidIssuer
            | ErrorKind::InvalidKeyFormat
            | ErrorKind::InvalidEcdsaKey
            | ErrorKind::InvalidRsaKey(_) => GateError::TokenSignatureInvalid,
            ErrorKind::ImmatureSignature => GateError::TokenMalformed {
                reason: "not yet valid".to_string(),
            },
            ErrorKind::InvalidToken
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::MissingAlgorithm
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => GateError::TokenMalformed {
                reason: sanitize_message(&err.to_string()),
            },
            ErrorKind::MissingRequiredClaim(claim) => GateError::TokenMalformed {
                reason: format!("missing claim {claim}"),
            },
            _ => GateError::TokenMalformed {
                reason: "validation failed".to_string(),
            },
        }
    }
}

impl From<reqwest::Error> for GateError {
    fn from(err: reqwest::Error) -> Self {
        let reason = if err.is_timeout() {
            "JWKS request timed out".to_string()
        } else if err.is_connect() {
            "JWKS endpoint unreachable".to_string()
        } else {
            sanitize_message(&err.to_string())
        };
        GateError::KeyStore { reason }
    }
}
