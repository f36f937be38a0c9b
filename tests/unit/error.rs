//! Error code and response tests.

use auth_gate::error::{contains_sensitive_info, ErrorResponse};
use auth_gate::policy::PolicyError;
use auth_gate::{ErrorCode, GateError};
use http::StatusCode;
use uuid::Uuid;

#[test]
fn test_error_code_strings() {
    let cases = [
        (GateError::TokenMissing, "AUTH_TOKEN_MISSING"),
        (GateError::TokenSignatureInvalid, "AUTH_TOKEN_SIGNATURE_INVALID"),
        (
            GateError::RouteNotClassified { path: "/x".into() },
            "ROUTE_NOT_CLASSIFIED",
        ),
        (GateError::BadCredentials, "AUTH_BAD_CREDENTIALS"),
        (GateError::Policy(PolicyError::NotTotal), "POLICY_MISCONFIGURED"),
    ];
    for (err, code) in cases {
        assert_eq!(err.code().as_str(), code);
    }
}

#[test]
fn test_status_mapping() {
    assert_eq!(ErrorCode::TokenExpired.http_status(), StatusCode::UNAUTHORIZED);
    assert_eq!(ErrorCode::RoleInsufficient.http_status(), StatusCode::FORBIDDEN);
    assert_eq!(ErrorCode::PathRejected.http_status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        ErrorCode::KeyStoreUnavailable.http_status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn test_internal_details_never_reach_body() {
    let err = GateError::Internal(anyhow::anyhow!("db password=hunter2 rejected"));
    let body = ErrorResponse::from_error(&err, None, Uuid::new_v4());
    let json = serde_json::to_string(&body).unwrap();
    assert!(!json.contains("hunter2"));
    assert!(!contains_sensitive_info(&body.message));
}

#[test]
fn test_unauthenticated_response_challenges_bearer() {
    let response = GateError::TokenMissing.to_response(Some("/roles/1"), Uuid::new_v4());
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(http::header::WWW_AUTHENTICATE).unwrap(),
        "Bearer"
    );

    let forbidden = GateError::RoleInsufficient {
        required: "ADMIN".into(),
    }
    .to_response(None, Uuid::new_v4());
    assert!(forbidden.headers().get(http::header::WWW_AUTHENTICATE).is_none());
}

#[test]
fn test_jsonwebtoken_error_mapping() {
    use jsonwebtoken::errors::{Error, ErrorKind};

    let sig: GateError = Error::from(ErrorKind::InvalidSignature).into();
    assert!(matches!(sig, GateError::TokenSignatureInvalid));

    let token: GateError = Error::from(ErrorKind::InvalidToken).into();
    assert!(matches!(token, GateError::TokenMalformed { .. }));
}
