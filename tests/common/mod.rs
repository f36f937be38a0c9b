//! Shared fixtures: a fixed clock, an HMAC key pair and the hotel gate.

#![allow(dead_code)]

use std::sync::Arc;

use auth_gate::clock::FixedClock;
use auth_gate::jwt::{Claims, StaticKey, TokenIssuer, TokenValidator};
use auth_gate::policy::hotel_policy;
use auth_gate::principal::{Principal, Role};
use auth_gate::AuthGate;
use chrono::{DateTime, Utc};
use http::header::AUTHORIZATION;
use http::{HeaderMap, HeaderValue};
use jsonwebtoken::Algorithm;

pub const SECRET: &[u8] = b"hotel-booking-test-secret-0123456789abcdef";
pub const OTHER_SECRET: &[u8] = b"some-other-party-secret-0123456789abcdefgh";

/// 2023-11-14T22:13:20Z
pub const NOW: i64 = 1_700_000_000;

pub fn now() -> DateTime<Utc> {
    DateTime::from_timestamp(NOW, 0).unwrap()
}

pub fn issuer_with(secret: &[u8]) -> TokenIssuer {
    TokenIssuer::hmac(secret, Algorithm::HS256, chrono::Duration::hours(1)).unwrap()
}

pub fn validator() -> TokenValidator {
    TokenValidator::new(Arc::new(StaticKey::hmac(SECRET, Algorithm::HS256).unwrap()))
}

pub fn claims(sub: &str, roles: &[&str], exp: i64) -> Claims {
    Claims {
        sub: sub.to_string(),
        roles: roles.iter().map(|r| Role::new(r)).collect(),
        exp,
        iat: Some(NOW),
        nbf: None,
        iss: None,
    }
}

/// Valid token issued at [`NOW`] for one hour
pub fn token_for(sub: &str, roles: &[&str]) -> String {
    let principal = Principal::new(sub, roles.iter().map(|r| Role::new(r)));
    issuer_with(SECRET).issue(&principal, now()).unwrap().token
}

pub fn sign(claims: &Claims) -> String {
    issuer_with(SECRET).sign(claims).unwrap()
}

pub fn expired_token(sub: &str) -> String {
    sign(&claims(sub, &["USER"], NOW - 60))
}

pub fn gate() -> AuthGate {
    AuthGate::new(Arc::new(hotel_policy().unwrap()), Arc::new(validator()))
        .with_clock(Arc::new(FixedClock(now())))
}

pub fn bearer(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    );
    headers
}
