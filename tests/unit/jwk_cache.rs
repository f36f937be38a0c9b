//! JWK conversion and in-memory key resolution tests.

use std::time::Duration;

use auth_gate::jwt::jwk_cache::jwk_to_decoding_key;
use auth_gate::jwt::{Jwk, JwkCache, Jwks, KeyResolver};
use auth_gate::GateError;
use jsonwebtoken::{Algorithm, Header};
use url::Url;

fn fixture_jwks() -> Jwks {
    serde_json::from_str(include_str!("../fixtures/jwks.json")).unwrap()
}

fn rsa_jwk() -> Jwk {
    fixture_jwks().keys.remove(0)
}

#[test]
fn test_fixture_rsa_key_is_accepted() {
    let jwk = rsa_jwk();
    assert_eq!(jwk.key_use.as_deref(), Some("sig"));
    assert!(jwk_to_decoding_key(&jwk).is_some());
}

#[test]
fn test_weak_and_foreign_keys_are_dropped() {
    let mut small = rsa_jwk();
    small.n = Some("AQAB".repeat(10));
    assert!(jwk_to_decoding_key(&small).is_none());

    let mut encryption = rsa_jwk();
    encryption.key_use = Some("enc".to_string());
    assert!(jwk_to_decoding_key(&encryption).is_none());

    let mut symmetric = rsa_jwk();
    symmetric.kty = "oct".to_string();
    assert!(jwk_to_decoding_key(&symmetric).is_none());

    let ec = Jwk {
        kty: "EC".to_string(),
        kid: "ec-1".to_string(),
        key_use: None,
        alg: None,
        n: None,
        e: None,
        x: Some("AAAA".to_string()),
        y: Some("AAAA".to_string()),
        crv: Some("secp256k1".to_string()),
    };
    assert!(jwk_to_decoding_key(&ec).is_none());
}

#[test]
fn test_empty_cache_resolution() {
    let cache = JwkCache::new(
        Url::parse("http://127.0.0.1:9/jwks.json").unwrap(),
        Duration::from_secs(300),
    )
    .unwrap();
    assert!(cache.is_stale());
    assert_eq!(cache.key_count(), 0);
    assert!(!cache.algorithms().contains(&Algorithm::HS256));

    let mut header = Header::new(Algorithm::RS256);
    assert!(matches!(
        cache.resolve(&header),
        Err(GateError::TokenMalformed { .. })
    ));

    header.kid = Some("unknown".to_string());
    assert!(matches!(
        cache.resolve(&header),
        Err(GateError::TokenSignatureInvalid)
    ));
}
