//! Remote key set tests against a mock JWKS endpoint.

use std::sync::Arc;
use std::time::Duration;

use auth_gate::jwt::{Claims, JwkCache, TokenValidator};
use auth_gate::observability::GateMetrics;
use auth_gate::principal::Role;
use auth_gate::GateError;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{now, NOW};

const KID: &str = "hotel-key-1";

fn jwks_body() -> serde_json::Value {
    serde_json::from_str(include_str!("../fixtures/jwks.json")).unwrap()
}

fn rs256_token(kid: &str) -> String {
    let key = EncodingKey::from_rsa_pem(include_bytes!("../fixtures/rsa_private.pem")).unwrap();
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let claims = Claims {
        sub: "svc-reporting".to_string(),
        roles: vec![Role::new("ROLE_ADMIN")],
        exp: NOW + 600,
        iat: Some(NOW),
        nbf: None,
        iss: None,
    };
    encode(&header, &claims, &key).unwrap()
}

async fn cache_for(server: &MockServer) -> Arc<JwkCache> {
    let url = Url::parse(&format!("{}/.well-known/jwks.json", server.uri())).unwrap();
    Arc::new(JwkCache::new(url, Duration::from_secs(300)).unwrap())
}

#[tokio::test]
async fn test_refreshed_keys_validate_rs256_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/.well-known/jwks.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks_body()))
        .mount(&server)
        .await;

    let cache = cache_for(&server).await;
    assert_eq!(cache.refresh().await.unwrap(), 1);
    assert!(!cache.is_stale());

    let validator = TokenValidator::new(cache.clone());
    let principal = validator.validate(&rs256_token(KID), now()).unwrap();
    assert_eq!(principal.subject(), "svc-reporting");
    assert!(principal.has_role(&Role::new("ADMIN")));

    assert!(matches!(
        validator.validate(&rs256_token("rotated-away"), now()),
        Err(GateError::TokenSignatureInvalid)
    ));
}

#[tokio::test]
async fn test_hmac_token_is_refused_by_jwks_resolver() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks_body()))
        .mount(&server)
        .await;

    let cache = cache_for(&server).await;
    cache.refresh().await.unwrap();

    let hs256 = crate::common::token_for("mallory", &["ADMIN"]);
    assert!(matches!(
        TokenValidator::new(cache).validate(&hs256, now()),
        Err(GateError::TokenSignatureInvalid)
    ));
}

#[tokio::test]
async fn test_concurrent_refreshes_share_one_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(jwks_body())
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let cache = cache_for(&server).await;
    let (a, b) = tokio::join!(cache.refresh(), cache.refresh());
    assert_eq!(a.unwrap(), 1);
    assert_eq!(b.unwrap(), 1);
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_keys() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks_body()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let metrics = Arc::new(GateMetrics::new().unwrap());
    let url = Url::parse(&format!("{}/jwks.json", server.uri())).unwrap();
    let cache = Arc::new(
        JwkCache::new(url, Duration::from_secs(300))
            .unwrap()
            .with_metrics(Arc::clone(&metrics)),
    );

    cache.refresh().await.unwrap();
    let err = cache.refresh().await.unwrap_err();
    assert!(matches!(err, GateError::KeyStore { .. }));
    assert_eq!(cache.key_count(), 1);

    assert!(TokenValidator::new(cache.clone())
        .validate(&rs256_token(KID), now())
        .is_ok());
    assert_eq!(metrics.jwks_refreshes.with_label_values(&["success"]).get(), 1);
    assert_eq!(metrics.jwks_refreshes.with_label_values(&["failure"]).get(), 1);
    assert_eq!(metrics.jwks_keys.get(), 1);
}

#[tokio::test]
async fn test_cancelled_refresh_does_not_pin_stale_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(jwks_body())
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let cache = cache_for(&server).await;
    let cancelled = tokio::time::timeout(Duration::from_millis(20), cache.refresh()).await;
    assert!(cancelled.is_err());

    for _ in 0..3 {
        assert_eq!(cache.refresh().await.unwrap(), 1);
    }

    let fetches = server.received_requests().await.unwrap().len();
    assert!(fetches >= 3, "expected fresh fetches after cancellation, got {fetches}");
}
