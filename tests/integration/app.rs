//! Router fixture with a fixed clock and two accounts.

use std::sync::Arc;

use auth_gate::clock::FixedClock;
use auth_gate::credentials::{
    BcryptPasswordHasher, InMemoryUserStore, LoginAuthenticator, PasswordHasher, UserDetails,
};
use auth_gate::principal::Role;
use auth_gate::server::{build_router, AppState, LoginState};
use axum::body::Body;
use axum::Router;
use http::{Request, Response};
use http_body_util::BodyExt;
use tower::ServiceExt;

use crate::common::{gate, issuer_with, now, SECRET};

pub const ADMIN_PASSWORD: &str = "admin-pass-123";
pub const GUEST_PASSWORD: &str = "guest-pass-456";

pub fn router() -> Router {
    let hasher = Arc::new(BcryptPasswordHasher::new(4).unwrap());
    let store = InMemoryUserStore::with_users([
        UserDetails {
            username: "admin".to_string(),
            password_hash: hasher.hash(ADMIN_PASSWORD).unwrap(),
            roles: vec![Role::new("ROLE_ADMIN")],
        },
        UserDetails {
            username: "guest".to_string(),
            password_hash: hasher.hash(GUEST_PASSWORD).unwrap(),
            roles: vec![Role::new("ROLE_USER")],
        },
    ]);
    let authenticator = LoginAuthenticator::new(Arc::new(store), hasher).unwrap();

    build_router(AppState {
        gate: Arc::new(gate()),
        login: Some(LoginState {
            authenticator: Arc::new(authenticator),
            issuer: Arc::new(issuer_with(SECRET)),
        }),
        clock: Arc::new(FixedClock(now())),
    })
}

pub async fn send(request: Request<Body>) -> Response<Body> {
    router().oneshot(request).await.unwrap()
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
