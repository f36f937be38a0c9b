//! HTTP wiring for the binary
//!
//! The API router puts every route behind the auth gate. Business endpoints
//! live elsewhere; here every unclaimed route answers with a small echo of
//! what the gate decided, which is enough to exercise the policy end to end.

use std::sync::Arc;

use anyhow::Context;
use axum::extract::{OriginalUri, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::{Config, KeySource};
use crate::credentials::{BcryptPasswordHasher, InMemoryUserStore, LoginAuthenticator};
use crate::error::GateError;
use crate::extract::{Admin, RequireRole};
use crate::gate::AuthGate;
use crate::jwt::{JwkCache, KeyResolver, StaticKey, TokenIssuer, TokenValidator};
use crate::middleware::AuthGateLayer;
use crate::observability::GateMetrics;
use crate::policy::hotel_policy;
use crate::principal::Principal;

/// Login collaborators; absent when tokens are verified against a JWKS
/// endpoint, since this service then holds no signing key.
#[derive(Clone)]
pub struct LoginState {
    pub authenticator: Arc<LoginAuthenticator>,
    pub issuer: Arc<TokenIssuer>,
}

/// Shared state of the API router
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<AuthGate>,
    pub login: Option<LoginState>,
    pub clock: Arc<dyn Clock>,
}

/// Everything `main` needs to start serving
pub struct Components {
    pub state: AppState,
    /// Present in JWKS mode; its refresher must be spawned
    pub jwk_cache: Option<Arc<JwkCache>>,
}

/// Build the gate and login collaborators from configuration.
pub async fn assemble(config: &Config, metrics: Arc<GateMetrics>) -> anyhow::Result<Components> {
    let policy = hotel_policy().context("building route policy")?;

    let (keys, jwk_cache, login) = match &config.key_source {
        KeySource::Secret(secret) => {
            let keys: Arc<dyn KeyResolver> =
                Arc::new(StaticKey::hmac(secret, config.jwt_algorithm)?);
            (keys, None, Some(login_state(config, secret)?))
        }
        KeySource::Jwks(url) => {
            let cache = Arc::new(
                JwkCache::new(url.clone(), config.jwks_refresh_interval())?
                    .with_metrics(Arc::clone(&metrics)),
            );
            match cache.refresh().await {
                Ok(count) => info!(key_count = count, "Initial JWKS load complete"),
                Err(err) => warn!(error = %err, "Initial JWKS load failed, tokens will be rejected until a refresh succeeds"),
            }
            let keys: Arc<dyn KeyResolver> = cache.clone();
            (keys, Some(cache), None)
        }
    };

    let mut validator = TokenValidator::new(keys).with_leeway(config.jwt_leeway_seconds);
    if let Some(issuer) = &config.jwt_issuer {
        validator = validator.with_issuer(issuer.clone());
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let gate = AuthGate::new(Arc::new(policy), Arc::new(validator))
        .with_clock(Arc::clone(&clock))
        .with_metrics(metrics);

    Ok(Components {
        state: AppState {
            gate: Arc::new(gate),
            login,
            clock,
        },
        jwk_cache,
    })
}

fn login_state(config: &Config, secret: &[u8]) -> anyhow::Result<LoginState> {
    let users = match &config.users_file {
        Some(path) => InMemoryUserStore::from_json_file(path)?,
        None => {
            warn!("USERS_FILE not set, every login will be rejected");
            InMemoryUserStore::new()
        }
    };
    info!(users = users.len(), "Account store loaded");

    let hasher = Arc::new(BcryptPasswordHasher::new(config.bcrypt_cost)?);
    let authenticator = LoginAuthenticator::new(Arc::new(users), hasher)?;

    let mut issuer = TokenIssuer::hmac(secret, config.jwt_algorithm, config.token_ttl())?;
    if let Some(iss) = &config.jwt_issuer {
        issuer = issuer.with_issuer(iss.clone());
    }

    Ok(LoginState {
        authenticator: Arc::new(authenticator),
        issuer: Arc::new(issuer),
    })
}

/// API router with the auth gate in front of every route
pub fn build_router(state: AppState) -> Router {
    let gate = Arc::clone(&state.gate);

    let mut router = Router::new().route("/roles/:id", get(role_detail));
    if state.login.is_some() {
        router = router.route("/auth/login", post(login));
    }

    router
        .fallback(echo)
        .layer(AuthGateLayer::new(gate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Scrape endpoint, served on its own listener outside the gate
pub fn metrics_router(metrics: Arc<GateMetrics>) -> Router {
    Router::new()
        .route("/metrics", get(render_metrics))
        .route("/health", get(|| async { "ok" }))
        .with_state(metrics)
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    /// Seconds until expiry
    pub expires_in: i64,
}

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, GateError> {
    let login = state.login.as_ref().ok_or(GateError::BadCredentials)?;

    let principal = login
        .authenticator
        .authenticate(&request.username, &request.password)
        .await?;
    let issued = login.issuer.issue(&principal, state.clock.now())?;

    Ok(Json(LoginResponse {
        token: issued.token,
        token_type: "Bearer".to_string(),
        expires_in: login.issuer.ttl().num_seconds(),
    }))
}

async fn role_detail(
    axum::extract::Path(id): axum::extract::Path<String>,
    admin: RequireRole<Admin>,
) -> Json<serde_json::Value> {
    Json(json!({
        "role": id,
        "requested_by": admin.principal.subject(),
    }))
}

async fn echo(
    OriginalUri(uri): OriginalUri,
    principal: Option<Extension<Principal>>,
) -> Json<serde_json::Value> {
    let (subject, roles): (Option<String>, Vec<String>) = match principal {
        Some(Extension(p)) => (
            Some(p.subject().to_string()),
            p.roles().iter().map(|r| r.as_str().to_string()).collect(),
        ),
        None => (None, Vec::new()),
    };
    Json(json!({
        "path": uri.path(),
        "subject": subject,
        "roles": roles,
    }))
}

async fn render_metrics(State(metrics): State<Arc<GateMetrics>>) -> Response {
    match metrics.render() {
        Ok(body) => (
            [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(err) => {
            warn!(error = %err, "Failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
