//! JWK Cache with background refresh and single-flight fetching
//!
//! Request-path lookups only read the current snapshot. Fetching happens in
//! [`JwkCache::refresh`], driven at startup and by a periodic background
//! task; concurrent refreshes share one HTTP request. When a refresh fails,
//! the previous snapshot keeps serving.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use jsonwebtoken::{Algorithm, DecodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};
use url::Url;

use crate::error::GateError;
use crate::jwt::keys::KeyResolver;
use crate::observability::GateMetrics;

/// Minimum RSA modulus length in base64url characters (2048 bits)
const MIN_RSA_MODULUS_B64_LEN: usize = 342;

const ASYMMETRIC_ALGORITHMS: &[Algorithm] = &[
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
    Algorithm::ES256,
    Algorithm::ES384,
];

/// JSON Web Key structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type (RSA, EC)
    pub kty: String,
    /// Key ID
    pub kid: String,
    /// Key use (sig, enc)
    #[serde(rename = "use", default)]
    pub key_use: Option<String>,
    #[serde(default)]
    pub alg: Option<String>,
    #[serde(default)]
    pub n: Option<String>,
    #[serde(default)]
    pub e: Option<String>,
    #[serde(default)]
    pub x: Option<String>,
    #[serde(default)]
    pub y: Option<String>,
    #[serde(default)]
    pub crv: Option<String>,
}

/// JSON Web Key Set structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

/// Immutable snapshot of the trusted keys.
#[derive(Default)]
struct KeySet {
    keys: HashMap<String, Arc<DecodingKey>>,
    fetched_at: Option<Instant>,
}

type InflightFuture = Shared<BoxFuture<'static, Result<usize, Arc<GateError>>>>;

/// Remote key set cached in memory.
pub struct JwkCache {
    snapshot: Arc<ArcSwap<KeySet>>,
    jwks_url: Url,
    ttl: Duration,
    inflight: Mutex<Option<InflightFuture>>,
    http_client: reqwest::Client,
    metrics: Option<Arc<GateMetrics>>,
}

impl JwkCache {
    /// Creates an empty cache. Call [`refresh`](Self::refresh) before serving.
    pub fn new(jwks_url: Url, ttl: Duration) -> Result<Self, GateError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| GateError::KeyStore {
                reason: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            snapshot: Arc::new(ArcSwap::from_pointee(KeySet::default())),
            jwks_url,
            ttl,
            inflight: Mutex::new(None),
            http_client,
            metrics: None,
        })
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<GateMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Whether the snapshot is older than the TTL (or was never loaded)
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.snapshot
            .load()
            .fetched_at
            .map_or(true, |at| at.elapsed() >= self.ttl)
    }

    #[must_use]
    pub fn key_count(&self) -> usize {
        self.snapshot.load().keys.len()
    }

    /// Fetch the key set, coalescing concurrent callers into one request.
    ///
    /// A slot whose future already resolved is stale and gets replaced, so a
    /// leader cancelled mid-fetch never pins an old result.
    #[instrument(skip(self), fields(url = %self.jwks_url))]
    pub async fn refresh(&self) -> Result<usize, GateError> {
        let mut inflight_guard = self.inflight.lock().await;

        if let Some(fut) = inflight_guard.as_ref().filter(|f| f.peek().is_none()) {
            let fut = fut.clone();
            drop(inflight_guard);
            return fut.await.map_err(|e| GateError::KeyStore {
                reason: e.to_string(),
            });
        }

        let url = self.jwks_url.clone();
        let client = self.http_client.clone();
        let snapshot = Arc::clone(&self.snapshot);

        let fut: BoxFuture<'static, Result<usize, Arc<GateError>>> = Box::pin(async move {
            let jwks = fetch_jwks(&client, url).await.map_err(Arc::new)?;
            let keys: HashMap<String, Arc<DecodingKey>> = jwks
                .keys
                .iter()
                .filter_map(|jwk| jwk_to_decoding_key(jwk).map(|k| (jwk.kid.clone(), Arc::new(k))))
                .collect();
            let count = keys.len();

            snapshot.store(Arc::new(KeySet {
                keys,
                fetched_at: Some(Instant::now()),
            }));

            info!(key_count = count, "JWKS cache updated");
            Ok(count)
        });

        let shared_fut = fut.shared();
        *inflight_guard = Some(shared_fut.clone());
        drop(inflight_guard);

        let result = shared_fut.clone().await;
        {
            let mut slot = self.inflight.lock().await;
            if slot.as_ref().is_some_and(|f| f.ptr_eq(&shared_fut)) {
                slot.take();
            }
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_jwks_refresh(result.is_ok(), self.key_count());
        }

        result.map_err(|e| GateError::KeyStore {
            reason: e.to_string(),
        })
    }

    /// Refresh every `interval` until the task is cancelled.
    pub async fn refresh_periodically(self: Arc<Self>, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if let Err(err) = self.refresh().await {
                warn!(error = %err, key_count = self.key_count(), "JWKS refresh failed, keeping previous keys");
            }
        }
    }
}

impl KeyResolver for JwkCache {
    fn algorithms(&self) -> &[Algorithm] {
        ASYMMETRIC_ALGORITHMS
    }

    fn resolve(&self, header: &Header) -> Result<Arc<DecodingKey>, GateError> {
        let kid = header.kid.as_deref().ok_or_else(|| GateError::TokenMalformed {
            reason: "missing kid in header".to_string(),
        })?;

        self.snapshot
            .load()
            .keys
            .get(kid)
            .cloned()
            .ok_or(GateError::TokenSignatureInvalid)
    }
}

async fn fetch_jwks(client: &reqwest::Client, url: Url) -> Result<Jwks, GateError> {
    info!(url = %url, "Fetching JWKS");

    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(GateError::KeyStore {
            reason: format!("JWKS fetch failed with status: {}", response.status()),
        });
    }

    response.json::<Jwks>().await.map_err(|e| GateError::KeyStore {
        reason: format!("failed to parse JWKS: {e}"),
    })
}

/// Converts a JWK to a DecodingKey, rejecting weak or unsupported keys.
pub fn jwk_to_decoding_key(jwk: &Jwk) -> Option<DecodingKey> {
    if jwk.key_use.as_deref().is_some_and(|u| u != "sig") {
        return None;
    }

    match jwk.kty.as_str() {
        "RSA" => {
            let n = jwk.n.as_ref()?;
            let e = jwk.e.as_ref()?;

            if n.len() < MIN_RSA_MODULUS_B64_LEN {
                warn!(kid = %jwk.kid, "RSA key too small, rejecting");
                return None;
            }

            DecodingKey::from_rsa_components(n, e).ok()
        }
        "EC" => {
            let x = jwk.x.as_ref()?;
            let y = jwk.y.as_ref()?;
            let crv = jwk.crv.as_deref().unwrap_or("P-256");

            if !matches!(crv, "P-256" | "P-384") {
                warn!(kid = %jwk.kid, crv = %crv, "Unsupported EC curve, rejecting");
                return None;
            }

            DecodingKey::from_ec_components(x, y).ok()
        }
        _ => {
            warn!(kty = %jwk.kty, "Unsupported key type");
            None
        }
    }
}
