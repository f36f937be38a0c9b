//! Gate decision and key refresh metrics
//!
//! Provides Prometheus metrics for authorization outcomes and JWKS health.

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

const NAMESPACE: &str = "auth_gate";

/// Decision metrics
pub struct GateMetrics {
    registry: Registry,
    /// Decisions by outcome (`allow`/`deny`) and code
    pub decisions: IntCounterVec,
    /// Time spent evaluating one request
    pub decision_seconds: Histogram,
    /// JWKS refresh attempts by result
    pub jwks_refreshes: IntCounterVec,
    /// Keys in the current JWKS snapshot
    pub jwks_keys: IntGauge,
}

impl GateMetrics {
    /// Creates metrics registered in a fresh registry
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::with_registry(Registry::new())
    }

    /// Creates metrics registered in `registry`
    pub fn with_registry(registry: Registry) -> Result<Self, prometheus::Error> {
        let decisions = IntCounterVec::new(
            Opts::new("decisions_total", "Total authorization decisions").namespace(NAMESPACE),
            &["outcome", "code"],
        )?;
        registry.register(Box::new(decisions.clone()))?;

        let decision_seconds = Histogram::with_opts(
            HistogramOpts::new("decision_seconds", "Authorization decision latency in seconds")
                .namespace(NAMESPACE)
                .buckets(vec![0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01]),
        )?;
        registry.register(Box::new(decision_seconds.clone()))?;

        let jwks_refreshes = IntCounterVec::new(
            Opts::new("jwks_refresh_total", "Total JWKS refresh attempts").namespace(NAMESPACE),
            &["result"],
        )?;
        registry.register(Box::new(jwks_refreshes.clone()))?;

        let jwks_keys = IntGauge::with_opts(
            Opts::new("jwks_keys", "Keys in the current JWKS snapshot").namespace(NAMESPACE),
        )?;
        registry.register(Box::new(jwks_keys.clone()))?;

        Ok(Self {
            registry,
            decisions,
            decision_seconds,
            jwks_refreshes,
            jwks_keys,
        })
    }

    /// Records an allowed request
    pub fn record_allow(&self, latency_secs: f64) {
        self.decisions.with_label_values(&["allow", "OK"]).inc();
        self.decision_seconds.observe(latency_secs);
    }

    /// Records a denied request with its precise code
    pub fn record_deny(&self, code: &str, latency_secs: f64) {
        self.decisions.with_label_values(&["deny", code]).inc();
        self.decision_seconds.observe(latency_secs);
    }

    /// Records a JWKS refresh
    pub fn record_jwks_refresh(&self, success: bool, key_count: usize) {
        let result = if success { "success" } else { "failure" };
        self.jwks_refreshes.with_label_values(&[result]).inc();
        self.jwks_keys.set(i64::try_from(key_count).unwrap_or(i64::MAX));
    }

    /// Count of decisions with the given outcome and code
    pub fn decision_count(&self, outcome: &str, code: &str) -> u64 {
        self.decisions.with_label_values(&[outcome, code]).get()
    }

    /// Render all metrics in the Prometheus text format
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
