//! Auth Gate
//!
//! Per-request decision procedure:
//!
//! ```text
//! START -> ROUTE_CLASSIFIED -> [TOKEN_CHECKED] -> AUTHORIZED | DENIED
//! ```
//!
//! 1. The path is screened by the firewall, then classified by the route
//!    policy table (first match in declared order; no match fails closed).
//! 2. Public rules authorize immediately; the token is never inspected.
//! 3. Otherwise the bearer token is extracted and validated.
//! 4. Role rules compare the principal's roles against the requirement.
//!
//! The gate holds no mutable state and is shared across requests via `Arc`.

pub mod bearer;
pub mod firewall;

use std::sync::Arc;
use std::time::Instant;

use http::{HeaderMap, Method, Request};
use tracing::{debug, error, info};

use crate::clock::{Clock, SystemClock};
use crate::error::GateError;
use crate::jwt::TokenValidator;
use crate::observability::GateMetrics;
use crate::policy::{AccessLevel, RoutePolicyTable};
use crate::principal::Principal;

pub use bearer::extract_bearer_token;

/// Successful outcome of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
    /// Index of the rule that classified the request
    pub rule_index: usize,
    /// Pattern of that rule, as declared
    pub pattern: String,
    /// Present unless the rule was public
    pub principal: Option<Principal>,
}

/// Composes the route policy table and the token validator.
pub struct AuthGate {
    policy: Arc<RoutePolicyTable>,
    validator: Arc<TokenValidator>,
    clock: Arc<dyn Clock>,
    metrics: Option<Arc<GateMetrics>>,
}

impl AuthGate {
    pub fn new(policy: Arc<RoutePolicyTable>, validator: Arc<TokenValidator>) -> Self {
        Self {
            policy,
            validator,
            clock: Arc::new(SystemClock),
            metrics: None,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<GateMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn policy(&self) -> &RoutePolicyTable {
        &self.policy
    }

    /// Evaluate an HTTP request head
    pub fn authorize_request<B>(&self, request: &Request<B>) -> Result<Authorization, GateError> {
        self.authorize(request.method(), request.uri().path(), request.headers())
    }

    /// Decide whether the request may reach its handler.
    pub fn authorize(
        &self,
        method: &Method,
        path: &str,
        headers: &HeaderMap,
    ) -> Result<Authorization, GateError> {
        let started = Instant::now();
        let result = self.evaluate(method, path, headers);
        let latency = started.elapsed().as_secs_f64();

        match &result {
            Ok(auth) => {
                debug!(
                    method = %method,
                    path = %path,
                    rule = %auth.pattern,
                    subject = auth.principal.as_ref().map(Principal::subject),
                    "Request authorized"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_allow(latency);
                }
            }
            Err(err) => {
                let code = err.code();
                if matches!(err, GateError::RouteNotClassified { .. }) {
                    error!(method = %method, path = %path, "No route rule matched, failing closed");
                } else {
                    info!(
                        method = %method,
                        path = %path,
                        error_code = code.as_str(),
                        status = code.http_status().as_u16(),
                        "Request denied"
                    );
                }
                if let Some(metrics) = &self.metrics {
                    metrics.record_deny(code.as_str(), latency);
                }
            }
        }

        result
    }

    fn evaluate(
        &self,
        method: &Method,
        path: &str,
        headers: &HeaderMap,
    ) -> Result<Authorization, GateError> {
        let path = firewall::normalize_path(path)?;

        // START -> ROUTE_CLASSIFIED
        let (rule_index, rule) =
            self.policy
                .classify(method, &path)
                .ok_or_else(|| GateError::RouteNotClassified {
                    path: path.to_string(),
                })?;

        let authorization = |principal| Authorization {
            rule_index,
            pattern: rule.pattern().to_string(),
            principal,
        };

        if !rule.access().requires_token() {
            return Ok(authorization(None));
        }

        // ROUTE_CLASSIFIED -> TOKEN_CHECKED
        let token = extract_bearer_token(headers).ok_or(GateError::TokenMissing)?;
        let principal = self.validator.validate(token, self.clock.now())?;

        match rule.access() {
            AccessLevel::Role(required) => principal.require_role(required)?,
            AccessLevel::Authenticated | AccessLevel::Public => {}
        }

        Ok(authorization(Some(principal)))
    }
}
