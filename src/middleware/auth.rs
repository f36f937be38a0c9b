//! Auth Gate Tower Layer
//!
//! Runs the gate before the inner service. Authorized requests carry the
//! [`Principal`] (when one was resolved) and the [`CorrelationId`] in their
//! extensions; denials are answered here and never reach the inner service.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::response::Response;
use futures::future::BoxFuture;
use http::Request;
use tower::{Layer, Service};
use tracing::{info_span, Instrument};

use crate::gate::AuthGate;
use crate::middleware::correlation::{CorrelationId, CORRELATION_HEADER};
use crate::principal::Principal;

/// Auth gate layer for Tower
#[derive(Clone)]
pub struct AuthGateLayer {
    gate: Arc<AuthGate>,
}

impl AuthGateLayer {
    pub fn new(gate: Arc<AuthGate>) -> Self {
        Self { gate }
    }
}

impl<S> Layer<S> for AuthGateLayer {
    type Service = AuthGateService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthGateService {
            inner,
            gate: Arc::clone(&self.gate),
        }
    }
}

/// Auth gate service wrapper
pub struct AuthGateService<S> {
    inner: S,
    gate: Arc<AuthGate>,
}

impl<S: Clone> Clone for AuthGateService<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            gate: Arc::clone(&self.gate),
        }
    }
}

impl<S, B> Service<Request<B>> for AuthGateService<S>
where
    S: Service<Request<B>, Response = Response> + Clone + Send + 'static,
    S::Error: Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        let correlation_id = CorrelationId::from_headers(req.headers());
        let span = info_span!(
            "auth_gate",
            correlation_id = %correlation_id,
            method = %req.method(),
            path = %req.uri().path(),
        );

        let decision = span.in_scope(|| self.gate.authorize_request(&req));

        // Swap in the ready service, leaving a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        match decision {
            Ok(authorization) => {
                if let Some(principal) = authorization.principal {
                    req.extensions_mut().insert::<Principal>(principal);
                }
                req.extensions_mut().insert(correlation_id);

                Box::pin(
                    async move {
                        let mut response = inner.call(req).await?;
                        response
                            .headers_mut()
                            .insert(&CORRELATION_HEADER, correlation_id.header_value());
                        Ok(response)
                    }
                    .instrument(span),
                )
            }
            Err(err) => {
                let path = req.uri().path().to_string();
                let mut response = err.to_response(Some(&path), correlation_id.0);
                response
                    .headers_mut()
                    .insert(&CORRELATION_HEADER, correlation_id.header_value());
                Box::pin(async move { Ok(response) })
            }
        }
    }
}
