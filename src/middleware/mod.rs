//! Tower Middleware Stack
//!
//! Composable layers that put the auth gate in front of an HTTP service.

pub mod auth;
pub mod correlation;

pub use auth::{AuthGateLayer, AuthGateService};
pub use correlation::CorrelationId;
