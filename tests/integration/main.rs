//! Integration Tests
//!
//! - http_gate: the gated axum router end to end
//! - login: password login issuing tokens the gate accepts
//! - jwks: remote key set refresh against a mock HTTP server

#[path = "../common/mod.rs"]
mod common;

mod app;
mod jwks;
