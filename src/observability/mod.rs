//! Observability Module
//!
//! Structured logging setup and Prometheus metrics.

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use metrics::GateMetrics;
