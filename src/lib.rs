//! Hotel Auth Gate - stateless JWT authentication and role-based route
//! authorization for the hotel booking HTTP API.
//!
//! The gate composes a [`RoutePolicyTable`](policy::RoutePolicyTable) with a
//! [`TokenValidator`](jwt::TokenValidator) through one explicit decision
//! function, [`AuthGate::authorize`](gate::AuthGate::authorize), and exposes
//! it to HTTP services as a tower layer.

#![forbid(unsafe_code)]

pub mod clock;
pub mod config;
pub mod credentials;
pub mod error;
pub mod extract;
pub mod gate;
pub mod jwt;
pub mod middleware;
pub mod observability;
pub mod policy;
pub mod principal;
pub mod server;
pub mod shutdown;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use error::{ErrorCode, ErrorResponse, GateError};
pub use gate::{AuthGate, Authorization};
pub use middleware::AuthGateLayer;
pub use principal::{Principal, Role};
