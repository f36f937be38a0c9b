//! Route Policy Table
//!
//! Static, ordered mapping of path patterns to access rules. Evaluation is
//! first-match in declared order; a trailing `/**` rule keeps it total.

pub mod pattern;
pub mod table;

use thiserror::Error;

pub use pattern::PathPattern;
pub use table::{AccessLevel, RoutePolicyBuilder, RoutePolicyTable, RouteRule, Shadowing};

/// Route policy configuration errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// Pattern could not be compiled
    #[error("Invalid route pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The table does not end with a method-agnostic `/**` rule
    #[error("Route policy must end with a catch-all '/**' rule")]
    NotTotal,
}

/// Access rules of the hotel booking API, in declaration order.
///
/// `/auth/verify-otp` sits after the broader public `/auth/**` group and is
/// therefore unreachable; it is kept so the shadowing report flags it if the
/// group is ever narrowed.
pub fn hotel_policy() -> Result<RoutePolicyTable, PolicyError> {
    RoutePolicyTable::builder()
        .public(["/auth/**", "/rooms/**", "/bookings/**", "/hotels/**"])
        .has_role(["/roles/**"], "ADMIN")
        .authenticated(["/user/change-password"])
        .public(["/auth/verify-otp"])
        .any_request_authenticated()
        .build()
}
