//! Proptest Generators
//!
//! Shared generators for property-based tests.

use proptest::prelude::*;

/// A single path segment free of traversal and encoding tricks
pub fn arb_segment() -> impl Strategy<Value = String> {
    "[a-z0-9_-]{1,12}"
}

/// Paths under one of the public prefixes
pub fn arb_public_path() -> impl Strategy<Value = String> {
    (
        prop_oneof![Just("auth"), Just("rooms"), Just("bookings"), Just("hotels")],
        prop::collection::vec(arb_segment(), 0..4),
    )
        .prop_map(|(prefix, rest)| {
            let mut path = format!("/{prefix}");
            for segment in rest {
                path.push('/');
                path.push_str(&segment);
            }
            path
        })
}

/// Arbitrary well-formed absolute paths
pub fn arb_path() -> impl Strategy<Value = String> {
    prop::collection::vec(arb_segment(), 0..5).prop_map(|segments| format!("/{}", segments.join("/")))
}

pub fn arb_method() -> impl Strategy<Value = http::Method> {
    prop_oneof![
        Just(http::Method::GET),
        Just(http::Method::POST),
        Just(http::Method::PUT),
        Just(http::Method::PATCH),
        Just(http::Method::DELETE),
    ]
}

/// Role names, some with the `ROLE_` prefix
pub fn arb_roles() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop_oneof![
            Just("USER".to_string()),
            Just("ROLE_USER".to_string()),
            Just("ADMIN".to_string()),
            Just("ROLE_ADMIN".to_string()),
            "[A-Z]{3,8}",
        ],
        0..4,
    )
}

/// Strings that are never a valid token
pub fn arb_garbage_token() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Za-z0-9_-]{1,40}",
        "[A-Za-z0-9_-]{5,20}\\.[A-Za-z0-9_-]{5,20}\\.[A-Za-z0-9_-]{5,20}",
    ]
}

/// Sensitive content patterns
pub fn arb_sensitive_content() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("password=secret123".to_string()),
        Just("Bearer eyJhbGciOiJIUzI1NiJ9".to_string()),
        Just("private_key: -----BEGIN RSA-----".to_string()),
        "[a-zA-Z0-9_]{5,20}".prop_map(|s| format!("password={s}")),
    ]
}
