//! Route policy table tests.

use auth_gate::policy::{
    hotel_policy, AccessLevel, PathPattern, PolicyError, RoutePolicyTable, RouteRule, Shadowing,
};
use auth_gate::principal::Role;
use http::Method;

fn access_of(table: &RoutePolicyTable, path: &str) -> AccessLevel {
    table.classify(&Method::GET, path).unwrap().1.access().clone()
}

#[test]
fn test_hotel_table_classification() {
    let table = hotel_policy().unwrap();

    for path in ["/hotels/42", "/rooms", "/rooms/7/availability", "/bookings/", "/auth/login"] {
        assert_eq!(access_of(&table, path), AccessLevel::Public, "{path}");
    }
    assert_eq!(access_of(&table, "/roles/5"), AccessLevel::Role(Role::new("ADMIN")));
    assert_eq!(access_of(&table, "/user/change-password"), AccessLevel::Authenticated);
    assert_eq!(access_of(&table, "/user/profile"), AccessLevel::Authenticated);
    assert_eq!(access_of(&table, "/"), AccessLevel::Authenticated);
}

#[test]
fn test_prefix_is_segment_aware() {
    let table = hotel_policy().unwrap();
    assert_eq!(access_of(&table, "/hotelsX/1"), AccessLevel::Authenticated);
    assert_eq!(access_of(&table, "/authority"), AccessLevel::Authenticated);
}

#[test]
fn test_first_match_wins() {
    let table = RoutePolicyTable::builder()
        .authenticated(["/rooms/admin/**"])
        .public(["/rooms/**"])
        .any_request_authenticated()
        .build()
        .unwrap();

    let (index, rule) = table.classify(&Method::GET, "/rooms/admin/1").unwrap();
    assert_eq!(index, 0);
    assert_eq!(rule.access(), &AccessLevel::Authenticated);
    assert_eq!(access_of(&table, "/rooms/1"), AccessLevel::Public);
}

#[test]
fn test_unchecked_table_can_miss() {
    let table = RoutePolicyTable::new(vec![RouteRule::new(
        PathPattern::parse("/hotels/**").unwrap(),
        AccessLevel::Public,
    )]);
    assert!(!table.is_total());
    assert!(table.classify(&Method::GET, "/roles/1").is_none());
}

#[test]
fn test_builder_requires_catch_all() {
    let err = RoutePolicyTable::builder().public(["/hotels/**"]).build().unwrap_err();
    assert_eq!(err, PolicyError::NotTotal);
}

#[test]
fn test_builder_rejects_bad_patterns() {
    for bad in ["hotels/**", "/hotels/a**b"] {
        let err = RoutePolicyTable::builder()
            .public([bad])
            .any_request_authenticated()
            .build()
            .unwrap_err();
        assert!(matches!(err, PolicyError::InvalidPattern { .. }), "{bad}");
    }
}

#[test]
fn test_method_filter() {
    let table = RoutePolicyTable::builder()
        .method_rule(&[Method::GET], ["/bookings/**"], AccessLevel::Public)
        .any_request_authenticated()
        .build()
        .unwrap();

    assert_eq!(access_of(&table, "/bookings/9"), AccessLevel::Public);
    let (_, rule) = table.classify(&Method::DELETE, "/bookings/9").unwrap();
    assert_eq!(rule.access(), &AccessLevel::Authenticated);
}

#[test]
fn test_verify_otp_rule_is_reported_redundant() {
    let table = hotel_policy().unwrap();
    assert_eq!(
        table.shadowed_rules(),
        vec![Shadowing {
            rule_index: 6,
            shadowed_by: 0,
            conflicting: false,
        }]
    );
    let (index, _) = table.classify(&Method::POST, "/auth/verify-otp").unwrap();
    assert_eq!(index, 0);
}

#[test]
fn test_conflicting_shadow_is_flagged() {
    let table = RoutePolicyTable::builder()
        .public(["/roles/**"])
        .has_role(["/roles/admin"], "ADMIN")
        .any_request_authenticated()
        .build()
        .unwrap();

    let shadows = table.shadowed_rules();
    assert_eq!(shadows.len(), 1);
    assert_eq!(shadows[0].rule_index, 1);
    assert!(shadows[0].conflicting);
}

#[test]
fn test_glob_wildcards() {
    let pattern = PathPattern::parse("/hotels/*/rooms/?").unwrap();
    assert!(pattern.matches("/hotels/42/rooms/7"));
    assert!(!pattern.matches("/hotels/42/rooms/17"));
    assert!(!pattern.matches("/hotels/42/x/rooms/7"));

    let any = PathPattern::parse("/**").unwrap();
    assert!(any.is_catch_all());
    assert!(any.matches("/"));
    assert!(any.covers(&pattern));
}
