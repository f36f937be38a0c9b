//! Property tests for path patterns.

use auth_gate::policy::{hotel_policy, PathPattern};
use proptest::prelude::*;

use super::generators::{arb_method, arb_path, arb_segment};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The hotel table is total: every well-formed path is classified.
    #[test]
    fn prop_hotel_table_is_total(path in arb_path(), method in arb_method()) {
        let table = hotel_policy().unwrap();
        prop_assert!(table.classify(&method, &path).is_some());
    }

    /// `/x/**` matches `/x` and anything below it, and nothing that merely
    /// shares the prefix text.
    #[test]
    fn prop_double_star_respects_segments(
        prefix in arb_segment(),
        suffix in arb_segment(),
        rest in prop::collection::vec(arb_segment(), 0..3),
    ) {
        let pattern = PathPattern::parse(&format!("/{prefix}/**")).unwrap();
        let below = format!("/{prefix}/{}", rest.join("/"));

        let exact = format!("/{prefix}");
        let sibling = format!("/{prefix}{suffix}");

        prop_assert!(pattern.matches(&exact));
        prop_assert!(pattern.matches(&below));
        prop_assert!(!pattern.matches(&sibling));
    }

    /// Trailing and doubled slashes do not change classification.
    #[test]
    fn prop_empty_segments_are_ignored(path in arb_path(), method in arb_method()) {
        let table = hotel_policy().unwrap();
        let noisy = format!("/{}/", path.replace('/', "//"));
        let a = table.classify(&method, &path).map(|(i, _)| i);
        let b = table.classify(&method, &noisy).map(|(i, _)| i);
        prop_assert_eq!(a, b);
    }
}
