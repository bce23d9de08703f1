//! Property-based tests for the merger and the differ.
//!
//! These tests use proptest to generate random configuration documents and
//! verify that the merge and comparison invariants hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use crate::diff::ConfigDiff;
    use crate::merge::merge;
    use proptest::prelude::*;
    use serde_yaml::{Mapping, Value};

    fn scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<bool>().prop_map(Value::Bool),
            (0i64..100).prop_map(|n| Value::Number(n.into())),
            "[a-z]{0,6}".prop_map(Value::String),
        ]
    }

    fn document() -> impl Strategy<Value = Value> {
        scalar().prop_recursive(3, 24, 5, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..5).prop_map(Value::Sequence),
                prop::collection::btree_map("[a-e]", inner, 0..5).prop_map(|map| {
                    Value::Mapping(
                        map.into_iter()
                            .map(|(k, v)| (Value::String(k), v))
                            .collect(),
                    )
                }),
            ]
        })
    }

    fn flat_map() -> impl Strategy<Value = Mapping> {
        prop::collection::btree_map("[a-e]", scalar(), 0..5).prop_map(|map| {
            map.into_iter()
                .map(|(k, v)| (Value::String(k), v))
                .collect()
        })
    }

    // ============================================================================
    // merge property tests
    // ============================================================================

    proptest! {
        /// Property: when upstream did not change, active is returned untouched
        #[test]
        fn merge_without_upstream_change_is_noop(previous in document(), active in document()) {
            let result = merge(&previous, &previous, &active);
            prop_assert_eq!(result, active);
        }

        /// Property: merge is deterministic (same triple = same output)
        #[test]
        fn merge_is_deterministic(
            previous in document(),
            current in document(),
            active in document(),
        ) {
            let result1 = merge(&previous, &current, &active);
            let result2 = merge(&previous, &current, &active);
            prop_assert_eq!(result1, result2);
        }

        /// Property: an uncustomized flat item takes the upstream value
        #[test]
        fn merge_uncustomized_flat_item_takes_current(
            previous in flat_map(),
            current in flat_map(),
        ) {
            let previous = Value::Mapping(previous);
            let current = Value::Mapping(current);
            let result = merge(&previous, &current, &previous);
            prop_assert_eq!(result, current);
        }

        /// Property: keys only the site has are always preserved
        #[test]
        fn merge_preserves_site_only_keys(
            previous in flat_map(),
            current in flat_map(),
            active in flat_map(),
            local in scalar(),
        ) {
            let mut active = active;
            active.insert(Value::String("site_only".to_string()), local.clone());
            let result = merge(
                &Value::Mapping(previous),
                &Value::Mapping(current),
                &Value::Mapping(active),
            );
            prop_assert_eq!(result.get("site_only"), Some(&local));
        }
    }

    // ============================================================================
    // ConfigDiff property tests
    // ============================================================================

    proptest! {
        /// Property: every document is the same as itself
        #[test]
        fn same_is_reflexive(doc in document()) {
            let differ = ConfigDiff::default();
            prop_assert!(differ.same(&doc, &doc));
        }

        /// Property: normalization is idempotent
        #[test]
        fn normalize_is_idempotent(doc in document()) {
            let differ = ConfigDiff::default();
            let once = differ.normalize(&doc);
            let twice = differ.normalize(&once);
            prop_assert_eq!(once, twice);
        }

        /// Property: adding a uuid never makes an item look changed
        #[test]
        fn uuid_is_ignored(map in flat_map(), uuid in "[0-9a-f]{8}") {
            let differ = ConfigDiff::default();
            let mut with_uuid = map.clone();
            with_uuid.insert(Value::String("uuid".to_string()), Value::String(uuid));
            prop_assert!(differ.same(&Value::Mapping(map), &Value::Mapping(with_uuid)));
        }
    }
}
