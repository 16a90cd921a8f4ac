//! Property-based tests for the merge algebra.
//!
//! The merge rules must be idempotent, commutative where claimed, and
//! strictly additive, no matter what the replicas contain.

use proptest::prelude::*;
use serde_json::{json, Value};
use viewsync_merge::{
    dedup_ids, merge_cards, merge_ids, CardConflictPolicy, FavoriteReconciler, WatchProgressEntry,
};

/// Strategy for bare id values (numbers and short strings, duplicates
/// likely).
fn id_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        (0i64..20).prop_map(Value::from),
        prop::string::string_regex("[a-f]{1,3}")
            .expect("invalid regex")
            .prop_map(Value::from),
    ]
}

fn id_array_strategy() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(id_strategy(), 0..12)
}

/// Strategy for card arrays with colliding ids and occasional idless
/// elements.
fn card_array_strategy() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec((prop::option::of(0i64..10), 0i64..100), 0..10).prop_map(|pairs| {
        pairs
            .into_iter()
            .map(|(id, payload)| match id {
                Some(id) => json!({"id": id, "payload": payload}),
                None => json!({"payload": payload}),
            })
            .collect()
    })
}

fn favorite_record_strategy() -> impl Strategy<Value = Value> {
    (id_array_strategy(), id_array_strategy(), card_array_strategy()).prop_map(
        |(movie, tv, card)| {
            json!({
                "movie": movie,
                "tv": tv,
                "card": card,
            })
        },
    )
}

fn progress_strategy() -> impl Strategy<Value = WatchProgressEntry> {
    (0u32..=100, 0u32..5000, 0u32..5000, 0u32..4).prop_map(|(percent, time, duration, profile)| {
        WatchProgressEntry {
            percent: f64::from(percent),
            time: f64::from(time),
            duration: f64::from(duration),
            profile,
        }
    })
}

fn id_set(items: &[Value]) -> std::collections::HashSet<String> {
    items.iter().map(|v| v.to_string()).collect()
}

fn card_id_set(items: &[Value]) -> std::collections::HashSet<String> {
    items
        .iter()
        .filter_map(|c| match c.get("id") {
            None | Some(Value::Null) => None,
            Some(id) => Some(id.to_string()),
        })
        .collect()
}

proptest! {
    #[test]
    fn dedup_ids_is_idempotent(items in id_array_strategy()) {
        let once = dedup_ids(&items);
        prop_assert_eq!(dedup_ids(&once), once);
    }

    #[test]
    fn merge_ids_is_a_complete_union(existing in id_array_strategy(), incoming in id_array_strategy()) {
        let merged = merge_ids(&existing, &incoming);
        let merged_set = id_set(&merged);
        for id in existing.iter().chain(incoming.iter()) {
            prop_assert!(merged_set.contains(&id.to_string()));
        }
        // and contains nothing else
        let mut input_set = id_set(&existing);
        input_set.extend(id_set(&incoming));
        prop_assert_eq!(merged_set, input_set);
    }

    #[test]
    fn merge_ids_has_no_duplicates(existing in id_array_strategy(), incoming in id_array_strategy()) {
        let merged = merge_ids(&existing, &incoming);
        prop_assert_eq!(id_set(&merged).len(), merged.len());
    }

    #[test]
    fn merge_cards_loses_nothing_and_repeats_nothing(
        existing in card_array_strategy(),
        incoming in card_array_strategy(),
    ) {
        let merged = merge_cards(&existing, &incoming, CardConflictPolicy::IncomingWins);
        let merged_ids = card_id_set(&merged);

        let mut input_ids = card_id_set(&existing);
        input_ids.extend(card_id_set(&incoming));
        prop_assert_eq!(&merged_ids, &input_ids);

        // exactly once each
        prop_assert_eq!(merged_ids.len(), merged.len());
    }

    #[test]
    fn favorite_merge_is_idempotent(
        a in favorite_record_strategy(),
        b in favorite_record_strategy(),
    ) {
        let reconciler = FavoriteReconciler::default();
        let once = reconciler.merge(&a, &b);
        let twice = reconciler.merge(&once.merged, &b);
        prop_assert_eq!(twice.merged, once.merged);
        prop_assert!(!twice.changed);
    }

    #[test]
    fn favorite_merge_is_additive(
        a in favorite_record_strategy(),
        b in favorite_record_strategy(),
    ) {
        let merged = FavoriteReconciler::default().merge(&a, &b).merged;
        for record in [&a, &b] {
            let map = record.as_object().unwrap();
            for (category, value) in map {
                let items = value.as_array().unwrap();
                let merged_items = merged[category].as_array().unwrap();
                let (have, want) = if category == "card" {
                    (card_id_set(merged_items), card_id_set(items))
                } else {
                    (id_set(merged_items), id_set(items))
                };
                prop_assert!(want.is_subset(&have));
            }
        }
    }

    #[test]
    fn deduplicate_is_idempotent(record in favorite_record_strategy()) {
        let reconciler = FavoriteReconciler::default();
        let once = reconciler.deduplicate(&record);
        prop_assert_eq!(reconciler.deduplicate(&once), once.clone());
        prop_assert!(!FavoriteReconciler::has_duplicates(&once));
    }

    #[test]
    fn timeline_merge_is_commutative_on_progress_fields(
        a in progress_strategy(),
        b in progress_strategy(),
    ) {
        let ab = a.merge_from(&b);
        let ba = b.merge_from(&a);
        prop_assert_eq!(ab.percent, ba.percent);
        prop_assert_eq!(ab.time, ba.time);
        prop_assert_eq!(ab.duration, ba.duration);
    }

    #[test]
    fn timeline_merge_is_monotone(
        start in progress_strategy(),
        steps in prop::collection::vec(progress_strategy(), 1..8),
    ) {
        let mut current = start;
        for step in &steps {
            let next = current.merge_from(step);
            prop_assert!(next.percent >= current.percent);
            prop_assert!(next.time >= current.time);
            prop_assert!(next.duration >= current.duration);
            current = next;
        }
    }

    #[test]
    fn timeline_merge_is_idempotent(a in progress_strategy(), b in progress_strategy()) {
        let once = a.merge_from(&b);
        prop_assert_eq!(once.merge_from(&b), once);
    }
}
