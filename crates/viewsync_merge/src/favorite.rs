//! Reconciliation of the favorites record.

use crate::strategy::{dedup_cards, dedup_ids, merge_cards, merge_ids, merge_scalar};
use crate::CardConflictPolicy;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// The category whose elements are cards rather than bare ids.
const CARD_CATEGORY: &str = "card";

/// Outcome of a favorites merge.
#[derive(Debug, Clone, PartialEq)]
pub struct FavoriteMerge {
    /// The merged record.
    pub merged: Value,
    /// Whether any category's content actually changed.
    ///
    /// Computed set-wise per category, so pure reordering or removal of
    /// duplicates alone does not count as a change.
    pub changed: bool,
}

/// Applies the per-shape merge strategies across the heterogeneous
/// favorites record.
///
/// The record maps category names to either an array of opaque ids, an
/// array of cards (the `card` category), or a scalar. Merging is strictly
/// additive: an entry is only ever removed by explicit user action, never
/// by the reconciler.
#[derive(Debug, Clone, Copy, Default)]
pub struct FavoriteReconciler {
    policy: CardConflictPolicy,
}

impl FavoriteReconciler {
    /// Creates a reconciler with the given card conflict policy.
    pub fn new(policy: CardConflictPolicy) -> Self {
        Self { policy }
    }

    /// Removes duplicate ids from every array-shaped category.
    ///
    /// Idempotent: applying it twice yields the same record as once.
    /// Non-object input yields an empty record.
    pub fn deduplicate(&self, record: &Value) -> Value {
        Value::Object(self.deduplicate_map(record))
    }

    fn deduplicate_map(&self, record: &Value) -> Map<String, Value> {
        let Some(map) = record.as_object() else {
            return Map::new();
        };
        let mut out = Map::with_capacity(map.len());
        for (category, value) in map {
            let cleaned = match value {
                Value::Array(items) if category == CARD_CATEGORY => {
                    Value::Array(dedup_cards(items))
                }
                Value::Array(items) => Value::Array(dedup_ids(items)),
                other => other.clone(),
            };
            out.insert(category.clone(), cleaned);
        }
        out
    }

    /// Reports whether any array-shaped category contains a repeated id
    /// (bare or card id).
    ///
    /// Used as a post-merge safety re-check and as the standalone startup
    /// repair trigger.
    pub fn has_duplicates(record: &Value) -> bool {
        let Some(map) = record.as_object() else {
            return false;
        };
        for (category, value) in map {
            let Some(items) = value.as_array() else {
                continue;
            };
            let mut seen = HashSet::with_capacity(items.len());
            for item in items {
                let key = if category == CARD_CATEGORY {
                    match item.get("id") {
                        None | Some(Value::Null) => continue,
                        Some(id) => id.to_string(),
                    }
                } else {
                    item.to_string()
                };
                if !seen.insert(key) {
                    return true;
                }
            }
        }
        false
    }

    /// Merges an incoming record into the existing one.
    ///
    /// The incoming record is deduplicated first: data already on the wire
    /// may carry duplicates from prior corruption. Categories present only
    /// in `existing` are left untouched.
    pub fn merge(&self, existing: &Value, incoming: &Value) -> FavoriteMerge {
        let incoming = self.deduplicate_map(incoming);

        let mut merged = existing.as_object().cloned().unwrap_or_default();
        let mut changed = false;

        for (category, new_value) in &incoming {
            let current = merged.get(category).cloned().unwrap_or(Value::Null);
            let next = match new_value {
                Value::Array(items) if category == CARD_CATEGORY => {
                    let current_items = current.as_array().map(Vec::as_slice).unwrap_or(&[]);
                    Value::Array(merge_cards(current_items, items, self.policy))
                }
                Value::Array(items) => {
                    let current_items = current.as_array().map(Vec::as_slice).unwrap_or(&[]);
                    Value::Array(merge_ids(current_items, items))
                }
                scalar => merge_scalar(&current, scalar).0,
            };
            if category_changed(category, &current, &next) {
                changed = true;
            }
            merged.insert(category.clone(), next);
        }

        FavoriteMerge {
            merged: Value::Object(merged),
            changed,
        }
    }
}

/// Content comparison for one category before and after a merge.
///
/// Arrays compare as id sets (card arrays by card id), so reordering and
/// duplicate removal are not changes. Everything else compares by deep
/// value equality.
fn category_changed(category: &str, before: &Value, after: &Value) -> bool {
    match after {
        Value::Array(after_items) => {
            let before_items = before.as_array().map(Vec::as_slice).unwrap_or(&[]);
            id_set(category, before_items) != id_set(category, after_items)
        }
        other => before != other,
    }
}

fn id_set(category: &str, items: &[Value]) -> HashSet<String> {
    items
        .iter()
        .filter_map(|item| {
            if category == CARD_CATEGORY {
                match item.get("id") {
                    None | Some(Value::Null) => None,
                    Some(id) => Some(id.to_string()),
                }
            } else {
                Some(item.to_string())
            }
        })
        .collect()
}
