//! Per-shape merge strategies.
//!
//! Each function here is pure and total. Elements that cannot participate
//! in a merge (a card without an id, a wrongly-shaped value) are skipped,
//! not reported: a single corrupt element must never abort a whole merge.

use serde_json::Value;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

/// Which side's content survives when both replicas hold a card with the
/// same id.
///
/// Ordering is unaffected by the policy: the merged list always follows
/// the incoming side's order first, then existing-only entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CardConflictPolicy {
    /// The incoming card replaces the existing one (treated as the
    /// fresher write).
    #[default]
    IncomingWins,
    /// The existing card is kept verbatim.
    ExistingWins,
}

/// Canonical hash key for an id value.
///
/// `serde_json::Value` is not `Hash`, so ids are keyed by their canonical
/// JSON rendering. Distinct JSON representations of the same logical id
/// (e.g. `1` vs `"1"`) are distinct ids, matching value equality.
fn id_key(value: &Value) -> String {
    value.to_string()
}

/// Extracts the id of a card. A missing or null id makes the card
/// un-mergeable.
fn card_id(card: &Value) -> Option<String> {
    match card.get("id") {
        None | Some(Value::Null) => None,
        Some(id) => Some(id_key(id)),
    }
}

/// Removes duplicate ids, keeping first-occurrence order.
pub fn dedup_ids(items: &[Value]) -> Vec<Value> {
    let mut seen = HashSet::with_capacity(items.len());
    let mut result = Vec::with_capacity(items.len());
    for item in items {
        if seen.insert(id_key(item)) {
            result.push(item.clone());
        }
    }
    result
}

/// Removes duplicate cards, keyed by `id`.
///
/// Cards without an id are dropped. For a repeated id the last definition
/// wins as the retained content, while the position stays at the first
/// occurrence (newest edit, stable ordering).
pub fn dedup_cards(cards: &[Value]) -> Vec<Value> {
    let mut position: HashMap<String, usize> = HashMap::with_capacity(cards.len());
    let mut result: Vec<Value> = Vec::with_capacity(cards.len());
    for card in cards {
        let Some(id) = card_id(card) else {
            continue;
        };
        match position.entry(id) {
            Entry::Occupied(slot) => result[*slot.get()] = card.clone(),
            Entry::Vacant(slot) => {
                slot.insert(result.len());
                result.push(card.clone());
            }
        }
    }
    result
}

/// Union of two id arrays.
///
/// Keeps all of `existing` (deduplicated, original order), then appends
/// ids present only in `incoming`. Ids present only in `existing` are
/// never removed.
pub fn merge_ids(existing: &[Value], incoming: &[Value]) -> Vec<Value> {
    let mut seen = HashSet::with_capacity(existing.len() + incoming.len());
    let mut result = Vec::with_capacity(existing.len() + incoming.len());
    for item in existing.iter().chain(incoming) {
        if seen.insert(id_key(item)) {
            result.push(item.clone());
        }
    }
    result
}

/// Union of two card arrays, keyed by id.
///
/// Ordering favors `incoming` first, then existing-only cards in their
/// original order. For an id present on both sides the retained content
/// is chosen by `policy`.
pub fn merge_cards(
    existing: &[Value],
    incoming: &[Value],
    policy: CardConflictPolicy,
) -> Vec<Value> {
    let existing = dedup_cards(existing);
    let incoming = dedup_cards(incoming);

    let existing_by_id: HashMap<String, &Value> = existing
        .iter()
        .filter_map(|card| card_id(card).map(|id| (id, card)))
        .collect();

    let mut taken = HashSet::with_capacity(incoming.len());
    let mut result = Vec::with_capacity(existing.len() + incoming.len());

    for card in &incoming {
        // Deduplicated cards always carry an id.
        let Some(id) = card_id(card) else {
            continue;
        };
        let content = match policy {
            CardConflictPolicy::IncomingWins => card,
            CardConflictPolicy::ExistingWins => existing_by_id.get(&id).copied().unwrap_or(card),
        };
        result.push(content.clone());
        taken.insert(id);
    }

    for card in &existing {
        let Some(id) = card_id(card) else {
            continue;
        };
        if !taken.contains(&id) {
            result.push(card.clone());
        }
    }

    result
}

/// Overwrites `existing` with `incoming` iff they differ.
///
/// Returns the merged value and whether it changed. Equality is deep
/// value comparison.
pub fn merge_scalar(existing: &Value, incoming: &Value) -> (Value, bool) {
    if existing == incoming {
        (existing.clone(), false)
    } else {
        (incoming.clone(), true)
    }
}
