//! # viewsync merge
//!
//! Pure merge and deduplication rules for viewsync replicas.
//!
//! This crate provides:
//! - Per-shape merge strategies (ID sets, keyed card lists, scalars)
//! - `FavoriteReconciler` for the heterogeneous favorites record
//! - `TimelineReconciler` for per-item watch progress
//!
//! Every operation here is total: malformed elements are skipped, never
//! raised. This is a pure crate with no I/O.
//!
//! ## Key Invariants
//!
//! - Merges are additive (union only, never subtractive)
//! - Merging the same data twice is a no-op (idempotent convergence)
//! - Watch progress only moves forward (field-wise max)
//! - No two entries in a merged array share an id

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod favorite;
mod strategy;
mod timeline;

pub use favorite::{FavoriteMerge, FavoriteReconciler};
pub use strategy::{
    dedup_cards, dedup_ids, merge_cards, merge_ids, merge_scalar, CardConflictPolicy,
};
pub use timeline::{parse_item_hash, TimelineReconciler, ViewMerge, WatchProgressEntry};

/// Store key holding the favorites record.
pub const FAVORITE_KEY: &str = "favorite";

/// Store key holding the registry of known file-view namespace keys.
pub const VIEW_REGISTRY_KEY: &str = "file_view";

/// Prefix shared by every file-view namespace key.
pub const VIEW_KEY_PREFIX: &str = "file_view_";

/// Returns true if `key` names a file-view namespace.
pub fn is_view_key(key: &str) -> bool {
    key.starts_with(VIEW_KEY_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_key_matching() {
        assert!(is_view_key("file_view_movie"));
        assert!(is_view_key("file_view_4k"));
        assert!(!is_view_key("file_view"));
        assert!(!is_view_key("favorite"));
        assert!(!is_view_key("other"));
    }
}
