//! Reconciliation of per-item watch progress.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Playback position for one media item within a file-view namespace.
///
/// Immutable value type: merging replaces the whole entry, never edits it
/// in place. Unknown fields carried by the host's copy are preserved by
/// writing merged entries through the host's per-item update call rather
/// than overwriting whole files.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WatchProgressEntry {
    /// Completion percentage in `[0, 100]`.
    #[serde(default)]
    pub percent: f64,
    /// Playback position in seconds.
    #[serde(default)]
    pub time: f64,
    /// Total duration in seconds.
    #[serde(default)]
    pub duration: f64,
    /// Tag of the playback profile that produced this progress.
    #[serde(default)]
    pub profile: u32,
}

impl WatchProgressEntry {
    /// Merges an incoming entry into this one.
    ///
    /// `percent`, `time` and `duration` move field-wise forward (max) so
    /// the merge is commutative and idempotent regardless of evaluation
    /// order. `profile` identifies *which* profile produced the progress;
    /// a monotonic rule is meaningless there, so the incoming side wins.
    pub fn merge_from(&self, incoming: &WatchProgressEntry) -> WatchProgressEntry {
        WatchProgressEntry {
            percent: self.percent.max(incoming.percent),
            time: self.time.max(incoming.time),
            duration: self.duration.max(incoming.duration),
            profile: incoming.profile,
        }
    }
}

/// Parses a file-view object key as an item hash.
///
/// Zero is reserved as "no item" and rejected along with anything that is
/// not a base-10 unsigned integer.
pub fn parse_item_hash(raw: &str) -> Option<u64> {
    raw.parse::<u64>().ok().filter(|hash| *hash != 0)
}

/// Outcome of merging one received file-view payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewMerge {
    /// Entries whose merged value differs from the local baseline, in
    /// payload order. Each must be written back through the host's
    /// per-item update call.
    pub updates: Vec<(u64, WatchProgressEntry)>,
}

impl ViewMerge {
    /// Whether at least one entry actually changed (refresh gating).
    pub fn changed(&self) -> bool {
        !self.updates.is_empty()
    }
}

/// Applies the numeric max-merge rule per watched item.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimelineReconciler;

impl TimelineReconciler {
    /// Merges an incoming file-view payload against the local file.
    ///
    /// Entries with a zero, non-numeric or unparseable hash are skipped,
    /// as are entries whose body does not deserialize. An absent local
    /// entry is treated as an all-zero baseline.
    pub fn merge_view(&self, local_file: &Value, incoming_file: &Value) -> ViewMerge {
        let mut merge = ViewMerge::default();
        let Some(entries) = incoming_file.as_object() else {
            return merge;
        };
        let local = local_file.as_object();

        for (raw_hash, raw_entry) in entries {
            let Some(hash) = parse_item_hash(raw_hash) else {
                continue;
            };
            let Ok(incoming) = serde_json::from_value::<WatchProgressEntry>(raw_entry.clone())
            else {
                continue;
            };
            let baseline: WatchProgressEntry = local
                .and_then(|file| file.get(raw_hash))
                .and_then(|entry| serde_json::from_value(entry.clone()).ok())
                .unwrap_or_default();

            let merged = baseline.merge_from(&incoming);
            if merged != baseline {
                merge.updates.push((hash, merged));
            }
        }

        merge
    }
}
