//! The server-side replica.

use crate::error::ServerResult;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::path::Path;
use viewsync_merge::{FavoriteReconciler, FAVORITE_KEY};

/// In-memory replica with JSON-file persistence.
///
/// The replica is a flat JSON object: file-view namespaces map to
/// progress files, `favorite` maps to the favorites record. Favorites
/// are deduplicated and additively merged on every write so a buggy
/// client can never pollute the replica with duplicates. Every other
/// key is overwritten wholesale: timeline convergence happens on the
/// client, the server only keeps the freshest push.
pub struct ReplicaStore {
    data: RwLock<Map<String, Value>>,
    favorites: FavoriteReconciler,
}

impl ReplicaStore {
    /// Creates an empty replica.
    pub fn new() -> Self {
        Self {
            data: RwLock::new(Map::new()),
            favorites: FavoriteReconciler::default(),
        }
    }

    /// Loads a replica from `path`. A missing file yields an empty
    /// replica; an unreadable or non-object file is an error.
    pub fn load(path: &Path) -> ServerResult<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let raw = std::fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&raw)?;
        let data = value.as_object().cloned().unwrap_or_default();
        Ok(Self {
            data: RwLock::new(data),
            favorites: FavoriteReconciler::default(),
        })
    }

    /// Saves the replica to `path`.
    pub fn save(&self, path: &Path) -> ServerResult<()> {
        let snapshot = self.snapshot();
        let raw = serde_json::to_string(&snapshot)?;
        std::fs::write(path, raw)?;
        Ok(())
    }

    /// A copy of the whole replica.
    pub fn snapshot(&self) -> Map<String, Value> {
        self.data.read().clone()
    }

    /// Merges an incoming `/set` payload into the replica.
    pub fn merge(&self, payload: Map<String, Value>) {
        let mut data = self.data.write();
        for (key, value) in payload {
            if key == FAVORITE_KEY {
                let existing = data.get(FAVORITE_KEY).cloned().unwrap_or(Value::Null);
                let merged = self.favorites.merge(&existing, &value).merged;
                data.insert(key, merged);
            } else {
                data.insert(key, value);
            }
        }
    }

    /// Number of top-level keys in the replica.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the replica is empty.
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl Default for ReplicaStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn favorites_merge_additively_with_dedup() {
        let store = ReplicaStore::new();
        store.merge(payload(json!({"favorite": {"movie": [1, 2, 2]}})));
        store.merge(payload(json!({"favorite": {"movie": [3], "tv": [9]}})));

        let snapshot = store.snapshot();
        assert_eq!(snapshot["favorite"]["movie"], json!([1, 2, 3]));
        assert_eq!(snapshot["favorite"]["tv"], json!([9]));
    }

    #[test]
    fn favorites_survive_a_stale_push() {
        let store = ReplicaStore::new();
        store.merge(payload(json!({"favorite": {"movie": [1, 2, 3]}})));
        // a device with an older record pushes
        store.merge(payload(json!({"favorite": {"movie": [2]}})));

        assert_eq!(store.snapshot()["favorite"]["movie"], json!([1, 2, 3]));
    }

    #[test]
    fn non_favorite_keys_overwrite() {
        let store = ReplicaStore::new();
        store.merge(payload(
            json!({"file_view_movie": {"42": {"percent": 10.0}}}),
        ));
        store.merge(payload(
            json!({"file_view_movie": {"42": {"percent": 55.0}}}),
        ));

        assert_eq!(
            store.snapshot()["file_view_movie"]["42"]["percent"],
            json!(55.0)
        );
    }

    #[test]
    fn merging_identical_payloads_is_idempotent() {
        let store = ReplicaStore::new();
        let body = payload(json!({
            "favorite": {"movie": [1], "card": [{"id": 5, "title": "x"}]},
            "file_view_movie": {"42": {"percent": 10.0}}
        }));
        store.merge(body.clone());
        let once = store.snapshot();
        store.merge(body);
        assert_eq!(store.snapshot(), once);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("replica.json");

        let store = ReplicaStore::new();
        store.merge(payload(json!({"favorite": {"movie": [1, 2]}})));
        store.save(&path).unwrap();

        let reloaded = ReplicaStore::load(&path).unwrap();
        assert_eq!(reloaded.snapshot(), store.snapshot());
    }

    #[test]
    fn load_missing_file_yields_empty_replica() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReplicaStore::load(&dir.path().join("absent.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("replica.json");
        std::fs::write(&path, "not json at all").unwrap();
        assert!(ReplicaStore::load(&path).is_err());
    }
}
