//! Composition of collectors, reconcilers and transport.

use crate::config::SyncConfig;
use crate::host::HostApi;
use crate::transport::{ExchangePayload, ExchangeTransport};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};
use viewsync_merge::{
    is_view_key, FavoriteReconciler, TimelineReconciler, FAVORITE_KEY, VIEW_REGISTRY_KEY,
};

/// What an inbound merge actually touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// At least one watch-progress entry moved forward.
    pub timeline_changed: bool,
    /// The favorites record gained content.
    pub favorites_changed: bool,
}

/// Clears the re-entrancy flag on drop. The flag cannot stay stuck set,
/// not even if a reconciler panics mid-apply.
struct ApplyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> ApplyGuard<'a> {
    fn arm(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self { flag }
    }
}

impl Drop for ApplyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Reads local state into outbound payloads and routes inbound payloads
/// through the reconcilers.
pub struct SyncOrchestrator<T: ExchangeTransport, H: HostApi> {
    config: SyncConfig,
    host: Arc<H>,
    transport: T,
    favorites: FavoriteReconciler,
    timeline: TimelineReconciler,
    applying: Arc<AtomicBool>,
}

impl<T: ExchangeTransport, H: HostApi> SyncOrchestrator<T, H> {
    /// Creates an orchestrator over the given collaborators.
    ///
    /// `applying` is the shared re-entrancy flag; the scheduler's change
    /// listener reads it at event-emission time.
    pub fn new(config: SyncConfig, host: Arc<H>, transport: T, applying: Arc<AtomicBool>) -> Self {
        let favorites = FavoriteReconciler::new(config.card_policy);
        Self {
            config,
            host,
            transport,
            favorites,
            timeline: TimelineReconciler,
            applying,
        }
    }

    /// One-shot repair of favorites duplication left behind by prior
    /// corruption. Writes only when duplicates are actually present.
    pub fn repair_favorites(&self) {
        let favorite = self.host.get(FAVORITE_KEY, &Value::Null);
        if FavoriteReconciler::has_duplicates(&favorite) {
            warn!("repairing duplicated favorites record");
            self.host
                .set(FAVORITE_KEY, self.favorites.deduplicate(&favorite), false);
        }
    }

    /// Gathers every known file-view namespace plus the deduplicated
    /// favorites record into an outbound payload.
    ///
    /// The namespace set is reread from the registry key on every
    /// collection; enumerating all store keys would be expensive.
    /// Malformed or empty files are skipped.
    pub fn collect_outbound(&self) -> ExchangePayload {
        let mut payload = ExchangePayload::new();

        let registry = self.host.get(VIEW_REGISTRY_KEY, &Value::Array(Vec::new()));
        let mut seen = HashSet::new();
        for name in registry.as_array().into_iter().flatten() {
            let Some(view) = name.as_str() else {
                continue;
            };
            if !is_view_key(view) || !seen.insert(view.to_string()) {
                continue;
            }
            let file = self.host.get(view, &Value::Null);
            match file.as_object() {
                Some(entries) if !entries.is_empty() => {
                    payload.insert(view.to_string(), file.clone());
                }
                _ => {}
            }
        }

        let favorite = self.host.get(FAVORITE_KEY, &Value::Null);
        if favorite.is_object() {
            payload.insert(
                FAVORITE_KEY.to_string(),
                self.favorites.deduplicate(&favorite),
            );
        }

        payload
    }

    /// Collects current local state and pushes it, fire-and-forget.
    ///
    /// A failed push is logged and dropped: the next debounced push will
    /// re-send current state, which is a superset of this one.
    pub async fn push_current(&self) {
        let payload = self.collect_outbound();
        if payload.is_empty() {
            debug!("nothing to push");
            return;
        }
        if let Err(error) = self.transport.push(&payload).await {
            warn!(%error, "push skipped");
        }
    }

    /// Pulls the remote state and applies it. A failed or malformed pull
    /// means no merge this cycle, nothing more.
    pub async fn pull_and_apply(&self) {
        match self.transport.pull().await {
            Ok(payload) => {
                self.apply_inbound(payload).await;
            }
            Err(error) => warn!(%error, "pull skipped"),
        }
    }

    /// Applies an inbound payload under the re-entrancy guard, then
    /// signals the host refreshes the merge made necessary.
    pub async fn apply_inbound(&self, payload: ExchangePayload) -> ApplyOutcome {
        let outcome = {
            let _guard = ApplyGuard::arm(&self.applying);
            self.apply_payload(&payload)
        };

        if outcome.timeline_changed {
            self.host.reload_progress();
        }
        if outcome.favorites_changed {
            // Let the store write settle before the UI rereads it.
            tokio::time::sleep(self.config.favorite_refresh_delay).await;
            self.host.reload_favorites();
        }

        outcome
    }

    fn apply_payload(&self, payload: &ExchangePayload) -> ApplyOutcome {
        let mut outcome = ApplyOutcome::default();

        for (key, value) in payload {
            if key == FAVORITE_KEY {
                let existing = self.host.get(FAVORITE_KEY, &Value::Null);
                let merge = self.favorites.merge(&existing, value);
                if merge.merged != existing {
                    self.host.set(FAVORITE_KEY, merge.merged, false);
                }
                outcome.favorites_changed |= merge.changed;
            } else if is_view_key(key) {
                let local = self.host.get(key, &Value::Null);
                let merge = self.timeline.merge_view(&local, value);
                for (hash, entry) in &merge.updates {
                    self.host.update_progress(key, *hash, *entry);
                }
                outcome.timeline_changed |= merge.changed();
                self.register_view(key);
            } else {
                debug!(key, "ignoring unknown payload key");
            }
        }

        outcome
    }

    /// Adds a namespace to the registry if it is not already known, so
    /// later collections include it. Registry bookkeeping is silent.
    fn register_view(&self, view: &str) {
        let registry = self.host.get(VIEW_REGISTRY_KEY, &Value::Array(Vec::new()));
        let mut names = registry.as_array().cloned().unwrap_or_default();
        if names.iter().any(|name| name.as_str() == Some(view)) {
            return;
        }
        names.push(Value::String(view.to_string()));
        self.host.set(VIEW_REGISTRY_KEY, Value::Array(names), true);
    }
}
