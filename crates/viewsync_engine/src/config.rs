//! Configuration for the sync engine.

use std::time::Duration;
use viewsync_merge::CardConflictPolicy;

/// Configuration for the client-side sync subsystem.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Base URL of the exchange point.
    pub endpoint_url: String,
    /// Quiet period after the last qualifying local mutation before a
    /// push fires. Further mutations inside the window restart it.
    pub push_debounce: Duration,
    /// Interval between periodic pulls.
    pub pull_interval: Duration,
    /// Delay before the one-shot initial pull, giving the host
    /// environment time to finish initializing.
    pub initial_pull_delay: Duration,
    /// Settle delay between a favorites store write and the favorites
    /// reload signal.
    pub favorite_refresh_delay: Duration,
    /// Which side's card content survives an id conflict.
    pub card_policy: CardConflictPolicy,
}

impl SyncConfig {
    /// Creates a configuration for the given exchange endpoint.
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            push_debounce: Duration::from_secs(2),
            pull_interval: Duration::from_secs(60),
            initial_pull_delay: Duration::from_secs(5),
            favorite_refresh_delay: Duration::from_millis(500),
            card_policy: CardConflictPolicy::default(),
        }
    }

    /// Sets the push debounce window.
    pub fn with_push_debounce(mut self, window: Duration) -> Self {
        self.push_debounce = window;
        self
    }

    /// Sets the periodic pull interval.
    pub fn with_pull_interval(mut self, interval: Duration) -> Self {
        self.pull_interval = interval;
        self
    }

    /// Sets the initial pull delay.
    pub fn with_initial_pull_delay(mut self, delay: Duration) -> Self {
        self.initial_pull_delay = delay;
        self
    }

    /// Sets the favorites reload settle delay.
    pub fn with_favorite_refresh_delay(mut self, delay: Duration) -> Self {
        self.favorite_refresh_delay = delay;
        self
    }

    /// Sets the card conflict policy.
    pub fn with_card_policy(mut self, policy: CardConflictPolicy) -> Self {
        self.card_policy = policy;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new("http://127.0.0.1:8181")
    }
}
