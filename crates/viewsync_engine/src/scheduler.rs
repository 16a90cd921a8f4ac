//! Sync scheduling: debounced pushes, periodic pulls.
//!
//! One tokio task owns every timer, so the engine has a single logical
//! thread of control. Store change listeners run synchronously inside
//! the host's `set`; they only check the re-entrancy flag and enqueue
//! qualifying keys for this task. Checking the flag at emission time is
//! what lets a plain boolean distinguish self-inflicted writes from
//! genuine user mutation.

use crate::config::SyncConfig;
use crate::host::HostApi;
use crate::orchestrator::SyncOrchestrator;
use crate::transport::ExchangeTransport;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;
use viewsync_merge::{is_view_key, FAVORITE_KEY, VIEW_REGISTRY_KEY};

/// Stops a running [`SyncScheduler`].
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    notify: Arc<Notify>,
}

impl ShutdownHandle {
    /// Asks the scheduler task to exit after its current step.
    pub fn shutdown(&self) {
        self.notify.notify_one();
    }
}

/// Owns the debounce timer for mutation-triggered pushes, the periodic
/// pull timer and the one-shot delayed initial pull.
pub struct SyncScheduler<T: ExchangeTransport, H: HostApi> {
    config: SyncConfig,
    orchestrator: Arc<SyncOrchestrator<T, H>>,
    host: Arc<H>,
    events: mpsc::UnboundedReceiver<String>,
    shutdown: Arc<Notify>,
}

impl<T, H> SyncScheduler<T, H>
where
    T: ExchangeTransport + 'static,
    H: HostApi + 'static,
{
    /// Wires the scheduler to a host and a transport.
    ///
    /// Subscribes the change listener immediately: mutations that happen
    /// before [`run`](Self::run) is spawned are queued, not lost.
    pub fn new(config: SyncConfig, host: Arc<H>, transport: T) -> Self {
        let applying = Arc::new(AtomicBool::new(false));
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        {
            let applying = Arc::clone(&applying);
            host.subscribe(Box::new(move |key: &str| {
                if applying.load(Ordering::SeqCst) {
                    return;
                }
                if key == FAVORITE_KEY || key == VIEW_REGISTRY_KEY || is_view_key(key) {
                    let _ = events_tx.send(key.to_string());
                }
            }));
        }

        let orchestrator = Arc::new(SyncOrchestrator::new(
            config.clone(),
            Arc::clone(&host),
            transport,
            applying,
        ));

        Self {
            config,
            orchestrator,
            host,
            events: events_rx,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// The orchestrator this scheduler drives.
    pub fn orchestrator(&self) -> Arc<SyncOrchestrator<T, H>> {
        Arc::clone(&self.orchestrator)
    }

    /// A handle that stops the scheduler task.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            notify: Arc::clone(&self.shutdown),
        }
    }

    /// Runs the scheduling loop until shut down.
    pub async fn run(mut self) {
        // One repair pass before anything is exchanged.
        self.orchestrator.repair_favorites();

        let mut pull_timer = time::interval_at(
            Instant::now() + self.config.initial_pull_delay,
            self.config.pull_interval,
        );
        pull_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let debounce = time::sleep(Duration::ZERO);
        tokio::pin!(debounce);
        let mut push_armed = false;

        loop {
            tokio::select! {
                event = self.events.recv() => match event {
                    Some(key) => {
                        self.note_mutation(&key);
                        debounce
                            .as_mut()
                            .reset(Instant::now() + self.config.push_debounce);
                        push_armed = true;
                    }
                    // Host dropped: no more mutations can arrive.
                    None => break,
                },
                () = &mut debounce, if push_armed => {
                    push_armed = false;
                    self.orchestrator.push_current().await;
                }
                _ = pull_timer.tick() => {
                    self.orchestrator.pull_and_apply().await;
                }
                () = self.shutdown.notified() => {
                    debug!("sync scheduler shutting down");
                    break;
                }
            }
        }
    }

    /// Folds a freshly-mutated namespace key into the registry so the
    /// upcoming push collects it.
    fn note_mutation(&self, key: &str) {
        if !is_view_key(key) {
            return;
        }
        let registry = self.host.get(VIEW_REGISTRY_KEY, &Value::Array(Vec::new()));
        let mut names = registry.as_array().cloned().unwrap_or_default();
        if names.iter().any(|name| name.as_str() == Some(key)) {
            return;
        }
        names.push(Value::String(key.to_string()));
        self.host.set(VIEW_REGISTRY_KEY, Value::Array(names), true);
    }
}
