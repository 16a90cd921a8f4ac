//! Transport abstraction for the exchange point.

use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::sync::Mutex;

/// Wire payload: top-level keys are file-view namespace names mapping to
/// progress files, plus `favorite` mapping to the favorites record.
pub type ExchangePayload = Map<String, Value>;

/// Push/pull access to the remote exchange point.
///
/// Implementations own failure and timeout handling for the transport
/// only; payload semantics live in the orchestrator.
#[async_trait]
pub trait ExchangeTransport: Send + Sync {
    /// Sends the current local state to the exchange point.
    async fn push(&self, payload: &ExchangePayload) -> SyncResult<()>;

    /// Fetches the remote state. An error means "nothing to merge this
    /// cycle", never a reason to abort scheduling.
    async fn pull(&self) -> SyncResult<ExchangePayload>;
}

#[async_trait]
impl<T: ExchangeTransport + ?Sized> ExchangeTransport for Arc<T> {
    async fn push(&self, payload: &ExchangePayload) -> SyncResult<()> {
        (**self).push(payload).await
    }

    async fn pull(&self) -> SyncResult<ExchangePayload> {
        (**self).pull().await
    }
}

/// A scriptable transport for tests.
#[derive(Default)]
pub struct MockTransport {
    pushed: Mutex<Vec<ExchangePayload>>,
    pull_responses: Mutex<VecDeque<ExchangePayload>>,
    pull_count: AtomicUsize,
    fail_pulls_with_status: Mutex<Option<u16>>,
    fail_pushes: AtomicBool,
}

impl MockTransport {
    /// Creates a mock with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a pull response. Responses are consumed in order; the last
    /// one is repeated once the queue is down to a single entry.
    pub fn enqueue_pull_response(&self, payload: ExchangePayload) {
        self.pull_responses.lock().unwrap().push_back(payload);
    }

    /// Makes every pull fail with the given HTTP status.
    pub fn fail_pulls_with_status(&self, status: u16) {
        *self.fail_pulls_with_status.lock().unwrap() = Some(status);
    }

    /// Makes every push fail at the transport level.
    pub fn fail_pushes(&self, fail: bool) {
        self.fail_pushes.store(fail, Ordering::SeqCst);
    }

    /// Every payload pushed so far.
    pub fn pushed(&self) -> Vec<ExchangePayload> {
        self.pushed.lock().unwrap().clone()
    }

    /// Number of pushes issued.
    pub fn push_count(&self) -> usize {
        self.pushed.lock().unwrap().len()
    }

    /// Number of pulls attempted.
    pub fn pull_count(&self) -> usize {
        self.pull_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExchangeTransport for MockTransport {
    async fn push(&self, payload: &ExchangePayload) -> SyncResult<()> {
        if self.fail_pushes.load(Ordering::SeqCst) {
            return Err(SyncError::transport("mock push failure"));
        }
        self.pushed.lock().unwrap().push(payload.clone());
        Ok(())
    }

    async fn pull(&self) -> SyncResult<ExchangePayload> {
        self.pull_count.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = *self.fail_pulls_with_status.lock().unwrap() {
            return Err(SyncError::Status(status));
        }
        let mut responses = self.pull_responses.lock().unwrap();
        match responses.len() {
            0 => Err(SyncError::transport("no mock pull response set")),
            1 => Ok(responses.front().cloned().expect("non-empty queue")),
            _ => Ok(responses.pop_front().expect("non-empty queue")),
        }
    }
}
