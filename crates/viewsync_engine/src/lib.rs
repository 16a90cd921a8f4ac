//! # viewsync engine
//!
//! Client-side reconciliation engine and sync scheduler.
//!
//! This crate provides:
//! - `SyncScheduler`: debounced pushes, periodic pulls, re-entrancy guard
//! - `SyncOrchestrator`: collection and routing of exchange payloads
//! - `ExchangeTransport` / `HttpClient` abstractions with test doubles
//! - `HostApi`: the injected capability surface of the embedding app
//!
//! ## Architecture
//!
//! Two independent timelines share one tokio task:
//! 1. A qualifying local mutation arms a debounce timer; when the quiet
//!    period elapses, current state is pushed to the exchange point.
//! 2. A delayed initial pull, then fixed-interval pulls, fetch remote
//!    state and apply it through the merge rules.
//!
//! ## Key Invariants
//!
//! - The engine's own store writes never schedule a push (re-entrancy
//!   guard, checked at event-emission time)
//! - A failed exchange degrades to "try again next cycle"; nothing here
//!   is fatal to the host
//! - Applying the same inbound payload twice is a no-op

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod host;
mod http;
mod orchestrator;
mod scheduler;
mod transport;

pub use config::SyncConfig;
pub use error::{SyncError, SyncResult};
pub use host::{ChangeListener, HostApi, MemoryHost};
pub use http::{HttpClient, HttpExchange, LoopbackClient, LoopbackServer};
pub use orchestrator::{ApplyOutcome, SyncOrchestrator};
pub use scheduler::{ShutdownHandle, SyncScheduler};
pub use transport::{ExchangePayload, ExchangeTransport, MockTransport};
