//! HTTP surface of the exchange server.

use crate::store::ReplicaStore;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Map, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::debug;

/// Builds the exchange router over a shared replica.
///
/// Clients on other origins (embedded webviews, LAN browsers) talk to
/// this server directly, so CORS is permissive.
pub fn router(store: Arc<ReplicaStore>) -> Router {
    Router::new()
        .route("/set", post(handle_set))
        .route("/get", get(handle_get))
        .layer(CorsLayer::permissive())
        .with_state(store)
}

async fn handle_set(
    State(store): State<Arc<ReplicaStore>>,
    Json(payload): Json<Value>,
) -> StatusCode {
    match payload {
        Value::Object(map) => {
            debug!(keys = map.len(), "merging /set payload");
            store.merge(map);
            StatusCode::OK
        }
        _ => StatusCode::BAD_REQUEST,
    }
}

async fn handle_get(State(store): State<Arc<ReplicaStore>>) -> Json<Map<String, Value>> {
    Json(store.snapshot())
}
