//! HTTP transport implementation.
//!
//! The actual HTTP client is abstracted via a trait so embedders can
//! bring whatever HTTP library they already ship (reqwest, ureq, a
//! platform webview fetch). A loopback client is provided for driving a
//! real exchange store in-process.

use crate::error::{SyncError, SyncResult};
use crate::transport::{ExchangePayload, ExchangeTransport};
use async_trait::async_trait;
use serde_json::Value;

/// HTTP client abstraction.
///
/// Both calls resolve to `(status, body)` on any completed HTTP
/// exchange; `Err` is reserved for transport-level failure (connect,
/// timeout, broken stream).
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends a POST with a JSON body.
    async fn post_json(&self, url: &str, body: String) -> Result<(u16, String), String>;

    /// Sends a GET expecting a JSON body.
    async fn get_json(&self, url: &str) -> Result<(u16, String), String>;
}

/// HTTP-based exchange transport speaking `POST {base}/set` and
/// `GET {base}/get`.
pub struct HttpExchange<C: HttpClient> {
    base_url: String,
    client: C,
}

impl<C: HttpClient> HttpExchange<C> {
    /// Creates a transport against the given base URL.
    pub fn new(base_url: impl Into<String>, client: C) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl<C: HttpClient> ExchangeTransport for HttpExchange<C> {
    async fn push(&self, payload: &ExchangePayload) -> SyncResult<()> {
        let body = serde_json::to_string(payload)
            .map_err(|e| SyncError::malformed(format!("failed to encode payload: {e}")))?;
        let url = format!("{}/set", self.base_url);
        let (status, _body) = self
            .client
            .post_json(&url, body)
            .await
            .map_err(SyncError::transport)?;
        if !(200..300).contains(&status) {
            return Err(SyncError::Status(status));
        }
        Ok(())
    }

    async fn pull(&self) -> SyncResult<ExchangePayload> {
        let url = format!("{}/get", self.base_url);
        let (status, body) = self
            .client
            .get_json(&url)
            .await
            .map_err(SyncError::transport)?;
        if !(200..300).contains(&status) {
            return Err(SyncError::Status(status));
        }
        serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|value| value.as_object().cloned())
            .ok_or_else(|| SyncError::malformed("exchange body is not a JSON object"))
    }
}

/// A server that can answer exchange requests in-process.
pub trait LoopbackServer: Send + Sync {
    /// Handles a `/set` body.
    fn handle_set(&self, body: &str) -> Result<(), String>;

    /// Handles a `/get`, returning the JSON snapshot.
    fn handle_get(&self) -> Result<String, String>;
}

/// An [`HttpClient`] that routes requests directly to a
/// [`LoopbackServer`], with no network in between.
pub struct LoopbackClient<S: LoopbackServer> {
    server: S,
}

impl<S: LoopbackServer> LoopbackClient<S> {
    /// Creates a loopback client over the given server.
    pub fn new(server: S) -> Self {
        Self { server }
    }
}

#[async_trait]
impl<S: LoopbackServer> HttpClient for LoopbackClient<S> {
    async fn post_json(&self, url: &str, body: String) -> Result<(u16, String), String> {
        if !url.ends_with("/set") {
            return Ok((404, String::new()));
        }
        match self.server.handle_set(&body) {
            Ok(()) => Ok((200, String::new())),
            Err(_) => Ok((400, String::new())),
        }
    }

    async fn get_json(&self, url: &str) -> Result<(u16, String), String> {
        if !url.ends_with("/get") {
            return Ok((404, String::new()));
        }
        match self.server.handle_get() {
            Ok(body) => Ok((200, body)),
            Err(message) => Err(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    #[derive(Default)]
    struct TestClient {
        status: Mutex<u16>,
        body: Mutex<String>,
        fail: Mutex<bool>,
        posts: Mutex<Vec<String>>,
    }

    impl TestClient {
        fn respond(&self, status: u16, body: &str) {
            *self.status.lock() = status;
            *self.body.lock() = body.to_string();
        }

        fn fail(&self) {
            *self.fail.lock() = true;
        }
    }

    #[async_trait]
    impl HttpClient for &TestClient {
        async fn post_json(&self, _url: &str, body: String) -> Result<(u16, String), String> {
            if *self.fail.lock() {
                return Err("connection refused".into());
            }
            self.posts.lock().push(body);
            Ok((*self.status.lock(), self.body.lock().clone()))
        }

        async fn get_json(&self, _url: &str) -> Result<(u16, String), String> {
            if *self.fail.lock() {
                return Err("connection refused".into());
            }
            Ok((*self.status.lock(), self.body.lock().clone()))
        }
    }

    fn payload() -> ExchangePayload {
        let mut map = ExchangePayload::new();
        map.insert("favorite".into(), json!({"movie": [1]}));
        map
    }

    #[tokio::test]
    async fn push_posts_serialized_payload() {
        let client = TestClient::default();
        client.respond(200, "");
        let exchange = HttpExchange::new("http://127.0.0.1:8181", &client);

        exchange.push(&payload()).await.unwrap();

        let posts = client.posts.lock();
        assert_eq!(posts.len(), 1);
        let sent: Value = serde_json::from_str(&posts[0]).unwrap();
        assert_eq!(sent["favorite"], json!({"movie": [1]}));
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let client = TestClient::default();
        client.respond(500, "boom");
        let exchange = HttpExchange::new("http://127.0.0.1:8181", &client);

        assert!(matches!(
            exchange.push(&payload()).await,
            Err(SyncError::Status(500))
        ));
        assert!(matches!(exchange.pull().await, Err(SyncError::Status(500))));
    }

    #[tokio::test]
    async fn transport_failure_is_reported() {
        let client = TestClient::default();
        client.fail();
        let exchange = HttpExchange::new("http://127.0.0.1:8181", &client);

        assert!(matches!(
            exchange.pull().await,
            Err(SyncError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn pull_rejects_non_object_bodies() {
        let client = TestClient::default();
        let exchange = HttpExchange::new("http://127.0.0.1:8181", &client);

        for body in ["not json", "[1,2,3]", "\"text\"", ""] {
            client.respond(200, body);
            assert!(matches!(
                exchange.pull().await,
                Err(SyncError::Malformed(_))
            ));
        }

        client.respond(200, r#"{"favorite": {"movie": [1]}}"#);
        let pulled = exchange.pull().await.unwrap();
        assert_eq!(pulled["favorite"], json!({"movie": [1]}));
    }
}
