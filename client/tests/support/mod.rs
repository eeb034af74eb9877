//! Shared helpers for client integration tests.
//!
//! Integration tests compile as separate crates under `client/tests/`, so the
//! recording session handler and token builders live here instead of being
//! repeated per file.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use erp_client::domain::ApiClient;
use erp_client::domain::ports::{SessionExpiredHandler, TokenStore};
use erp_client::outbound::http::ReqwestTransport;
use reqwest::Url;
use serde_json::Value;
use wiremock::MockServer;

/// Timeout used unless a test exercises timeouts explicitly.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Session-expired handler that records redirect requests.
#[derive(Debug, Default)]
pub struct RecordingSessionHandler {
    current_path: Mutex<Option<String>>,
    redirects: Mutex<Vec<String>>,
}

impl RecordingSessionHandler {
    /// Handler whose host is currently showing `path`.
    pub fn at(path: &str) -> Self {
        Self {
            current_path: Mutex::new(Some(path.to_owned())),
            redirects: Mutex::new(Vec::new()),
        }
    }

    /// Routes passed to `redirect_to_sign_in`, in call order.
    pub fn redirects(&self) -> Vec<String> {
        self.redirects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SessionExpiredHandler for RecordingSessionHandler {
    fn current_path(&self) -> Option<String> {
        self.current_path
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn redirect_to_sign_in(&self, route: &str) {
        self.redirects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route.to_owned());
    }
}

/// Build an unsigned JWT-shaped token carrying `payload`.
pub fn token_with(payload: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.signature")
}

/// Seed all five session keys, using `token` for both token keys.
pub fn seed_full_session(store: &dyn TokenStore, token: &str) {
    for (key, value) in [
        ("token", token),
        ("authToken", token),
        ("userData", r#"{"name":"Asha","role":"admin"}"#),
        ("role", "admin"),
        ("userRole", "admin"),
    ] {
        store.set(key, value).expect("seed session key");
    }
}

/// Base URL of the mock backend's API prefix.
pub fn api_base(server: &MockServer) -> Url {
    Url::parse(&format!("{}/api", server.uri())).expect("mock server URI is valid")
}

/// Client talking to `base` through the reqwest transport.
pub fn client_for(
    base: Url,
    timeout: Duration,
    store: Arc<dyn TokenStore>,
    handler: Arc<RecordingSessionHandler>,
) -> ApiClient {
    let transport = ReqwestTransport::new(base, timeout).expect("build transport");
    ApiClient::new(Arc::new(transport), store).with_session_handler(handler)
}
