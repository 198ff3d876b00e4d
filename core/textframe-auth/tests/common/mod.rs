//! Shared test helpers for authentication tests.

#![allow(dead_code)]

use std::sync::Arc;
use textframe_auth::{
    ClientConfig, ClientContext, DeviceSigningKey, KeyStore, MemoryKeyStore, DEVICE_ID_KEY,
    PRIVATE_KEY_KEY,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_DEVICE_ID: &str = "0f8fad5b-d9cb-469f-a165-70867728950e";

/// Returns a deterministic signing key from a fixed seed.
pub fn test_signing_key() -> DeviceSigningKey {
    let seed: [u8; 32] = [
        1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24,
        25, 26, 27, 28, 29, 30, 31, 32,
    ];
    DeviceSigningKey::from_seed(&seed)
}

/// Builds a context over an in-memory store pointed at the mock server.
pub fn context(server: &MockServer, store: Arc<MemoryKeyStore>) -> ClientContext {
    ClientContext::new(ClientConfig::with_api_base_url(server.uri()), store).unwrap()
}

/// An in-memory store holding the test device id only.
pub fn store_with_device_id() -> Arc<MemoryKeyStore> {
    Arc::new(MemoryKeyStore::with_entries([(DEVICE_ID_KEY, TEST_DEVICE_ID)]))
}

/// An in-memory store holding the test device id and test key.
pub fn provisioned_store() -> Arc<MemoryKeyStore> {
    let key = test_signing_key();
    Arc::new(MemoryKeyStore::with_entries([
        (DEVICE_ID_KEY.to_string(), TEST_DEVICE_ID.to_string()),
        (PRIVATE_KEY_KEY.to_string(), key.to_base64().to_string()),
    ]))
}

pub async fn stored(store: &MemoryKeyStore, key: &str) -> Option<String> {
    store.get(key).await.unwrap()
}

/// Mounts a registration endpoint answering with the given status and body.
pub async fn mount_register(server: &MockServer, status: u16, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/register_public_key"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

/// Mounts a nonce endpoint issuing a fixed nonce.
pub async fn mount_nonce(server: &MockServer, nonce: &str) {
    Mock::given(method("POST"))
        .and(path("/get_nonce"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "nonce": nonce })))
        .mount(server)
        .await;
}

/// Returns the bodies of all requests the server received on `endpoint`.
pub async fn request_bodies(server: &MockServer, endpoint: &str) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|req| req.url.path() == endpoint)
        .map(|req| serde_json::from_slice(&req.body).unwrap())
        .collect()
}
