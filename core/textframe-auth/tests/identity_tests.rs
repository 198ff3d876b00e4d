mod common;

use common::{provisioned_store, store_with_device_id, stored, test_signing_key, TEST_DEVICE_ID};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use textframe_auth::{
    FileKeyStore, IdentityError, IdentityManager, KeyStore, MemoryKeyStore, DEVICE_ID_KEY,
    PRIVATE_KEY_KEY,
};

fn manager(store: Arc<MemoryKeyStore>) -> IdentityManager {
    IdentityManager::new(store)
}

// ── Device id ────────────────────────────────────────────────────

#[tokio::test]
async fn ensure_device_id_is_idempotent() {
    let store = Arc::new(MemoryKeyStore::new());
    let identity = manager(store.clone());

    let first = identity.ensure_device_id().await.unwrap();
    let second = identity.ensure_device_id().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(stored(&store, DEVICE_ID_KEY).await.as_deref(), Some(first.as_str()));
}

#[tokio::test]
async fn ensure_device_id_keeps_existing() {
    let identity = manager(store_with_device_id());
    let id = identity.ensure_device_id().await.unwrap();
    assert_eq!(id.as_str(), TEST_DEVICE_ID);
}

#[tokio::test]
async fn concurrent_ensure_device_id_converges() {
    let identity = Arc::new(manager(Arc::new(MemoryKeyStore::new())));

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let identity = Arc::clone(&identity);
            tokio::spawn(async move { identity.ensure_device_id().await.unwrap() })
        })
        .collect();

    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap());
    }
    assert!(ids.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test]
async fn device_id_probe() {
    let identity = manager(Arc::new(MemoryKeyStore::new()));
    assert!(!identity.has_device_id().await.unwrap());
    assert_eq!(identity.device_id().await.unwrap(), None);

    identity.ensure_device_id().await.unwrap();
    assert!(identity.has_device_id().await.unwrap());
}

#[tokio::test]
async fn empty_device_id_counts_as_absent() {
    let store = Arc::new(MemoryKeyStore::with_entries([(DEVICE_ID_KEY, "")]));
    let identity = manager(store.clone());
    assert!(!identity.has_device_id().await.unwrap());

    let id = identity.ensure_device_id().await.unwrap();
    assert_eq!(stored(&store, DEVICE_ID_KEY).await.as_deref(), Some(id.as_str()));
}

#[tokio::test]
async fn corrupt_device_id_is_reported() {
    let store = Arc::new(MemoryKeyStore::with_entries([(DEVICE_ID_KEY, "not a valid id")]));
    let identity = manager(store);
    let err = identity.ensure_device_id().await.unwrap_err();
    assert!(matches!(err, IdentityError::CorruptDeviceId(_)));
}

// ── Key pair ─────────────────────────────────────────────────────

#[tokio::test]
async fn ensure_key_pair_is_idempotent() {
    let store = Arc::new(MemoryKeyStore::new());
    let identity = manager(store.clone());

    let first = identity.ensure_key_pair().await.unwrap();
    let stored_key = stored(&store, PRIVATE_KEY_KEY).await.unwrap();
    let second = identity.ensure_key_pair().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(stored(&store, PRIVATE_KEY_KEY).await.unwrap(), stored_key);
}

#[tokio::test]
async fn ensure_key_pair_returns_existing_public_key() {
    let identity = manager(provisioned_store());
    let public = identity.ensure_key_pair().await.unwrap();
    assert_eq!(public, test_signing_key().public_key());
}

#[tokio::test]
async fn concurrent_ensure_key_pair_converges() {
    let identity = Arc::new(manager(Arc::new(MemoryKeyStore::new())));

    let (a, b, c) = tokio::join!(
        identity.ensure_key_pair(),
        identity.ensure_key_pair(),
        identity.ensure_key_pair()
    );
    let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());
    assert_eq!(a, b);
    assert_eq!(b, c);
}

#[tokio::test]
async fn private_key_is_stored_as_64_byte_base64() {
    use base64::{engine::general_purpose::STANDARD, Engine};

    let store = Arc::new(MemoryKeyStore::new());
    let identity = manager(store.clone());
    let public = identity.ensure_key_pair().await.unwrap();

    let raw = stored(&store, PRIVATE_KEY_KEY).await.unwrap();
    let bytes = STANDARD.decode(raw).unwrap();
    assert_eq!(bytes.len(), 64);
    assert_eq!(&bytes[32..], &public.to_bytes());
}

#[tokio::test]
async fn corrupt_private_key_is_not_replaced() {
    let store = Arc::new(MemoryKeyStore::with_entries([(PRIVATE_KEY_KEY, "!!not-base64!!")]));
    let identity = manager(store.clone());

    assert!(identity.has_private_key().await.unwrap());
    let err = identity.ensure_key_pair().await.unwrap_err();
    assert!(matches!(err, IdentityError::CorruptKey(_)));
    assert_eq!(
        stored(&store, PRIVATE_KEY_KEY).await.as_deref(),
        Some("!!not-base64!!")
    );
}

#[tokio::test]
async fn signing_key_absent() {
    let identity = manager(Arc::new(MemoryKeyStore::new()));
    assert!(identity.signing_key().await.unwrap().is_none());
    assert!(!identity.has_private_key().await.unwrap());
}

// ── Durable storage ──────────────────────────────────────────────

#[tokio::test]
async fn identity_survives_restart_with_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keystore.json");

    let (id, public) = {
        let identity = IdentityManager::new(Arc::new(FileKeyStore::new(&path)));
        (
            identity.ensure_device_id().await.unwrap(),
            identity.ensure_key_pair().await.unwrap(),
        )
    };

    let identity = IdentityManager::new(Arc::new(FileKeyStore::new(&path)));
    assert_eq!(identity.ensure_device_id().await.unwrap(), id);
    assert_eq!(identity.ensure_key_pair().await.unwrap(), public);

    let store = FileKeyStore::new(&path);
    assert!(store.get(PRIVATE_KEY_KEY).await.unwrap().is_some());
}
