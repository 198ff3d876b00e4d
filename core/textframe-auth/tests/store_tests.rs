use pretty_assertions::assert_eq;
use textframe_auth::{FileKeyStore, KeyStore, StorageError};

#[tokio::test]
async fn missing_file_reads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileKeyStore::new(dir.path().join("keystore.json"));
    assert_eq!(store.get("uuid").await.unwrap(), None);
}

#[tokio::test]
async fn set_then_get() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileKeyStore::new(dir.path().join("keystore.json"));

    store.set("uuid", "device-1").await.unwrap();
    store.set("privateKey", "secret").await.unwrap();

    assert_eq!(store.get("uuid").await.unwrap().as_deref(), Some("device-1"));
    assert_eq!(store.get("privateKey").await.unwrap().as_deref(), Some("secret"));
}

#[tokio::test]
async fn values_persist_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keystore.json");

    FileKeyStore::new(&path).set("uuid", "device-1").await.unwrap();

    let reopened = FileKeyStore::new(&path);
    assert_eq!(reopened.get("uuid").await.unwrap().as_deref(), Some("device-1"));
}

#[tokio::test]
async fn creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("deeper").join("keystore.json");
    let store = FileKeyStore::new(&path);

    store.set("uuid", "device-1").await.unwrap();
    assert!(path.exists());
    assert_eq!(store.path(), path.as_path());
}

#[tokio::test]
async fn file_is_a_json_object() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keystore.json");
    let store = FileKeyStore::new(&path);
    store.set("uuid", "device-1").await.unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(value, serde_json::json!({ "uuid": "device-1" }));
}

#[tokio::test]
async fn corrupt_file_is_reported_and_not_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keystore.json");
    std::fs::write(&path, "{ not json").unwrap();
    let store = FileKeyStore::new(&path);

    assert!(matches!(store.get("uuid").await, Err(StorageError::Corrupt(_))));
    assert!(matches!(
        store.set("uuid", "device-1").await,
        Err(StorageError::Corrupt(_))
    ));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
}

#[tokio::test]
async fn unreadable_path_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    // A directory where the file should be.
    let store = FileKeyStore::new(dir.path());
    assert!(matches!(
        store.get("uuid").await,
        Err(StorageError::Unavailable(_))
    ));
}

#[cfg(unix)]
#[tokio::test]
async fn file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keystore.json");
    FileKeyStore::new(&path).set("privateKey", "secret").await.unwrap();

    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn default_path_is_under_textframe_dir() {
    if let Some(path) = FileKeyStore::default_path() {
        assert!(path.ends_with("textframe/keystore.json"));
    }
}
