//! Secure key store abstraction.
//!
//! Durable key/value persistence local to one installation. The identity
//! manager only ever stores two entries: [`DEVICE_ID_KEY`] and
//! [`PRIVATE_KEY_KEY`].

use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Entry holding the device id.
pub const DEVICE_ID_KEY: &str = "uuid";

/// Entry holding the base64 64-byte private key.
pub const PRIVATE_KEY_KEY: &str = "privateKey";

/// Abstract key/value store. Operations are logically atomic per key.
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// Returns the name of the backing store, for diagnostics.
    fn backend_name(&self) -> &'static str;

    /// Reads a value, or `None` if the key was never set.
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Writes a value. Never silently drops the write.
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;
}

/// In-memory store for tests and ephemeral hosts.
#[derive(Debug, Default)]
pub struct MemoryKeyStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with entries.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: RwLock::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl KeyStore for MemoryKeyStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// JSON file store scoped to the installation's local data directory.
///
/// The whole file is rewritten on every `set` through a temp file and a
/// rename, so readers never observe a half-written file. On Unix the file is
/// only readable by its owner.
#[derive(Debug)]
pub struct FileKeyStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileKeyStore {
    /// Opens a store at the given path. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Default location: `<local data dir>/textframe/keystore.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_local_dir().map(|dir| dir.join("textframe").join("keystore.json"))
    }

    /// Returns the path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> StorageResult<BTreeMap<String, String>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                StorageError::Corrupt(format!("{}: {e}", self.path.display()))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(StorageError::Unavailable(format!(
                "failed to read {}: {e}",
                self.path.display()
            ))),
        }
    }

    async fn persist(&self, entries: &BTreeMap<String, String>) -> StorageResult<()> {
        let unavailable = |what: &str, e: std::io::Error| {
            StorageError::Unavailable(format!("failed to {what} {}: {e}", self.path.display()))
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| unavailable("create directory for", e))?;
            }
        }

        let content = serde_json::to_vec_pretty(entries)
            .map_err(|e| StorageError::Unavailable(format!("failed to serialize: {e}")))?;

        let tmp_path = self.path.with_extension("json.tmp");
        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options
            .open(&tmp_path)
            .await
            .map_err(|e| unavailable("open temp file for", e))?;
        file.write_all(&content)
            .await
            .map_err(|e| unavailable("write", e))?;
        file.sync_all().await.map_err(|e| unavailable("sync", e))?;
        drop(file);

        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| unavailable("replace", e))?;
        Ok(())
    }
}

#[async_trait]
impl KeyStore for FileKeyStore {
    fn backend_name(&self) -> &'static str {
        "file"
    }

    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries).await?;
        debug!("Persisted key store entry '{}' to {}", key, self.path.display());
        Ok(())
    }
}
