//! Persistent device key registry backed by SQLite.
//!
//! One row per device id. Registration is an upsert: a device that
//! re-registers replaces its previous key.

use crate::error::{ApiError, ApiResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};
use textframe_auth::DevicePublicKey;
use textframe_types::DeviceId;

/// What an upsert did to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryChange {
    Created,
    Replaced,
    Unchanged,
}

/// Registry of device public keys.
pub struct KeyRegistry {
    conn: Arc<Mutex<Connection>>,
}

impl KeyRegistry {
    /// Opens (or creates) a registry at the given path.
    pub fn open(path: impl AsRef<Path>) -> ApiResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| ApiError::Storage(format!("failed to open key registry: {e}")))?;
        Self::with_connection(conn)
    }

    /// Opens an in-memory registry (for testing).
    pub fn open_in_memory() -> ApiResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            ApiError::Storage(format!("failed to open in-memory key registry: {e}"))
        })?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> ApiResult<Self> {
        let registry = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        registry.init_schema()?;
        Ok(registry)
    }

    fn init_schema(&self) -> ApiResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS public_keys (
                uuid TEXT PRIMARY KEY,
                public_key TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            ",
        )
        .map_err(|e| ApiError::Storage(format!("failed to init registry schema: {e}")))?;
        Ok(())
    }

    fn lock(&self) -> ApiResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ApiError::Storage("key registry lock poisoned".to_string()))
    }

    /// Stores `public_key` under `device_id`, replacing any previous key.
    pub fn upsert(
        &self,
        device_id: &DeviceId,
        public_key: &DevicePublicKey,
    ) -> ApiResult<RegistryChange> {
        let encoded = public_key.to_base64();
        let conn = self.lock()?;

        let existing: Option<String> = conn
            .query_row(
                "SELECT public_key FROM public_keys WHERE uuid = ?1",
                params![device_id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| ApiError::Storage(format!("failed to look up device: {e}")))?;

        let change = match existing {
            Some(current) if current == encoded => return Ok(RegistryChange::Unchanged),
            Some(_) => RegistryChange::Replaced,
            None => RegistryChange::Created,
        };

        conn.execute(
            "INSERT INTO public_keys (uuid, public_key, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(uuid) DO UPDATE SET public_key = excluded.public_key, updated_at = excluded.updated_at",
            params![device_id.as_str(), encoded, now_millis()],
        )
        .map_err(|e| ApiError::Storage(format!("failed to store public key: {e}")))?;
        Ok(change)
    }

    /// Returns the registered key of a device.
    pub fn public_key(&self, device_id: &DeviceId) -> ApiResult<Option<DevicePublicKey>> {
        let conn = self.lock()?;
        let encoded: Option<String> = conn
            .query_row(
                "SELECT public_key FROM public_keys WHERE uuid = ?1",
                params![device_id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| ApiError::Storage(format!("failed to look up device: {e}")))?;

        encoded
            .map(|raw| {
                DevicePublicKey::from_base64(&raw).map_err(|e| {
                    ApiError::Storage(format!("stored key for {device_id} is corrupt: {e}"))
                })
            })
            .transpose()
    }

    /// Number of registered devices.
    pub fn count(&self) -> ApiResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM public_keys", [], |row| row.get(0))
            .map_err(|e| ApiError::Storage(format!("failed to count devices: {e}")))?;
        Ok(count as usize)
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
