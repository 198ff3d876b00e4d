//! Device identity management.
//!
//! Owns generation and persistence of the device id and the Ed25519
//! keypair. Both are created at most once per installation: every
//! read-check-write runs under one in-process mutex, so two lifecycle events
//! racing each other converge on the same id and the same key.

use crate::error::{IdentityError, IdentityResult};
use crate::keys::{DevicePublicKey, DeviceSigningKey};
use crate::store::{KeyStore, DEVICE_ID_KEY, PRIVATE_KEY_KEY};
use std::sync::Arc;
use textframe_types::DeviceId;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Creates and reads the device identity.
pub struct IdentityManager {
    store: Arc<dyn KeyStore>,
    mutation: Mutex<()>,
}

impl IdentityManager {
    pub fn new(store: Arc<dyn KeyStore>) -> Self {
        Self {
            store,
            mutation: Mutex::new(()),
        }
    }

    /// Returns the backing key store.
    pub fn store(&self) -> &Arc<dyn KeyStore> {
        &self.store
    }

    /// Returns the stored device id, if any.
    pub async fn device_id(&self) -> IdentityResult<Option<DeviceId>> {
        match self.store.get(DEVICE_ID_KEY).await? {
            Some(raw) if !raw.trim().is_empty() => DeviceId::parse(&raw)
                .map(Some)
                .map_err(|e| IdentityError::CorruptDeviceId(e.to_string())),
            _ => Ok(None),
        }
    }

    /// Returns the stored signing key, if any.
    pub async fn signing_key(&self) -> IdentityResult<Option<DeviceSigningKey>> {
        match self.store.get(PRIVATE_KEY_KEY).await? {
            Some(raw) if !raw.trim().is_empty() => DeviceSigningKey::from_base64(&raw)
                .map(Some)
                .map_err(IdentityError::CorruptKey),
            _ => Ok(None),
        }
    }

    pub async fn has_device_id(&self) -> IdentityResult<bool> {
        Ok(self.device_id().await?.is_some())
    }

    pub async fn has_private_key(&self) -> IdentityResult<bool> {
        Ok(self
            .store
            .get(PRIVATE_KEY_KEY)
            .await?
            .is_some_and(|raw| !raw.trim().is_empty()))
    }

    /// Returns the existing device id or creates and persists a new one.
    pub async fn ensure_device_id(&self) -> IdentityResult<DeviceId> {
        let _guard = self.mutation.lock().await;

        if let Some(id) = self.device_id().await? {
            return Ok(id);
        }

        let id = DeviceId::generate();
        self.store.set(DEVICE_ID_KEY, id.as_str()).await?;
        info!("Generated device id {}", id);
        Ok(id)
    }

    /// Returns the public key of the stored keypair, generating and
    /// persisting a new keypair only when none exists.
    pub async fn ensure_key_pair(&self) -> IdentityResult<DevicePublicKey> {
        let _guard = self.mutation.lock().await;

        if let Some(key) = self.signing_key().await? {
            debug!("Reusing stored device keypair");
            return Ok(key.public_key());
        }

        let key = DeviceSigningKey::generate();
        self.store.set(PRIVATE_KEY_KEY, &key.to_base64()).await?;
        info!("Generated device keypair");
        Ok(key.public_key())
    }
}

impl std::fmt::Debug for IdentityManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityManager")
            .field("store", &self.store.backend_name())
            .finish()
    }
}
