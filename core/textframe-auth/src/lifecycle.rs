//! Install/update lifecycle handling.
//!
//! | Event   | Observed state                   | Action                          |
//! |---------|----------------------------------|---------------------------------|
//! | Install | any                              | ensure id, ensure key, register |
//! | Update  | id and key present               | nothing (or retry a registration that failed earlier in this process) |
//! | Update  | id absent                        | ensure id only                  |
//! | Update  | id present, key absent           | ensure key, register            |
//!
//! Failures are logged and swallowed. The next lifecycle event re-evaluates
//! the same state; there is no ceiling.
//!
//! Whether the server holds the key is not persisted. Reconciliation
//! registers the stored key once per process unless a registration already
//! succeeded in it, so a failure survives a restart as a pending retry.

use crate::error::{ProvisionError, ProvisionResult};
use crate::identity::IdentityManager;
use crate::registration::RegistrationClient;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use textframe_types::DeviceId;
use tracing::{debug, error, info};

/// Host lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleEvent {
    Install,
    Update,
}

/// What a lifecycle pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// Identity already complete; nothing was done.
    AlreadyProvisioned,
    /// Only a device id was created.
    DeviceIdCreated(DeviceId),
    /// A public key was registered under the device id.
    Registered {
        device_id: DeviceId,
        key_generated: bool,
    },
    /// Remediation failed and was deferred to the next event.
    Deferred { reason: String },
}

impl ProvisionOutcome {
    /// Returns true unless remediation failed.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        !matches!(self, Self::Deferred { .. })
    }
}

/// Registration status of the current process.
#[derive(Debug, Default)]
pub struct RegistrationState {
    registered: AtomicBool,
    pending: AtomicBool,
}

impl RegistrationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once a registration succeeded in this process.
    pub fn is_registered(&self) -> bool {
        self.registered.load(Ordering::SeqCst)
    }

    /// True if the last registration attempt in this process failed.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    fn record(&self, succeeded: bool) {
        self.registered.store(succeeded, Ordering::SeqCst);
        self.pending.store(!succeeded, Ordering::SeqCst);
    }
}

/// Drives the identity to a provisioned state on lifecycle events.
#[derive(Debug, Clone)]
pub struct LifecycleController {
    identity: Arc<IdentityManager>,
    registration: RegistrationClient,
    state: Arc<RegistrationState>,
}

impl LifecycleController {
    pub fn new(
        identity: Arc<IdentityManager>,
        registration: RegistrationClient,
        state: Arc<RegistrationState>,
    ) -> Self {
        Self {
            identity,
            registration,
            state,
        }
    }

    /// Returns true if a registration attempt failed in this process and has
    /// not succeeded since.
    pub fn registration_pending(&self) -> bool {
        self.state.is_pending()
    }

    /// Returns true if the key was registered by this process.
    pub fn registered(&self) -> bool {
        self.state.is_registered()
    }

    /// Handles a lifecycle event. Never fails; errors are logged.
    pub async fn handle(&self, event: LifecycleEvent) -> ProvisionOutcome {
        let result = match event {
            LifecycleEvent::Install => self.try_install().await,
            LifecycleEvent::Update => self.try_update().await,
        };
        self.settle(event, result)
    }

    /// Idempotent reconciliation: brings the identity to "id present, key
    /// present and registered" from any starting state. The first call in a
    /// process registers an existing key again; later calls are no-ops once
    /// that succeeded.
    pub async fn ensure_identity_provisioned(&self) -> ProvisionOutcome {
        let result = self.try_reconcile().await;
        self.settle_with("reconcile", result)
    }

    /// Install: provision everything and register.
    pub async fn try_install(&self) -> ProvisionResult<ProvisionOutcome> {
        let device_id = self.identity.ensure_device_id().await?;
        let had_key = self.identity.has_private_key().await?;
        self.register(device_id, !had_key).await
    }

    /// Update: remediate whatever is missing.
    pub async fn try_update(&self) -> ProvisionResult<ProvisionOutcome> {
        if !self.identity.has_device_id().await? {
            let device_id = self.identity.ensure_device_id().await?;
            return Ok(ProvisionOutcome::DeviceIdCreated(device_id));
        }

        let device_id = self.identity.ensure_device_id().await?;
        if !self.identity.has_private_key().await? {
            return self.register(device_id, true).await;
        }

        if self.registration_pending() {
            info!("Retrying pending registration for device {}", device_id);
            return self.register(device_id, false).await;
        }

        debug!("Device {} already provisioned", device_id);
        Ok(ProvisionOutcome::AlreadyProvisioned)
    }

    /// Reconciliation step behind [`Self::ensure_identity_provisioned`].
    pub async fn try_reconcile(&self) -> ProvisionResult<ProvisionOutcome> {
        let device_id = self.identity.ensure_device_id().await?;
        if !self.identity.has_private_key().await? {
            return self.register(device_id, true).await;
        }
        if !self.registered() {
            info!("Registering stored key for device {}", device_id);
            return self.register(device_id, false).await;
        }
        Ok(ProvisionOutcome::AlreadyProvisioned)
    }

    async fn register(
        &self,
        device_id: DeviceId,
        key_generated: bool,
    ) -> ProvisionResult<ProvisionOutcome> {
        // The key is persisted before the network call and never rolled back.
        let public_key = self.identity.ensure_key_pair().await?;

        match self
            .registration
            .register_public_key(&device_id, &public_key)
            .await
        {
            Ok(()) => {
                self.state.record(true);
                Ok(ProvisionOutcome::Registered {
                    device_id,
                    key_generated,
                })
            }
            Err(e) => {
                self.state.record(false);
                Err(ProvisionError::Registration(e))
            }
        }
    }

    fn settle(
        &self,
        event: LifecycleEvent,
        result: ProvisionResult<ProvisionOutcome>,
    ) -> ProvisionOutcome {
        let label = match event {
            LifecycleEvent::Install => "install",
            LifecycleEvent::Update => "update",
        };
        self.settle_with(label, result)
    }

    fn settle_with(
        &self,
        label: &str,
        result: ProvisionResult<ProvisionOutcome>,
    ) -> ProvisionOutcome {
        match result {
            Ok(outcome) => {
                debug!("Lifecycle {} finished: {:?}", label, outcome);
                outcome
            }
            Err(e) => {
                error!("Failed to set up device keys on {}: {}", label, e);
                ProvisionOutcome::Deferred {
                    reason: e.to_string(),
                }
            }
        }
    }
}
