//! Process-wide client context.
//!
//! Built once at process start and kept for the lifetime of the process.
//! Holds the configuration, the HTTP transport, the identity manager and the
//! in-process registration state shared by every component.

use crate::challenge::{AuthHeaders, ChallengeSigner, NONCE_PATH};
use crate::config::ClientConfig;
use crate::error::{AuthResult, ConfigResult};
use crate::identity::IdentityManager;
use crate::lifecycle::{LifecycleController, LifecycleEvent, ProvisionOutcome, RegistrationState};
use crate::registration::{RegistrationClient, REGISTER_PATH};
use crate::search::{SearchClient, SEARCH_PATH};
use crate::store::{FileKeyStore, KeyStore};
use reqwest::Client;
use std::sync::Arc;
use textframe_types::DeviceId;
use tracing::info;

#[derive(Debug, Clone)]
pub struct ClientContext {
    config: ClientConfig,
    http: Client,
    identity: Arc<IdentityManager>,
    registration_state: Arc<RegistrationState>,
}

impl ClientContext {
    /// Creates a context over an explicit key store.
    pub fn new(config: ClientConfig, store: Arc<dyn KeyStore>) -> ConfigResult<Self> {
        config.validate()?;
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            config,
            http,
            identity: Arc::new(IdentityManager::new(store)),
            registration_state: Arc::new(RegistrationState::new()),
        })
    }

    /// Creates a context backed by the file key store named in `config`.
    pub fn open(config: ClientConfig) -> ConfigResult<Self> {
        let path = config.resolved_store_path()?;
        info!("Using key store at {}", path.display());
        Self::new(config, Arc::new(FileKeyStore::new(path)))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn identity(&self) -> &Arc<IdentityManager> {
        &self.identity
    }

    pub fn registration(&self) -> RegistrationClient {
        RegistrationClient::new(self.http.clone(), self.config.endpoint(REGISTER_PATH))
    }

    pub fn signer(&self) -> ChallengeSigner {
        ChallengeSigner::new(
            self.http.clone(),
            self.config.endpoint(NONCE_PATH),
            Arc::clone(&self.identity),
        )
    }

    pub fn lifecycle(&self) -> LifecycleController {
        LifecycleController::new(
            Arc::clone(&self.identity),
            self.registration(),
            Arc::clone(&self.registration_state),
        )
    }

    pub fn search(&self) -> SearchClient {
        SearchClient::new(
            self.http.clone(),
            self.config.endpoint(SEARCH_PATH),
            self.signer(),
        )
    }

    /// Handles a host lifecycle event.
    pub async fn on_lifecycle_event(&self, event: LifecycleEvent) -> ProvisionOutcome {
        self.lifecycle().handle(event).await
    }

    /// Reconciles the identity; see
    /// [`LifecycleController::ensure_identity_provisioned`].
    pub async fn ensure_identity_provisioned(&self) -> ProvisionOutcome {
        self.lifecycle().ensure_identity_provisioned().await
    }

    /// Builds the headers for one authenticated request.
    pub async fn build_auth_headers(&self, device_id: &DeviceId) -> AuthResult<AuthHeaders> {
        self.signer().build_auth_headers(device_id).await
    }
}
