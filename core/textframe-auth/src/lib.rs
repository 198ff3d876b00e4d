//! Device identity and challenge-response authentication for TextFrame.
//!
//! This crate handles:
//! - A durable per-installation device id and Ed25519 keypair
//! - One-time registration of the public key with the API server
//! - Per-request nonce fetch and signing (`X-UUID` / `X-Nonce-Signature`)
//! - Install/update lifecycle remediation
//!
//! # Design Principles
//!
//! - **No bearer credentials**: the server only ever stores public keys
//! - **Single-use proofs**: every authenticated request signs a fresh nonce
//! - **Never fatal**: provisioning failures are logged and retried on the
//!   next lifecycle event; signing failures surface as failed actions
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use textframe_auth::{ClientConfig, ClientContext, LifecycleEvent, MemoryKeyStore};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let ctx = ClientContext::new(
//!     ClientConfig::with_api_base_url("https://api.example.com"),
//!     Arc::new(MemoryKeyStore::new()),
//! )?;
//! ctx.on_lifecycle_event(LifecycleEvent::Install).await;
//! let positions = ctx.search().search("dQw4w9WgXcQ", "chorus").await;
//! # let _ = positions;
//! # Ok(())
//! # }
//! ```

mod challenge;
mod config;
mod context;
mod error;
mod identity;
mod keys;
mod lifecycle;
mod registration;
mod search;
mod store;

pub use challenge::{AuthHeaders, ChallengeSigner, Nonce, NONCE_PATH};
pub use config::{ClientConfig, ENV_API_URL, ENV_STORE_PATH, ENV_TIMEOUT_SECS};
pub use context::ClientContext;
pub use error::{
    AuthError, AuthResult, ConfigError, ConfigResult, IdentityError, IdentityResult, KeyError,
    NonceError, ProvisionError, ProvisionResult, RegistrationError, RegistrationResult,
    SearchError, SearchResult, StorageError, StorageResult,
};
pub use identity::IdentityManager;
pub use keys::{
    sign_nonce, DevicePublicKey, DeviceSigningKey, NonceSignature, KEYPAIR_LEN, PUBLIC_KEY_LEN,
    SIGNATURE_LEN,
};
pub use lifecycle::{LifecycleController, LifecycleEvent, ProvisionOutcome, RegistrationState};
pub use registration::{RegistrationClient, REGISTER_PATH};
pub use search::{parse_positions, video_id_from_url, SearchClient, SEARCH_PATH};
pub use store::{FileKeyStore, KeyStore, MemoryKeyStore, DEVICE_ID_KEY, PRIVATE_KEY_KEY};
