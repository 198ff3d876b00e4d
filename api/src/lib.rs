//! HTTP API for TextFrame device authentication.
//!
//! Devices register an Ed25519 public key once, then prove possession of
//! the private half on every privileged request by signing a single-use
//! nonce fetched from `/get_nonce`.

mod error;
mod nonce;
mod registry;
mod routes;
mod search;

pub use error::{ApiError, ApiResult};
pub use nonce::{NonceBook, DEFAULT_NONCE_TTL, NONCE_BYTES};
pub use registry::{KeyRegistry, RegistryChange};
pub use routes::verify_request;
pub use search::{match_segments, SearchBackend, Segment, TranscriptIndex};

use axum::routing::post;
use axum::Router;
use std::sync::Arc;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<KeyRegistry>,
    pub nonces: Arc<NonceBook>,
    pub backend: Arc<dyn SearchBackend>,
}

impl AppState {
    pub fn new(
        registry: KeyRegistry,
        nonces: NonceBook,
        backend: impl SearchBackend + 'static,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            nonces: Arc::new(nonces),
            backend: Arc::new(backend),
        }
    }
}

/// Build the HTTP API router with the given state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/register_public_key", post(routes::register_public_key))
        .route("/get_nonce", post(routes::get_nonce))
        .route("/search", post(routes::search))
        .with_state(state)
}
