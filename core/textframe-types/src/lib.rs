//! Shared type definitions for TextFrame device authentication.
//!
//! Both the client library and the API server depend on this crate so the
//! two halves of the protocol agree on:
//! - Device identifiers
//! - Request/response bodies of the registration, nonce and search endpoints
//! - Authentication header names

mod ids;
mod wire;

pub use ids::DeviceId;
pub use wire::{
    NonceResponse, RegisterKeyRequest, RegisterKeyResponse, SearchRequest, HEADER_DEVICE_ID,
    HEADER_SIGNATURE, STATUS_ERROR, STATUS_SUCCESS,
};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid device id: {0}")]
    InvalidDeviceId(String),
}
