//! Request and response bodies exchanged with the API server.

use serde::{Deserialize, Serialize};

/// Header carrying the device id on nonce and authenticated requests.
pub const HEADER_DEVICE_ID: &str = "X-UUID";

/// Header carrying the base64 signature over the current nonce.
pub const HEADER_SIGNATURE: &str = "X-Nonce-Signature";

/// `status` value of a successful registration.
pub const STATUS_SUCCESS: &str = "success";

/// `status` value of a failed registration.
pub const STATUS_ERROR: &str = "error";

/// Body of `POST /register_public_key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterKeyRequest {
    /// Device id the key is registered under.
    pub uuid: String,
    /// Standard base64 of the 32-byte Ed25519 public key.
    pub public_key: String,
}

/// Response of `POST /register_public_key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterKeyResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RegisterKeyResponse {
    #[must_use]
    pub fn success() -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            message: None,
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: STATUS_ERROR.to_string(),
            message: Some(message.into()),
        }
    }

    /// Returns true if the server acknowledged the registration.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}

/// Response of `POST /get_nonce`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonceResponse {
    pub nonce: String,
}

/// Body of the authenticated `POST /search` action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub video_id: String,
}
