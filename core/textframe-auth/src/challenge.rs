//! Challenge-response request signing.
//!
//! Every privileged request is preceded by a nonce fetch. The nonce is
//! signed with the device key and the signature travels in
//! `X-Nonce-Signature` next to `X-UUID`. The server consumes the nonce on
//! first use, so a header set is good for exactly one request.

use crate::error::{AuthError, AuthResult, IdentityError, NonceError};
use crate::identity::IdentityManager;
use crate::keys::{sign_nonce, NonceSignature};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::sync::Arc;
use textframe_types::{DeviceId, NonceResponse, HEADER_DEVICE_ID, HEADER_SIGNATURE};
use tracing::debug;

/// Path of the nonce endpoint.
pub const NONCE_PATH: &str = "/get_nonce";

/// A server-issued single-use challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nonce(String);

impl Nonce {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Headers authenticating one outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthHeaders {
    pub device_id: DeviceId,
    pub signature: NonceSignature,
}

impl AuthHeaders {
    /// Returns `(header name, value)` pairs.
    #[must_use]
    pub fn pairs(&self) -> [(&'static str, String); 2] {
        [
            (HEADER_DEVICE_ID, self.device_id.to_string()),
            (HEADER_SIGNATURE, self.signature.to_base64()),
        ]
    }

    /// Returns the headers as a map ready to attach to a request.
    pub fn to_header_map(&self) -> AuthResult<HeaderMap> {
        let mut headers = HeaderMap::with_capacity(2);
        for (name, value) in self.pairs() {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| AuthError::SignFailure(format!("header name {name}: {e}")))?;
            let value = HeaderValue::from_str(&value)
                .map_err(|e| AuthError::SignFailure(format!("header {name}: {e}")))?;
            headers.insert(name, value);
        }
        Ok(headers)
    }
}

/// Fetches nonces and signs them with the stored device key.
#[derive(Debug, Clone)]
pub struct ChallengeSigner {
    http: Client,
    url: String,
    identity: Arc<IdentityManager>,
}

impl ChallengeSigner {
    pub fn new(http: Client, url: String, identity: Arc<IdentityManager>) -> Self {
        Self {
            http,
            url,
            identity,
        }
    }

    /// Requests a fresh nonce for `device_id`. No signature is needed here.
    pub async fn fetch_nonce(&self, device_id: &DeviceId) -> Result<Nonce, NonceError> {
        let response = self
            .http
            .post(&self.url)
            .header(HEADER_DEVICE_ID, device_id.as_str())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NonceError::Status {
                status: status.as_u16(),
            });
        }

        let body: NonceResponse = response
            .json()
            .await
            .map_err(|e| NonceError::InvalidResponse(e.to_string()))?;
        if body.nonce.is_empty() {
            return Err(NonceError::InvalidResponse("empty nonce".to_string()));
        }
        Ok(Nonce(body.nonce))
    }

    /// Builds the headers for one authenticated request.
    ///
    /// The stored key is loaded before any network traffic: with no key the
    /// nonce endpoint is never contacted.
    pub async fn build_auth_headers(&self, device_id: &DeviceId) -> AuthResult<AuthHeaders> {
        let key = match self.identity.signing_key().await {
            Ok(Some(key)) => key,
            Ok(None) => return Err(AuthError::MissingKey),
            Err(IdentityError::Storage(e)) => return Err(AuthError::Storage(e)),
            Err(e) => return Err(AuthError::SignFailure(e.to_string())),
        };

        let nonce = self.fetch_nonce(device_id).await?;
        debug!("Signing nonce for device {}", device_id);

        Ok(AuthHeaders {
            device_id: device_id.clone(),
            signature: sign_nonce(nonce.as_str(), &key),
        })
    }

    /// Builds headers for the device id held in the key store.
    pub async fn build_auth_headers_for_device(&self) -> AuthResult<AuthHeaders> {
        let device_id = match self.identity.device_id().await {
            Ok(Some(id)) => id,
            Ok(None) => return Err(AuthError::MissingDeviceId),
            Err(IdentityError::Storage(e)) => return Err(AuthError::Storage(e)),
            Err(e) => return Err(AuthError::SignFailure(e.to_string())),
        };
        self.build_auth_headers(&device_id).await
    }
}
