//! Public key registration.

use crate::error::{RegistrationError, RegistrationResult};
use crate::keys::DevicePublicKey;
use reqwest::Client;
use textframe_types::{DeviceId, RegisterKeyRequest, RegisterKeyResponse};
use tracing::{debug, info};

/// Path of the registration endpoint.
pub const REGISTER_PATH: &str = "/register_public_key";

/// Sends the device's public key to the server. Performs no retry and
/// persists nothing; the private key was stored before this is called.
#[derive(Debug, Clone)]
pub struct RegistrationClient {
    http: Client,
    url: String,
}

impl RegistrationClient {
    pub fn new(http: Client, url: String) -> Self {
        Self { http, url }
    }

    /// Registers `public_key` under `device_id`.
    ///
    /// # Errors
    ///
    /// Any transport failure, non-2xx status, unparsable body, or a body
    /// whose `status` is not `"success"` is a [`RegistrationError`].
    pub async fn register_public_key(
        &self,
        device_id: &DeviceId,
        public_key: &DevicePublicKey,
    ) -> RegistrationResult<()> {
        let body = RegisterKeyRequest {
            uuid: device_id.to_string(),
            public_key: public_key.to_base64(),
        };

        debug!("Registering public key for device {}", device_id);
        let response = self.http.post(&self.url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistrationError::Status {
                status: status.as_u16(),
            });
        }

        let result: RegisterKeyResponse = response
            .json()
            .await
            .map_err(|e| RegistrationError::InvalidResponse(e.to_string()))?;

        if !result.is_success() {
            return Err(RegistrationError::Rejected(
                result
                    .message
                    .unwrap_or_else(|| format!("server returned status {:?}", result.status)),
            ));
        }

        info!("Registered public key for device {}", device_id);
        Ok(())
    }
}
