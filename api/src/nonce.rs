//! Single-use nonce issuance.
//!
//! Each device has at most one outstanding nonce. Issuing a new one replaces
//! the previous; taking one removes it whether or not the caller's signature
//! turns out to be valid.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use std::collections::HashMap;
use std::time::Duration;
use textframe_types::DeviceId;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

/// Random bytes per nonce before encoding.
pub const NONCE_BYTES: usize = 16;

/// Default lifetime of an unused nonce.
pub const DEFAULT_NONCE_TTL: Duration = Duration::from_secs(300);

struct IssuedNonce {
    value: String,
    expires_at: Instant,
}

/// Outstanding nonces keyed by device.
pub struct NonceBook {
    entries: RwLock<HashMap<DeviceId, IssuedNonce>>,
    ttl: Duration,
}

impl NonceBook {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a fresh nonce for `device_id`, replacing any outstanding one.
    pub async fn issue(&self, device_id: &DeviceId) -> String {
        let mut bytes = [0u8; NONCE_BYTES];
        OsRng.fill_bytes(&mut bytes);
        let value = URL_SAFE_NO_PAD.encode(bytes);

        let issued = IssuedNonce {
            value: value.clone(),
            expires_at: Instant::now() + self.ttl,
        };
        self.entries.write().await.insert(device_id.clone(), issued);
        debug!("Issued nonce for device {}", device_id);
        value
    }

    /// Removes and returns the outstanding nonce of `device_id`. Expired
    /// nonces are removed too but reported as absent.
    pub async fn take(&self, device_id: &DeviceId) -> Option<String> {
        let issued = self.entries.write().await.remove(device_id)?;
        if Instant::now() >= issued.expires_at {
            debug!("Nonce for device {} expired", device_id);
            return None;
        }
        Some(issued.value)
    }

    /// Drops every expired nonce. Returns how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, issued| issued.expires_at > now);
        before - entries.len()
    }

    /// Number of outstanding nonces.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for NonceBook {
    fn default() -> Self {
        Self::new(DEFAULT_NONCE_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(s: &str) -> DeviceId {
        DeviceId::parse(s).unwrap()
    }

    #[tokio::test]
    async fn nonce_is_urlsafe_and_sized() {
        let book = NonceBook::default();
        let nonce = book.issue(&device("a")).await;
        assert_eq!(URL_SAFE_NO_PAD.decode(&nonce).unwrap().len(), NONCE_BYTES);
        assert!(!nonce.contains(['+', '/', '=']));
    }

    #[tokio::test]
    async fn take_is_single_use() {
        let book = NonceBook::default();
        let nonce = book.issue(&device("a")).await;
        assert_eq!(book.take(&device("a")).await, Some(nonce));
        assert_eq!(book.take(&device("a")).await, None);
    }

    #[tokio::test]
    async fn reissue_replaces_previous() {
        let book = NonceBook::default();
        let first = book.issue(&device("a")).await;
        let second = book.issue(&device("a")).await;
        assert_ne!(first, second);
        assert_eq!(book.take(&device("a")).await, Some(second));
        assert_eq!(book.len().await, 0);
    }

    #[tokio::test]
    async fn nonces_are_scoped_per_device() {
        let book = NonceBook::default();
        book.issue(&device("a")).await;
        assert_eq!(book.take(&device("b")).await, None);
        assert!(book.take(&device("a")).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn expired_nonce_is_absent() {
        let book = NonceBook::new(Duration::from_secs(10));
        book.issue(&device("a")).await;
        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(book.take(&device("a")).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn purge_drops_only_expired() {
        let book = NonceBook::new(Duration::from_secs(10));
        book.issue(&device("old")).await;
        tokio::time::advance(Duration::from_secs(6)).await;
        book.issue(&device("new")).await;
        tokio::time::advance(Duration::from_secs(6)).await;

        assert_eq!(book.purge_expired().await, 1);
        assert!(book.take(&device("new")).await.is_some());
    }
}
