//! Ed25519 device keys and nonce signatures.
//!
//! The private key is persisted in the 64-byte `seed || public` layout and
//! transmitted nowhere. Public keys and signatures travel as standard base64.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ed25519_dalek::{
    Signature as DalekSignature, Signer as _, SigningKey as DalekSigningKey, Verifier as _,
    VerifyingKey as DalekVerifyingKey,
};
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use crate::error::KeyError;

/// Length of an encoded public key.
pub const PUBLIC_KEY_LEN: usize = 32;

/// Length of a persisted private key (`seed || public`).
pub const KEYPAIR_LEN: usize = 64;

/// Length of a detached signature.
pub const SIGNATURE_LEN: usize = 64;

/// The device's private signing key.
pub struct DeviceSigningKey(DalekSigningKey);

/// The device's public key, as registered with the server.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DevicePublicKey(DalekVerifyingKey);

/// A detached signature over a nonce.
#[derive(Clone, PartialEq, Eq)]
pub struct NonceSignature(DalekSignature);

impl DeviceSigningKey {
    /// Generates a new random keypair.
    #[must_use]
    pub fn generate() -> Self {
        Self(DalekSigningKey::generate(&mut OsRng))
    }

    /// Creates a signing key from a 32-byte seed.
    #[must_use]
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self(DalekSigningKey::from_bytes(seed))
    }

    /// Loads a signing key from its 64-byte `seed || public` encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if the slice has the wrong length or the public half
    /// does not belong to the seed.
    pub fn from_keypair_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let bytes: &[u8; KEYPAIR_LEN] = bytes.try_into().map_err(|_| KeyError::InvalidLength {
            expected: KEYPAIR_LEN,
            actual: bytes.len(),
        })?;
        DalekSigningKey::from_keypair_bytes(bytes)
            .map(Self)
            .map_err(|_| KeyError::Mismatch)
    }

    /// Loads a signing key from its persisted base64 form.
    pub fn from_base64(encoded: &str) -> Result<Self, KeyError> {
        let bytes = Zeroizing::new(
            BASE64
                .decode(encoded.trim())
                .map_err(|e| KeyError::InvalidEncoding(e.to_string()))?,
        );
        Self::from_keypair_bytes(&bytes)
    }

    /// Returns the persisted base64 form. Zeroized on drop.
    #[must_use]
    pub fn to_base64(&self) -> Zeroizing<String> {
        let bytes = Zeroizing::new(self.0.to_keypair_bytes());
        Zeroizing::new(BASE64.encode(bytes.as_slice()))
    }

    /// Derives the public key.
    #[must_use]
    pub fn public_key(&self) -> DevicePublicKey {
        DevicePublicKey(self.0.verifying_key())
    }

    /// Signs a message.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> NonceSignature {
        NonceSignature(self.0.sign(message))
    }
}

impl std::fmt::Debug for DeviceSigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSigningKey")
            .field("public", &self.public_key())
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl DevicePublicKey {
    /// Creates a public key from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let bytes: &[u8; PUBLIC_KEY_LEN] =
            bytes.try_into().map_err(|_| KeyError::InvalidLength {
                expected: PUBLIC_KEY_LEN,
                actual: bytes.len(),
            })?;
        DalekVerifyingKey::from_bytes(bytes)
            .map(Self)
            .map_err(|_| KeyError::InvalidPublicKey)
    }

    /// Parses the base64 form sent during registration.
    pub fn from_base64(encoded: &str) -> Result<Self, KeyError> {
        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|e| KeyError::InvalidEncoding(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Returns the raw 32-byte public key.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LEN] {
        self.0.to_bytes()
    }

    /// Returns the base64 form sent during registration.
    #[must_use]
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0.as_bytes())
    }

    /// Verifies a signature against a message.
    pub fn verify(&self, message: &[u8], signature: &NonceSignature) -> Result<(), KeyError> {
        self.0
            .verify(message, &signature.0)
            .map_err(|_| KeyError::SignatureInvalid)
    }

    /// Verifies a signature over a nonce.
    pub fn verify_nonce(&self, nonce: &str, signature: &NonceSignature) -> Result<(), KeyError> {
        self.verify(nonce.as_bytes(), signature)
    }
}

impl std::fmt::Debug for DevicePublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("DevicePublicKey")
            .field(&self.to_base64())
            .finish()
    }
}

impl NonceSignature {
    /// Creates a signature from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        DalekSignature::from_slice(bytes)
            .map(Self)
            .map_err(|_| KeyError::InvalidLength {
                expected: SIGNATURE_LEN,
                actual: bytes.len(),
            })
    }

    /// Parses the base64 form carried in the signature header.
    pub fn from_base64(encoded: &str) -> Result<Self, KeyError> {
        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|e| KeyError::InvalidEncoding(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Returns the raw 64-byte signature.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LEN] {
        self.0.to_bytes()
    }

    /// Returns the base64 form carried in the signature header.
    #[must_use]
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0.to_bytes())
    }
}

impl std::fmt::Debug for NonceSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("NonceSignature")
            .field(&self.to_base64())
            .finish()
    }
}

/// Signs the UTF-8 bytes of a nonce. Deterministic and free of I/O.
#[must_use]
pub fn sign_nonce(nonce: &str, key: &DeviceSigningKey) -> NonceSignature {
    key.sign(nonce.as_bytes())
}
