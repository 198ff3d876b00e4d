//! Error types for device authentication.
//!
//! Each component has its own error enum so callers can tell a storage
//! outage from a rejected registration or a failed nonce fetch. None of them
//! are fatal: the lifecycle controller logs and defers, and authenticated
//! actions report failure to their caller.

use thiserror::Error;

/// Local key store errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing storage could not be read or written.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The backing storage holds data that cannot be parsed.
    #[error("storage corrupt: {0}")]
    Corrupt(String),
}

/// Result type for key store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Key material errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum KeyError {
    /// Decoded bytes have the wrong length.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Base64 decoding failed.
    #[error("invalid base64: {0}")]
    InvalidEncoding(String),

    /// The public half of a stored keypair does not match its seed.
    #[error("keypair halves do not match")]
    Mismatch,

    /// Bytes do not describe a valid Ed25519 point.
    #[error("invalid public key")]
    InvalidPublicKey,

    /// Signature verification failed.
    #[error("signature invalid")]
    SignatureInvalid,
}

/// Identity manager errors.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A private key is stored but cannot be decoded. It is never replaced
    /// automatically.
    #[error("stored private key is corrupt: {0}")]
    CorruptKey(#[source] KeyError),

    /// A device id is stored but is not a usable id.
    #[error("stored device id is corrupt: {0}")]
    CorruptDeviceId(String),
}

/// Result type for identity operations.
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Public key registration errors.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The request never produced a response.
    #[error("registration request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("registration failed: HTTP {status}")]
    Status { status: u16 },

    /// The server answered 2xx but reported a non-success status.
    #[error("registration rejected: {0}")]
    Rejected(String),

    /// The response body could not be parsed.
    #[error("invalid registration response: {0}")]
    InvalidResponse(String),
}

/// Result type for registration.
pub type RegistrationResult<T> = Result<T, RegistrationError>;

/// Nonce fetch errors.
#[derive(Debug, Error)]
pub enum NonceError {
    #[error("nonce request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("nonce retrieval failed: HTTP {status}")]
    Status { status: u16 },

    #[error("invalid nonce response: {0}")]
    InvalidResponse(String),
}

/// Request signing errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No private key is stored on this device.
    #[error("private key not found")]
    MissingKey,

    /// No device id is stored on this device.
    #[error("device id not found")]
    MissingDeviceId,

    #[error("nonce unavailable: {0}")]
    NonceUnavailable(#[from] NonceError),

    #[error("signing failed: {0}")]
    SignFailure(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result type for request signing.
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors raised while provisioning an identity. The lifecycle controller
/// catches these; they only escape through `try_*` entry points.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("identity: {0}")]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

/// Result type for provisioning.
pub type ProvisionResult<T> = Result<T, ProvisionError>;

/// Client configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid API base URL: {0}")]
    InvalidUrl(String),

    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },

    #[error("no local data directory available; set a store path explicitly")]
    NoDataDir,

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type for configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors from the search collaborator.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("search request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("search failed: HTTP {status}")]
    Status { status: u16 },

    #[error("invalid search response: {0}")]
    InvalidResponse(String),
}

/// Result type for search.
pub type SearchResult<T> = Result<T, SearchError>;
