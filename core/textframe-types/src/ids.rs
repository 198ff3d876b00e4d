//! Device identifiers.
//!
//! A device id is generated from a random UUID v4 on first install, but the
//! protocol treats it as an opaque string: ids persisted by older clients are
//! accepted as long as they are non-empty and fit in a header value.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::Error;

/// Longest id accepted from storage or the wire.
const MAX_LEN: usize = 128;

/// Stable identifier of one client installation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    /// Generates a fresh random device id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Parses a device id from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is empty, too long, or contains characters
    /// that cannot travel in an HTTP header.
    pub fn parse(s: &str) -> crate::Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidDeviceId("empty".to_string()));
        }
        if s.len() > MAX_LEN {
            return Err(Error::InvalidDeviceId(format!(
                "longer than {MAX_LEN} characters"
            )));
        }
        if !s.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(Error::InvalidDeviceId(
                "contains non-printable or non-ASCII characters".to_string(),
            ));
        }
        Ok(Self(s.to_string()))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DeviceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DeviceId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DeviceId> for String {
    fn from(id: DeviceId) -> Self {
        id.0
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
