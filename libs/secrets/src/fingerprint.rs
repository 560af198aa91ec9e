//! Content fingerprints used for change detection.
//!
//! Only the SHA-256 digest of a delivered value is kept; the value itself
//! never is.

use sha2::{Digest, Sha256};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(value: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(value)))
    }

    pub fn matches(&self, value: &[u8]) -> bool {
        *self == Self::of(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
