//! Address fingerprinting.
//!
//! The ERP record stores a fingerprint of the last address a notification was
//! (or would have been) sent for, never the address itself. Comparing the
//! stored fingerprint with the fingerprint of the current address is how an
//! address change is detected.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::address::Address;

/// Fingerprint of an address's postal fields.
///
/// The empty checksum is the sentinel for "no address known"; it never equals
/// the checksum of a real address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressChecksum(String);

impl AddressChecksum {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap a checksum previously read from the ERP.
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for AddressChecksum {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Deterministic address fingerprint: SHA-256 over the length-prefixed postal
/// fields in canonical order, hex encoded.
///
/// Length prefixes keep the encoding injective (`"ab" + "c"` and `"a" + "bc"`
/// hash differently). The partner reference is not hashed.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressHasher;

impl AddressHasher {
    pub fn hash(address: &Address) -> AddressChecksum {
        let mut hasher = Sha256::new();
        for (_, value) in address.postal_fields() {
            hasher.update((value.len() as u32).to_be_bytes());
            hasher.update(value.as_bytes());
        }
        AddressChecksum(hex::encode(hasher.finalize()))
    }

    /// Like [`AddressHasher::hash`], mapping an absent address to the empty sentinel.
    pub fn hash_optional(address: Option<&Address>) -> AddressChecksum {
        address.map(Self::hash).unwrap_or_default()
    }
}
