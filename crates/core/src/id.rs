//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Maximum length of a business partner key in bytes (ERP column width).
pub const PARTNER_KEY_MAX_LEN: usize = 10;

/// Identifier of a business partner in the ERP.
///
/// The ERP treats the key as opaque; we only require it to be non-empty and to
/// fit the ERP column so it can travel inside a confirmation token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PartnerKey(String);

impl PartnerKey {
    pub fn new(key: impl Into<String>) -> Result<Self, DomainError> {
        let key = key.into();
        let trimmed = key.trim();
        if trimmed.is_empty() {
            return Err(DomainError::invalid_key("PartnerKey: must not be empty"));
        }
        if trimmed.len() > PARTNER_KEY_MAX_LEN {
            return Err(DomainError::invalid_key(format!(
                "PartnerKey: '{trimmed}' exceeds {PARTNER_KEY_MAX_LEN} bytes"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for PartnerKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PartnerKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for PartnerKey {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PartnerKey> for String {
    fn from(value: PartnerKey) -> Self {
        value.0
    }
}

impl AsRef<str> for PartnerKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
