//! Address confirmation token and its wire encoding.
//!
//! Layout (all lengths are single bytes):
//!
//! ```text
//! version | len key | key | len street | street | ... | len region | region
//! ```
//!
//! Postal fields follow [`PostalField::ALL`]. Every field is bounded by its
//! ERP column width, which bounds the whole token below one RSA-2048 block.

use thiserror::Error;

use addrconfirm_core::{PARTNER_KEY_MAX_LEN, PartnerKey};
use addrconfirm_partners::{Address, AddressChecksum, AddressHasher, PostalField};

/// Current token layout version.
pub const TOKEN_VERSION: u8 = 1;

/// Largest plaintext RSA-2048 can take with PKCS#1 v1.5 padding.
pub const RSA_2048_PKCS1_PLAINTEXT_LIMIT: usize = 256 - 11;

const fn max_postal_len() -> usize {
    let mut total = 0;
    let mut i = 0;
    while i < PostalField::ALL.len() {
        total += 1 + PostalField::ALL[i].max_len();
        i += 1;
    }
    total
}

/// Upper bound of [`TokenCodec::encode`] output.
pub const MAX_ENCODED_TOKEN_LEN: usize = 1 + (1 + PARTNER_KEY_MAX_LEN) + max_postal_len();

const _: () = assert!(
    MAX_ENCODED_TOKEN_LEN <= RSA_2048_PKCS1_PLAINTEXT_LIMIT,
    "confirmation token no longer fits one RSA-2048 block"
);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("{field} is {len} bytes, limit is {max}")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("malformed confirmation token: {0}")]
    Malformed(String),
}

impl TokenError {
    fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}

/// Binds a partner to the address a confirmation mail was sent for.
///
/// Never persisted; it only lives inside the encrypted confirmation link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressConfirmationToken {
    partner: PartnerKey,
    address: Address,
}

impl AddressConfirmationToken {
    pub fn new(partner: PartnerKey, address: Address) -> Self {
        Self { partner, address }
    }

    /// Token for an address, bound to the partner the address belongs to.
    pub fn for_address(address: Address) -> Self {
        Self {
            partner: address.partner.clone(),
            address,
        }
    }

    pub fn partner(&self) -> &PartnerKey {
        &self.partner
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Fingerprint of the bound address.
    pub fn checksum(&self) -> AddressChecksum {
        AddressHasher::hash(&self.address)
    }

    pub fn into_parts(self) -> (PartnerKey, Address) {
        (self.partner, self.address)
    }
}

/// Deterministic, size-bounded binary codec for [`AddressConfirmationToken`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenCodec;

impl TokenCodec {
    pub fn encode(token: &AddressConfirmationToken) -> Result<Vec<u8>, TokenError> {
        let mut out = Vec::with_capacity(MAX_ENCODED_TOKEN_LEN);
        out.push(TOKEN_VERSION);
        put_field(&mut out, "partner", token.partner.as_str(), PARTNER_KEY_MAX_LEN)?;
        for (field, value) in token.address.postal_fields() {
            put_field(&mut out, field.name(), value, field.max_len())?;
        }
        debug_assert!(out.len() <= MAX_ENCODED_TOKEN_LEN);
        Ok(out)
    }

    pub fn decode(bytes: &[u8]) -> Result<AddressConfirmationToken, TokenError> {
        let mut reader = Reader { bytes, pos: 0 };

        let version = reader.byte()?;
        if version != TOKEN_VERSION {
            return Err(TokenError::malformed(format!("unknown version {version}")));
        }

        let raw_key = reader.field("partner", PARTNER_KEY_MAX_LEN)?;
        let partner = PartnerKey::new(raw_key)
            .map_err(|e| TokenError::malformed(format!("partner: {e}")))?;

        let mut address = Address::empty(partner.clone());
        for field in PostalField::ALL {
            *address.field_mut(field) = reader.field(field.name(), field.max_len())?;
        }

        if reader.pos != bytes.len() {
            return Err(TokenError::malformed(format!(
                "{} unexpected trailing bytes",
                bytes.len() - reader.pos
            )));
        }

        Ok(AddressConfirmationToken { partner, address })
    }
}

fn put_field(
    out: &mut Vec<u8>,
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), TokenError> {
    let len = value.len();
    if len > max {
        return Err(TokenError::FieldTooLong { field, len, max });
    }
    // max is always < 256, so the length fits one byte.
    out.push(len as u8);
    out.extend_from_slice(value.as_bytes());
    Ok(())
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Reader<'_> {
    fn byte(&mut self) -> Result<u8, TokenError> {
        let b = *self
            .bytes
            .get(self.pos)
            .ok_or_else(|| TokenError::malformed("truncated"))?;
        self.pos += 1;
        Ok(b)
    }

    fn field(&mut self, name: &'static str, max: usize) -> Result<String, TokenError> {
        let len = self.byte()? as usize;
        if len > max {
            return Err(TokenError::malformed(format!("{name} length {len} exceeds {max}")));
        }
        let end = self.pos + len;
        let raw = self
            .bytes
            .get(self.pos..end)
            .ok_or_else(|| TokenError::malformed(format!("{name} truncated")))?;
        self.pos = end;
        String::from_utf8(raw.to_vec())
            .map_err(|_| TokenError::malformed(format!("{name} is not UTF-8")))
    }
}
