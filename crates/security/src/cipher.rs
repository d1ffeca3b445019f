use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

use crate::token::{AddressConfirmationToken, TokenError};

/// Cipher failures.
///
/// `Unavailable` and `Failed` are not retryable for the event at hand; the
/// event handler aborts the notification and leaves redelivery to the broker.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CipherError {
    /// Key material missing or unusable.
    #[error("cipher unavailable: {0}")]
    Unavailable(String),

    /// The cryptographic operation itself failed.
    #[error("cipher operation failed: {0}")]
    Failed(String),

    /// The token could not be encoded, or a decrypted payload is not a token.
    #[error(transparent)]
    Token(#[from] TokenError),
}

impl CipherError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Token(TokenError::Malformed(msg.into()))
    }

    /// Whether the error means "this opaque string is not one of our tokens".
    pub fn is_malformed_token(&self) -> bool {
        matches!(self, CipherError::Token(TokenError::Malformed(_)))
    }
}

/// Supported cipher configuration (`CIPHER_ALGORITHM`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CipherAlgorithm {
    /// RSA with a 2048-bit modulus and PKCS#1 v1.5 padding.
    #[default]
    Rsa2048,
}

impl CipherAlgorithm {
    pub fn key_bits(self) -> usize {
        match self {
            CipherAlgorithm::Rsa2048 => 2048,
        }
    }

    /// Bytes of plaintext a single block can carry.
    pub fn plaintext_limit(self) -> usize {
        self.key_bits() / 8 - 11
    }
}

impl FromStr for CipherAlgorithm {
    type Err = CipherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RSA/2048" | "RSA-2048" | "RSA2048" => Ok(CipherAlgorithm::Rsa2048),
            other => Err(CipherError::unavailable(format!(
                "unsupported cipher algorithm '{other}' (only RSA/2048)"
            ))),
        }
    }
}

impl core::fmt::Display for CipherAlgorithm {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CipherAlgorithm::Rsa2048 => f.write_str("RSA/2048"),
        }
    }
}

/// Turns a confirmation token into the opaque, URL-safe string embedded in the
/// confirmation link, and back.
pub trait ConfirmationCipher: Send + Sync {
    /// Encrypt a token. The result is base64url without padding.
    fn encrypt(&self, token: &AddressConfirmationToken) -> Result<String, CipherError>;

    /// Recover a token from its opaque form.
    ///
    /// Anything that is not a token this cipher produced fails with
    /// [`CipherError::Token`] / [`TokenError::Malformed`].
    fn decrypt(&self, opaque: &str) -> Result<AddressConfirmationToken, CipherError>;
}

impl<C> ConfirmationCipher for Arc<C>
where
    C: ConfirmationCipher + ?Sized,
{
    fn encrypt(&self, token: &AddressConfirmationToken) -> Result<String, CipherError> {
        (**self).encrypt(token)
    }

    fn decrypt(&self, opaque: &str) -> Result<AddressConfirmationToken, CipherError> {
        (**self).decrypt(opaque)
    }
}
