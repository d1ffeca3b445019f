//! `addrconfirm-security` — confirmation token and its encryption.
//!
//! A confirmation link carries the partner key and the address the mail was
//! sent for, encrypted with the service's RSA key so that only this service
//! can read it back. Nothing here talks to the ERP or the mail transport.

pub mod cipher;
pub mod key_source;
pub mod rsa_cipher;
pub mod token;

pub use cipher::{CipherAlgorithm, CipherError, ConfirmationCipher};
pub use key_source::KeySource;
pub use rsa_cipher::RsaConfirmationCipher;
pub use token::{
    AddressConfirmationToken, MAX_ENCODED_TOKEN_LEN, TOKEN_VERSION, TokenCodec, TokenError,
};
