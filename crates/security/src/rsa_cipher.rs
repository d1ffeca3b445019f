//! RSA implementation of [`ConfirmationCipher`].

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use tracing::debug;

use crate::cipher::{CipherAlgorithm, CipherError, ConfirmationCipher};
use crate::key_source::KeySource;
use crate::token::{AddressConfirmationToken, MAX_ENCODED_TOKEN_LEN, TokenCodec};

/// RSA/PKCS#1 v1.5 cipher over a single key pair.
///
/// The key pair is read-only after construction, so one instance can be shared
/// by all handler threads.
pub struct RsaConfirmationCipher {
    algorithm: CipherAlgorithm,
    private_key: RsaPrivateKey,
    public_key: RsaPublicKey,
}

impl core::fmt::Debug for RsaConfirmationCipher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RsaConfirmationCipher")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl RsaConfirmationCipher {
    /// Wrap an existing private key.
    ///
    /// Fails with [`CipherError::Unavailable`] when the key size does not match
    /// the algorithm or a maximal token would not fit one block.
    pub fn new(
        algorithm: CipherAlgorithm,
        private_key: RsaPrivateKey,
    ) -> Result<Self, CipherError> {
        let bits = private_key.size() * 8;
        if bits != algorithm.key_bits() {
            return Err(CipherError::unavailable(format!(
                "{algorithm} needs a {}-bit key, got {bits} bits",
                algorithm.key_bits()
            )));
        }
        if algorithm.plaintext_limit() < MAX_ENCODED_TOKEN_LEN {
            return Err(CipherError::unavailable(format!(
                "{algorithm} carries {} bytes per block, tokens need up to {MAX_ENCODED_TOKEN_LEN}",
                algorithm.plaintext_limit()
            )));
        }

        let public_key = RsaPublicKey::from(&private_key);
        Ok(Self {
            algorithm,
            private_key,
            public_key,
        })
    }

    /// Parse a PEM private key (PKCS#8 `PRIVATE KEY` or PKCS#1 `RSA PRIVATE KEY`).
    pub fn from_pem(algorithm: CipherAlgorithm, pem: &str) -> Result<Self, CipherError> {
        let key = RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .map_err(|e| CipherError::unavailable(format!("cannot parse private key: {e}")))?;
        Self::new(algorithm, key)
    }

    /// Load the key from its configured source.
    pub fn load(algorithm: CipherAlgorithm, source: &KeySource) -> Result<Self, CipherError> {
        let pem = source.read_pem()?;
        let cipher = Self::from_pem(algorithm, &pem)?;
        debug!(key_source = %source, algorithm = %algorithm, "confirmation cipher loaded");
        Ok(cipher)
    }

    /// Generate a fresh key pair (dev/test setups without key material).
    pub fn generate(algorithm: CipherAlgorithm) -> Result<Self, CipherError> {
        let mut rng = rand::thread_rng();
        let key = RsaPrivateKey::new(&mut rng, algorithm.key_bits())
            .map_err(|e| CipherError::failed(format!("key generation failed: {e}")))?;
        Self::new(algorithm, key)
    }

    pub fn algorithm(&self) -> CipherAlgorithm {
        self.algorithm
    }

    /// Length of every opaque string this cipher produces.
    pub fn opaque_len(&self) -> usize {
        let n = self.public_key.size();
        n / 3 * 4 + [0, 2, 3][n % 3]
    }

    /// Encrypt raw bytes into base64url (no padding).
    pub fn encrypt_bytes(&self, plaintext: &[u8]) -> Result<String, CipherError> {
        let mut rng = rand::thread_rng();
        let ciphertext = self
            .public_key
            .encrypt(&mut rng, Pkcs1v15Encrypt, plaintext)
            .map_err(|e| CipherError::failed(e.to_string()))?;
        Ok(URL_SAFE_NO_PAD.encode(ciphertext))
    }

    /// Reverse of [`Self::encrypt_bytes`].
    ///
    /// Bad encoding and failed decryption both mean the input is not ours.
    pub fn decrypt_bytes(&self, opaque: &str) -> Result<Vec<u8>, CipherError> {
        let ciphertext = URL_SAFE_NO_PAD
            .decode(opaque.trim())
            .map_err(|e| CipherError::malformed(format!("not base64url: {e}")))?;
        if ciphertext.len() != self.private_key.size() {
            return Err(CipherError::malformed(format!(
                "ciphertext is {} bytes, expected {}",
                ciphertext.len(),
                self.private_key.size()
            )));
        }
        self.private_key
            .decrypt(Pkcs1v15Encrypt, &ciphertext)
            .map_err(|_| CipherError::malformed("decryption failed"))
    }
}

impl ConfirmationCipher for RsaConfirmationCipher {
    fn encrypt(&self, token: &AddressConfirmationToken) -> Result<String, CipherError> {
        let plaintext = TokenCodec::encode(token)?;
        self.encrypt_bytes(&plaintext)
    }

    fn decrypt(&self, opaque: &str) -> Result<AddressConfirmationToken, CipherError> {
        let plaintext = self.decrypt_bytes(opaque)?;
        Ok(TokenCodec::decode(&plaintext)?)
    }
}
