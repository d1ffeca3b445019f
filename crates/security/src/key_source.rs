use std::path::PathBuf;
use std::str::FromStr;

use crate::cipher::CipherError;

/// Where the RSA private key (PEM) comes from (`KEY_SOURCE`).
///
/// - `file:<path>`: a PEM file on the local file system
/// - `env:<VAR>`: a cloud key store binding the platform injects as an
///   environment variable holding the PEM
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    LocalFile(PathBuf),
    CloudKeyStore { binding: String },
}

impl KeySource {
    /// Read the PEM-encoded private key.
    pub fn read_pem(&self) -> Result<String, CipherError> {
        let pem = match self {
            KeySource::LocalFile(path) => std::fs::read_to_string(path).map_err(|e| {
                CipherError::unavailable(format!("cannot read key file {}: {e}", path.display()))
            })?,
            KeySource::CloudKeyStore { binding } => std::env::var(binding).map_err(|_| {
                CipherError::unavailable(format!("key store binding {binding} is not set"))
            })?,
        };

        if pem.trim().is_empty() {
            return Err(CipherError::unavailable(format!("{self} holds no key material")));
        }
        Ok(pem)
    }
}

impl FromStr for KeySource {
    type Err = CipherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(path) = s.strip_prefix("file:").filter(|p| !p.is_empty()) {
            return Ok(KeySource::LocalFile(PathBuf::from(path)));
        }
        if let Some(binding) = s.strip_prefix("env:").filter(|b| !b.is_empty()) {
            return Ok(KeySource::CloudKeyStore {
                binding: binding.to_string(),
            });
        }
        Err(CipherError::unavailable(format!(
            "invalid key source '{s}' (expected file:<path> or env:<VAR>)"
        )))
    }
}

impl core::fmt::Display for KeySource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            KeySource::LocalFile(path) => write!(f, "file:{}", path.display()),
            KeySource::CloudKeyStore { binding } => write!(f, "env:{binding}"),
        }
    }
}
