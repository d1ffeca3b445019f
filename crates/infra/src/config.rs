//! Configuration loading and representation.

use thiserror::Error;

use addrconfirm_confirmation::LinkBuilder;
use addrconfirm_security::{CipherAlgorithm, KeySource};

pub const URL_TEMPLATE_VAR: &str = "ADDRESS_CONFIRMATION_URL_TEMPLATE";
pub const CIPHER_ALGORITHM_VAR: &str = "CIPHER_ALGORITHM";
pub const KEY_SOURCE_VAR: &str = "KEY_SOURCE";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(var: &'static str, reason: impl ToString) -> Self {
        Self::Invalid {
            var,
            reason: reason.to_string(),
        }
    }
}

/// Process settings, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub links: LinkBuilder,
    pub cipher_algorithm: CipherAlgorithm,
    pub key_source: KeySource,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`Settings::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |var: &'static str| lookup(var).filter(|v| !v.trim().is_empty());

        let template = read(URL_TEMPLATE_VAR).ok_or(ConfigError::Missing(URL_TEMPLATE_VAR))?;
        let links = LinkBuilder::new(template.trim())
            .map_err(|e| ConfigError::invalid(URL_TEMPLATE_VAR, e))?;

        let cipher_algorithm = match read(CIPHER_ALGORITHM_VAR) {
            Some(raw) => raw
                .parse()
                .map_err(|e| ConfigError::invalid(CIPHER_ALGORITHM_VAR, e))?,
            None => CipherAlgorithm::default(),
        };

        let key_source = read(KEY_SOURCE_VAR)
            .ok_or(ConfigError::Missing(KEY_SOURCE_VAR))?
            .parse()
            .map_err(|e| ConfigError::invalid(KEY_SOURCE_VAR, e))?;

        Ok(Self {
            links,
            cipher_algorithm,
            key_source,
        })
    }
}
