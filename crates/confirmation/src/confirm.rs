//! User-facing side of address confirmation: the contact follows the link and
//! the opaque token comes back here.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, info_span, warn};

use addrconfirm_core::{DomainError, PartnerKey};
use addrconfirm_partners::{AddressConfirmationState, AddressHasher};
use addrconfirm_security::{CipherError, ConfirmationCipher};

use crate::gateway::{GatewayError, PartnerGateway};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    /// OPEN → CONFIRMED.
    Confirmed,
    /// The link was used before; nothing changed.
    AlreadyConfirmed,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfirmationError {
    #[error("confirmation token rejected: {0}")]
    MalformedToken(String),

    #[error("business partner {0} not found")]
    PartnerNotFound(PartnerKey),

    /// The address changed since the mail went out, or no mail is outstanding.
    #[error("confirmation link for business partner {0} is no longer valid")]
    StaleToken(PartnerKey),

    #[error(transparent)]
    Cipher(CipherError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl From<CipherError> for ConfirmationError {
    fn from(err: CipherError) -> Self {
        if err.is_malformed_token() {
            Self::MalformedToken(err.to_string())
        } else {
            Self::Cipher(err)
        }
    }
}

/// Confirms an address from an opaque confirmation token.
pub struct AddressConfirmationService {
    gateway: Arc<dyn PartnerGateway>,
    cipher: Arc<dyn ConfirmationCipher>,
}

impl AddressConfirmationService {
    pub fn new(gateway: Arc<dyn PartnerGateway>, cipher: Arc<dyn ConfirmationCipher>) -> Self {
        Self { gateway, cipher }
    }

    /// Only the address the mail was sent for can be confirmed: the token's
    /// address, the stored checksum and the partner's current address must
    /// all agree.
    pub fn confirm(&self, opaque_token: &str) -> Result<ConfirmationOutcome, ConfirmationError> {
        let token = self.cipher.decrypt(opaque_token)?;
        let key = token.partner().clone();

        let span = info_span!("address_confirmation", partner = %key);
        let _guard = span.enter();

        let Some(mut partner) = self.gateway.get_root(&key)? else {
            return Err(ConfirmationError::PartnerNotFound(key));
        };
        let current = self.gateway.get_address(&partner)?;

        let confirmed_checksum = token.checksum();
        let current_checksum = AddressHasher::hash_optional(current.as_ref());
        if current_checksum.is_empty()
            || &confirmed_checksum != partner.address_checksum()
            || confirmed_checksum != current_checksum
        {
            warn!("confirmation token does not match the current address");
            return Err(ConfirmationError::StaleToken(key));
        }

        match partner.address_confirmation_state() {
            AddressConfirmationState::Confirmed => Ok(ConfirmationOutcome::AlreadyConfirmed),
            AddressConfirmationState::Initial => {
                warn!("no confirmation mail outstanding");
                Err(ConfirmationError::StaleToken(key))
            }
            AddressConfirmationState::Open => {
                partner.set_address_confirmation_state(AddressConfirmationState::Confirmed)?;
                self.gateway.save(&partner)?;
                info!("address confirmed");
                Ok(ConfirmationOutcome::Confirmed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use addrconfirm_partners::{AddressChecksum, BusinessPartner, PartnerCategory};
    use addrconfirm_security::AddressConfirmationToken;

    use super::*;
    use crate::test_support::*;

    const LINK_TOKEN: &str = "opaque-token";

    fn partner(checksum: AddressChecksum, state: AddressConfirmationState) -> BusinessPartner {
        BusinessPartner::restore(key("1"), PartnerCategory::Organization, true, checksum, state)
            .unwrap()
    }

    fn service(gateway: StubGateway) -> (Arc<StubGateway>, AddressConfirmationService) {
        let gateway = Arc::new(gateway);
        let cipher = StubCipher::default();
        cipher.knows(
            LINK_TOKEN,
            AddressConfirmationToken::new(key("1"), address("1")),
        );
        let service = AddressConfirmationService::new(gateway.clone(), Arc::new(cipher));
        (gateway, service)
    }

    fn current() -> AddressChecksum {
        AddressHasher::hash(&address("1"))
    }

    #[test]
    fn open_partner_is_confirmed() {
        let (gateway, service) = service(StubGateway::with(
            partner(current(), AddressConfirmationState::Open),
            Some(address("1")),
            None,
        ));

        assert_eq!(service.confirm(LINK_TOKEN), Ok(ConfirmationOutcome::Confirmed));
        let saved = gateway.last_saved().unwrap();
        assert_eq!(
            saved.address_confirmation_state(),
            AddressConfirmationState::Confirmed
        );
        assert_eq!(saved.address_checksum(), &current());
    }

    #[test]
    fn second_confirmation_changes_nothing() {
        let (gateway, service) = service(StubGateway::with(
            partner(current(), AddressConfirmationState::Open),
            Some(address("1")),
            None,
        ));

        service.confirm(LINK_TOKEN).unwrap();
        assert_eq!(
            service.confirm(LINK_TOKEN),
            Ok(ConfirmationOutcome::AlreadyConfirmed)
        );
        assert_eq!(gateway.save_count(), 1);
    }

    #[test]
    fn tampered_token_is_malformed() {
        let (gateway, service) = service(StubGateway::with(
            partner(current(), AddressConfirmationState::Open),
            Some(address("1")),
            None,
        ));

        assert!(matches!(
            service.confirm("not-a-token"),
            Err(ConfirmationError::MalformedToken(_))
        ));
        assert_eq!(gateway.root_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[test]
    fn moved_address_makes_token_stale() {
        let mut moved = address("1");
        moved.street = "Altrottstrasse".into();
        let (gateway, service) = service(StubGateway::with(
            partner(AddressHasher::hash(&moved), AddressConfirmationState::Open),
            Some(moved),
            None,
        ));

        assert_eq!(
            service.confirm(LINK_TOKEN),
            Err(ConfirmationError::StaleToken(key("1")))
        );
        assert_eq!(gateway.save_count(), 0);
    }

    #[test]
    fn stored_checksum_must_match_token() {
        let (_, service) = service(StubGateway::with(
            partner(
                AddressChecksum::from_stored("older"),
                AddressConfirmationState::Open,
            ),
            Some(address("1")),
            None,
        ));

        assert_eq!(
            service.confirm(LINK_TOKEN),
            Err(ConfirmationError::StaleToken(key("1")))
        );
    }

    #[test]
    fn removed_address_makes_token_stale() {
        let (_, service) = service(StubGateway::with(
            partner(current(), AddressConfirmationState::Open),
            None,
            None,
        ));

        assert!(matches!(
            service.confirm(LINK_TOKEN),
            Err(ConfirmationError::StaleToken(_))
        ));
    }

    #[test]
    fn initial_partner_has_nothing_to_confirm() {
        let (gateway, service) = service(StubGateway::with(
            partner(current(), AddressConfirmationState::Initial),
            Some(address("1")),
            None,
        ));

        assert_eq!(
            service.confirm(LINK_TOKEN),
            Err(ConfirmationError::StaleToken(key("1")))
        );
        assert_eq!(gateway.save_count(), 0);
    }

    #[test]
    fn unknown_partner() {
        let (_, service) = service(StubGateway::default());

        assert_eq!(
            service.confirm(LINK_TOKEN),
            Err(ConfirmationError::PartnerNotFound(key("1")))
        );
    }

    #[test]
    fn cipher_outage_is_not_reported_as_tampering() {
        let service = AddressConfirmationService::new(
            Arc::new(StubGateway::default()),
            Arc::new(StubCipher::failing(CipherError::unavailable("key store down"))),
        );

        assert_eq!(
            service.confirm(LINK_TOKEN),
            Err(ConfirmationError::Cipher(CipherError::unavailable(
                "key store down"
            )))
        );
    }

    #[test]
    fn gateway_errors_propagate() {
        let (gateway, service) = service(StubGateway::with(
            partner(current(), AddressConfirmationState::Open),
            Some(address("1")),
            None,
        ));
        gateway.fail(GatewayError::rejected("403"));

        assert_eq!(
            service.confirm(LINK_TOKEN),
            Err(ConfirmationError::Gateway(GatewayError::rejected("403")))
        );
    }
}
