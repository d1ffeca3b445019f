use serde::{Deserialize, Serialize};

use addrconfirm_core::{DomainError, DomainResult, PartnerKey};

use crate::checksum::AddressChecksum;

/// Business partner category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PartnerCategory {
    Organization,
    Person,
}

/// Address confirmation lifecycle.
///
/// - `Initial`: no confirmation outstanding (never notified, or the last mail failed)
/// - `Open`: a confirmation mail was delivered, awaiting the user
/// - `Confirmed`: the user confirmed the address behind the stored checksum
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AddressConfirmationState {
    #[default]
    Initial,
    Open,
    Confirmed,
}

impl core::fmt::Display for AddressConfirmationState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            AddressConfirmationState::Initial => "INITIAL",
            AddressConfirmationState::Open => "OPEN",
            AddressConfirmationState::Confirmed => "CONFIRMED",
        })
    }
}

/// Root record of a business partner, reduced to what address confirmation
/// reads (key, category, customer flag) and writes (checksum, state).
///
/// Invariant: an empty checksum always comes with `Initial`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessPartner {
    key: PartnerKey,
    category: PartnerCategory,
    is_customer: bool,
    #[serde(default)]
    address_checksum: AddressChecksum,
    #[serde(default)]
    address_confirmation_state: AddressConfirmationState,
}

impl BusinessPartner {
    /// A partner that has never been through address confirmation.
    pub fn new(key: PartnerKey, category: PartnerCategory, is_customer: bool) -> Self {
        Self {
            key,
            category,
            is_customer,
            address_checksum: AddressChecksum::empty(),
            address_confirmation_state: AddressConfirmationState::Initial,
        }
    }

    /// Rehydrate a partner with confirmation fields as stored in the ERP.
    pub fn restore(
        key: PartnerKey,
        category: PartnerCategory,
        is_customer: bool,
        address_checksum: AddressChecksum,
        address_confirmation_state: AddressConfirmationState,
    ) -> DomainResult<Self> {
        let mut partner = Self::new(key, category, is_customer);
        partner.address_checksum = address_checksum;
        partner.set_address_confirmation_state(address_confirmation_state)?;
        Ok(partner)
    }

    pub fn key(&self) -> &PartnerKey {
        &self.key
    }

    pub fn category(&self) -> PartnerCategory {
        self.category
    }

    pub fn is_customer(&self) -> bool {
        self.is_customer
    }

    pub fn address_checksum(&self) -> &AddressChecksum {
        &self.address_checksum
    }

    pub fn address_confirmation_state(&self) -> AddressConfirmationState {
        self.address_confirmation_state
    }

    /// Record the fingerprint of the current address.
    ///
    /// Recording the empty sentinel also resets the state to `Initial`.
    pub fn record_address_checksum(&mut self, checksum: AddressChecksum) {
        if checksum.is_empty() {
            self.address_confirmation_state = AddressConfirmationState::Initial;
        }
        self.address_checksum = checksum;
    }

    /// Forget the address fingerprint (partner has no address).
    pub fn clear_address(&mut self) {
        self.record_address_checksum(AddressChecksum::empty());
    }

    /// Move to a new confirmation state.
    ///
    /// `Open` and `Confirmed` require a recorded checksum.
    pub fn set_address_confirmation_state(
        &mut self,
        state: AddressConfirmationState,
    ) -> DomainResult<()> {
        if state != AddressConfirmationState::Initial && self.address_checksum.is_empty() {
            return Err(DomainError::invariant(format!(
                "partner {} cannot be {state} without an address checksum",
                self.key
            )));
        }
        self.address_confirmation_state = state;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> PartnerKey {
        PartnerKey::new("17100001").unwrap()
    }

    fn checksum() -> AddressChecksum {
        AddressChecksum::from_stored("abc123")
    }

    #[test]
    fn new_partner_starts_initial_without_checksum() {
        let partner = BusinessPartner::new(key(), PartnerCategory::Organization, true);
        assert!(partner.address_checksum().is_empty());
        assert_eq!(partner.address_confirmation_state(), AddressConfirmationState::Initial);
        assert_eq!(partner.key(), &key());
    }

    #[test]
    fn open_requires_checksum() {
        let mut partner = BusinessPartner::new(key(), PartnerCategory::Organization, true);
        let err = partner
            .set_address_confirmation_state(AddressConfirmationState::Open)
            .unwrap_err();
        match err {
            DomainError::InvariantViolation(msg) => assert!(msg.contains("OPEN")),
            other => panic!("Expected InvariantViolation, got {other:?}"),
        }

        partner.record_address_checksum(checksum());
        partner
            .set_address_confirmation_state(AddressConfirmationState::Open)
            .unwrap();
        assert_eq!(partner.address_confirmation_state(), AddressConfirmationState::Open);
    }

    #[test]
    fn clearing_address_resets_state() {
        let mut partner = BusinessPartner::restore(
            key(),
            PartnerCategory::Organization,
            true,
            checksum(),
            AddressConfirmationState::Confirmed,
        )
        .unwrap();

        partner.clear_address();

        assert!(partner.address_checksum().is_empty());
        assert_eq!(partner.address_confirmation_state(), AddressConfirmationState::Initial);
    }

    #[test]
    fn restore_rejects_inconsistent_records() {
        let result = BusinessPartner::restore(
            key(),
            PartnerCategory::Organization,
            true,
            AddressChecksum::empty(),
            AddressConfirmationState::Confirmed,
        );
        assert!(result.is_err());
    }

    #[test]
    fn state_serializes_uppercase() {
        let json = serde_json::to_string(&AddressConfirmationState::Confirmed).unwrap();
        assert_eq!(json, "\"CONFIRMED\"");
        let category: PartnerCategory = serde_json::from_str("\"PERSON\"").unwrap();
        assert_eq!(category, PartnerCategory::Person);
    }
}
