use std::sync::Arc;

use thiserror::Error;

use addrconfirm_core::PartnerKey;
use addrconfirm_partners::{Address, BusinessPartner, Contact};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The ERP could not be reached (network, timeout, 5xx).
    #[error("ERP gateway unavailable: {0}")]
    Unavailable(String),

    /// The ERP answered but refused the request.
    #[error("ERP rejected request: {0}")]
    Rejected(String),
}

impl GatewayError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }
}

/// Access to business partner records in the ERP.
///
/// Any error aborts the current event without writing anything; the broker's
/// redelivery retries it.
pub trait PartnerGateway: Send + Sync {
    /// Root record of a partner, `None` if the ERP does not know the key.
    fn get_root(&self, key: &PartnerKey) -> Result<Option<BusinessPartner>, GatewayError>;

    /// The partner's responsible contact, selected by ERP policy.
    fn get_responsible_contact(
        &self,
        partner: &BusinessPartner,
    ) -> Result<Option<Contact>, GatewayError>;

    /// The partner's current postal address.
    fn get_address(&self, partner: &BusinessPartner) -> Result<Option<Address>, GatewayError>;

    /// Persist the address checksum and confirmation state (nothing else).
    fn save(&self, partner: &BusinessPartner) -> Result<(), GatewayError>;
}

impl<G> PartnerGateway for Arc<G>
where
    G: PartnerGateway + ?Sized,
{
    fn get_root(&self, key: &PartnerKey) -> Result<Option<BusinessPartner>, GatewayError> {
        (**self).get_root(key)
    }

    fn get_responsible_contact(
        &self,
        partner: &BusinessPartner,
    ) -> Result<Option<Contact>, GatewayError> {
        (**self).get_responsible_contact(partner)
    }

    fn get_address(&self, partner: &BusinessPartner) -> Result<Option<Address>, GatewayError> {
        (**self).get_address(partner)
    }

    fn save(&self, partner: &BusinessPartner) -> Result<(), GatewayError> {
        (**self).save(partner)
    }
}
