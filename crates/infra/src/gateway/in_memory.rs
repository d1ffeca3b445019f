use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use addrconfirm_confirmation::{GatewayError, PartnerGateway};
use addrconfirm_core::{DomainResult, PartnerKey};
use addrconfirm_partners::{Address, BusinessPartner, Contact};

/// Number of gateway calls made so far, per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GatewayCalls {
    pub get_root: usize,
    pub get_responsible_contact: usize,
    pub get_address: usize,
    pub save: usize,
}

impl GatewayCalls {
    pub fn total(&self) -> usize {
        self.get_root + self.get_responsible_contact + self.get_address + self.save
    }
}

#[derive(Debug, Default)]
struct Counters {
    get_root: AtomicUsize,
    get_responsible_contact: AtomicUsize,
    get_address: AtomicUsize,
    save: AtomicUsize,
}

/// In-memory ERP for tests/dev.
///
/// `save` only writes back the address checksum and confirmation state, like
/// the ERP does. `take_offline` makes every call fail with
/// [`GatewayError::Unavailable`].
#[derive(Debug, Default)]
pub struct InMemoryPartnerGateway {
    partners: RwLock<HashMap<PartnerKey, BusinessPartner>>,
    addresses: RwLock<HashMap<PartnerKey, Address>>,
    contacts: RwLock<HashMap<PartnerKey, Contact>>,
    offline: RwLock<Option<String>>,
    counters: Counters,
}

impl InMemoryPartnerGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_partner(&self, partner: BusinessPartner) {
        if let Ok(mut map) = self.partners.write() {
            map.insert(partner.key().clone(), partner);
        }
    }

    /// Set the current address of the partner the address refers to.
    ///
    /// Fields wider than the ERP columns are rejected, as the ERP would.
    pub fn set_address(&self, address: Address) -> DomainResult<()> {
        address.validate()?;
        if let Ok(mut map) = self.addresses.write() {
            map.insert(address.partner.clone(), address);
        }
        Ok(())
    }

    pub fn remove_address(&self, partner: &PartnerKey) {
        if let Ok(mut map) = self.addresses.write() {
            map.remove(partner);
        }
    }

    pub fn set_contact(&self, partner: &PartnerKey, contact: Contact) {
        if let Ok(mut map) = self.contacts.write() {
            map.insert(partner.clone(), contact);
        }
    }

    /// Stored partner record, bypassing the call counters.
    pub fn partner(&self, key: &PartnerKey) -> Option<BusinessPartner> {
        self.partners.read().ok()?.get(key).cloned()
    }

    pub fn take_offline(&self, reason: impl Into<String>) {
        if let Ok(mut offline) = self.offline.write() {
            *offline = Some(reason.into());
        }
    }

    pub fn bring_online(&self) {
        if let Ok(mut offline) = self.offline.write() {
            *offline = None;
        }
    }

    pub fn calls(&self) -> GatewayCalls {
        GatewayCalls {
            get_root: self.counters.get_root.load(Ordering::SeqCst),
            get_responsible_contact: self.counters.get_responsible_contact.load(Ordering::SeqCst),
            get_address: self.counters.get_address.load(Ordering::SeqCst),
            save: self.counters.save.load(Ordering::SeqCst),
        }
    }

    fn reachable(&self, counter: &AtomicUsize) -> Result<(), GatewayError> {
        counter.fetch_add(1, Ordering::SeqCst);
        match self.offline.read() {
            Ok(offline) => match offline.as_ref() {
                Some(reason) => Err(GatewayError::unavailable(reason.clone())),
                None => Ok(()),
            },
            Err(_) => Err(poisoned()),
        }
    }
}

fn poisoned() -> GatewayError {
    GatewayError::unavailable("gateway state poisoned")
}

impl PartnerGateway for InMemoryPartnerGateway {
    fn get_root(&self, key: &PartnerKey) -> Result<Option<BusinessPartner>, GatewayError> {
        self.reachable(&self.counters.get_root)?;
        let map = self.partners.read().map_err(|_| poisoned())?;
        Ok(map.get(key).cloned())
    }

    fn get_responsible_contact(
        &self,
        partner: &BusinessPartner,
    ) -> Result<Option<Contact>, GatewayError> {
        self.reachable(&self.counters.get_responsible_contact)?;
        let map = self.contacts.read().map_err(|_| poisoned())?;
        Ok(map.get(partner.key()).cloned())
    }

    fn get_address(&self, partner: &BusinessPartner) -> Result<Option<Address>, GatewayError> {
        self.reachable(&self.counters.get_address)?;
        let map = self.addresses.read().map_err(|_| poisoned())?;
        Ok(map.get(partner.key()).cloned())
    }

    fn save(&self, partner: &BusinessPartner) -> Result<(), GatewayError> {
        self.reachable(&self.counters.save)?;
        let mut map = self.partners.write().map_err(|_| poisoned())?;
        let Some(stored) = map.get_mut(partner.key()) else {
            return Err(GatewayError::rejected(format!(
                "business partner {} does not exist",
                partner.key()
            )));
        };

        *stored = BusinessPartner::restore(
            stored.key().clone(),
            stored.category(),
            stored.is_customer(),
            partner.address_checksum().clone(),
            partner.address_confirmation_state(),
        )
        .map_err(|e| GatewayError::rejected(e.to_string()))?;
        Ok(())
    }
}
