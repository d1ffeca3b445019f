//! Recording stubs for the confirmation collaborators.

use std::cell::Cell;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use addrconfirm_core::PartnerKey;
use addrconfirm_events::InboundEvent;
use addrconfirm_partners::{Address, BusinessPartner, Contact, PartnerCategory};
use addrconfirm_security::{AddressConfirmationToken, CipherError, ConfirmationCipher};

use crate::gateway::{GatewayError, PartnerGateway};
use crate::notifier::{DeliveryError, Notification, Notifier};
use crate::outcome::{HandleOutcome, OutcomeSink};

pub const OPAQUE: &str = "RSA-2048 encrypted, Base64 encoded and URL encoded string";
pub const TEMPLATE: &str = "https://eventing.example.com/#/confirmAddress/%s";

pub fn key(value: &str) -> PartnerKey {
    PartnerKey::new(value).unwrap()
}

pub fn customer_org(key_value: &str) -> BusinessPartner {
    BusinessPartner::new(key(key_value), PartnerCategory::Organization, true)
}

pub fn address(key_value: &str) -> Address {
    let mut address = Address::empty(key(key_value));
    address.street = "Dietmar-Hopp-Allee".into();
    address.house_number = "16".into();
    address.postal_code = "69190".into();
    address.city = "Walldorf".into();
    address.country = "DE".into();
    address.region = "BW".into();
    address
}

pub fn contact_with_email() -> Contact {
    Contact::new(key("C1"), Some("john.doe@example.com".into()))
}

#[derive(Default)]
pub struct StubGateway {
    pub root: Mutex<Option<BusinessPartner>>,
    pub address: Mutex<Option<Address>>,
    pub contact: Mutex<Option<Contact>>,
    pub saved: Mutex<Vec<BusinessPartner>>,
    pub fail_with: Mutex<Option<GatewayError>>,
    pub fail_saves_with: Mutex<Option<GatewayError>>,
    pub root_calls: AtomicUsize,
    pub address_calls: AtomicUsize,
    pub contact_calls: AtomicUsize,
}

impl StubGateway {
    pub fn with(
        root: BusinessPartner,
        address: Option<Address>,
        contact: Option<Contact>,
    ) -> Self {
        let gateway = Self::default();
        *gateway.root.lock().unwrap() = Some(root);
        *gateway.address.lock().unwrap() = address;
        *gateway.contact.lock().unwrap() = contact;
        gateway
    }

    pub fn fail(&self, err: GatewayError) {
        *self.fail_with.lock().unwrap() = Some(err);
    }

    /// Reads keep working; only `save` fails.
    pub fn fail_saves(&self, err: GatewayError) {
        *self.fail_saves_with.lock().unwrap() = Some(err);
    }

    pub fn last_saved(&self) -> Option<BusinessPartner> {
        self.saved.lock().unwrap().last().cloned()
    }

    pub fn save_count(&self) -> usize {
        self.saved.lock().unwrap().len()
    }

    pub fn total_calls(&self) -> usize {
        self.root_calls.load(Ordering::SeqCst)
            + self.address_calls.load(Ordering::SeqCst)
            + self.contact_calls.load(Ordering::SeqCst)
            + self.save_count()
    }

    fn check(&self) -> Result<(), GatewayError> {
        match self.fail_with.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl PartnerGateway for StubGateway {
    fn get_root(&self, _key: &PartnerKey) -> Result<Option<BusinessPartner>, GatewayError> {
        self.root_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.root.lock().unwrap().clone())
    }

    fn get_responsible_contact(
        &self,
        _partner: &BusinessPartner,
    ) -> Result<Option<Contact>, GatewayError> {
        self.contact_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.contact.lock().unwrap().clone())
    }

    fn get_address(&self, _partner: &BusinessPartner) -> Result<Option<Address>, GatewayError> {
        self.address_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.address.lock().unwrap().clone())
    }

    fn save(&self, partner: &BusinessPartner) -> Result<(), GatewayError> {
        self.check()?;
        if let Some(err) = self.fail_saves_with.lock().unwrap().clone() {
            return Err(err);
        }
        self.saved.lock().unwrap().push(partner.clone());
        *self.root.lock().unwrap() = Some(partner.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct StubNotifier {
    pub sent: Mutex<Vec<Notification>>,
    pub fail_with: Mutex<Option<DeliveryError>>,
}

impl StubNotifier {
    pub fn failing(reason: &str) -> Self {
        let notifier = Self::default();
        *notifier.fail_with.lock().unwrap() = Some(DeliveryError::new(reason));
        notifier
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl Notifier for StubNotifier {
    fn send(&self, notification: &Notification) -> Result<(), DeliveryError> {
        if let Some(err) = self.fail_with.lock().unwrap().clone() {
            return Err(err);
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// Returns [`OPAQUE`] for every token and decrypts from a fixed table.
#[derive(Default)]
pub struct StubCipher {
    pub encrypted: Mutex<Vec<AddressConfirmationToken>>,
    pub decrypt_table: Mutex<HashMap<String, AddressConfirmationToken>>,
    pub fail_with: Mutex<Option<CipherError>>,
}

impl StubCipher {
    pub fn failing(err: CipherError) -> Self {
        let cipher = Self::default();
        *cipher.fail_with.lock().unwrap() = Some(err);
        cipher
    }

    pub fn knows(&self, opaque: &str, token: AddressConfirmationToken) {
        self.decrypt_table
            .lock()
            .unwrap()
            .insert(opaque.to_string(), token);
    }

    pub fn encrypt_count(&self) -> usize {
        self.encrypted.lock().unwrap().len()
    }
}

impl ConfirmationCipher for StubCipher {
    fn encrypt(&self, token: &AddressConfirmationToken) -> Result<String, CipherError> {
        if let Some(err) = self.fail_with.lock().unwrap().clone() {
            return Err(err);
        }
        self.encrypted.lock().unwrap().push(token.clone());
        Ok(OPAQUE.to_string())
    }

    fn decrypt(&self, opaque: &str) -> Result<AddressConfirmationToken, CipherError> {
        if let Some(err) = self.fail_with.lock().unwrap().clone() {
            return Err(err);
        }
        self.decrypt_table
            .lock()
            .unwrap()
            .get(opaque)
            .cloned()
            .ok_or_else(|| CipherError::malformed("unknown token"))
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub records: Mutex<Vec<(Option<PartnerKey>, HandleOutcome)>>,
}

impl OutcomeSink for RecordingSink {
    fn record(&self, partner: Option<&PartnerKey>, outcome: &HandleOutcome) {
        self.records
            .lock()
            .unwrap()
            .push((partner.cloned(), outcome.clone()));
    }
}

/// Event whose accessor calls are counted.
pub struct StubEvent {
    pub partner_event: bool,
    pub partner: Option<PartnerKey>,
    pub discriminator_calls: Cell<usize>,
    pub key_calls: Cell<usize>,
}

impl StubEvent {
    pub fn for_partner(key_value: &str) -> Self {
        Self {
            partner_event: true,
            partner: Some(key(key_value)),
            discriminator_calls: Cell::new(0),
            key_calls: Cell::new(0),
        }
    }

    pub fn unrelated() -> Self {
        Self {
            partner_event: false,
            partner: Some(key("1")),
            discriminator_calls: Cell::new(0),
            key_calls: Cell::new(0),
        }
    }
}

impl InboundEvent for StubEvent {
    fn is_business_partner_event(&self) -> bool {
        self.discriminator_calls.set(self.discriminator_calls.get() + 1);
        self.partner_event
    }

    fn business_partner_key(&self) -> Option<PartnerKey> {
        self.key_calls.set(self.key_calls.get() + 1);
        self.partner.clone()
    }
}
