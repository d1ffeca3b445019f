//! Business partner event handler.
//!
//! One event at a time per handler; callers serialize events per partner key.
//! The handler keeps no state between events, everything it knows comes from
//! the gateway.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info_span};

use addrconfirm_core::{DomainError, PartnerKey};
use addrconfirm_events::InboundEvent;
use addrconfirm_partners::{
    Address, AddressConfirmationState, AddressHasher, BusinessPartner, PartnerCategory,
};
use addrconfirm_security::{AddressConfirmationToken, CipherError, ConfirmationCipher};

use crate::gateway::{GatewayError, PartnerGateway};
use crate::link::LinkBuilder;
use crate::notifier::{Notification, Notifier};
use crate::outcome::{HandleOutcome, IgnoreReason, OutcomeSink};
use crate::state_machine::{Action, Decision, StateMachine};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandleError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Reacts to business partner events and drives address confirmation.
///
/// Failure semantics:
/// - gateway errors abort the event before anything is saved; redelivery retries it
/// - a token/cipher failure still stores the new checksum, with state `INITIAL`
/// - a failed mail stores the new checksum and rolls the state back to `INITIAL`,
///   whatever it was before, so the next event sends the mail again
///
/// The stored state is `OPEN` only after the notifier accepted a mail carrying a
/// link for the stored checksum.
pub struct EventHandler {
    gateway: Arc<dyn PartnerGateway>,
    notifier: Arc<dyn Notifier>,
    cipher: Arc<dyn ConfirmationCipher>,
    links: LinkBuilder,
    sink: Arc<dyn OutcomeSink>,
}

impl EventHandler {
    pub fn new(
        gateway: Arc<dyn PartnerGateway>,
        notifier: Arc<dyn Notifier>,
        cipher: Arc<dyn ConfirmationCipher>,
        links: LinkBuilder,
        sink: Arc<dyn OutcomeSink>,
    ) -> Self {
        Self {
            gateway,
            notifier,
            cipher,
            links,
            sink,
        }
    }

    /// Handle one event. Never fails; every outcome goes to the sink.
    pub fn handle<E: InboundEvent + ?Sized>(&self, event: &E) -> HandleOutcome {
        if !event.is_business_partner_event() {
            return self.finish(
                None,
                HandleOutcome::Ignored(IgnoreReason::NotBusinessPartnerEvent),
            );
        }
        let Some(key) = event.business_partner_key() else {
            return self.finish(None, HandleOutcome::Ignored(IgnoreReason::MissingPartnerKey));
        };

        let span = info_span!("address_confirmation", partner = %key);
        let _guard = span.enter();

        let outcome = self.process(&key).unwrap_or_else(HandleOutcome::Aborted);
        self.finish(Some(&key), outcome)
    }

    fn finish(&self, partner: Option<&PartnerKey>, outcome: HandleOutcome) -> HandleOutcome {
        self.sink.record(partner, &outcome);
        outcome
    }

    fn process(&self, key: &PartnerKey) -> Result<HandleOutcome, HandleError> {
        let Some(mut partner) = self.gateway.get_root(key)? else {
            return Ok(HandleOutcome::Ignored(IgnoreReason::PartnerNotFound));
        };
        if !partner.is_customer() {
            return Ok(HandleOutcome::Ignored(IgnoreReason::NotCustomer));
        }
        if partner.category() == PartnerCategory::Person {
            return Ok(HandleOutcome::Ignored(IgnoreReason::PersonPartner));
        }

        let Some(address) = self.gateway.get_address(&partner)? else {
            partner.clear_address();
            self.gateway.save(&partner)?;
            return Ok(HandleOutcome::AddressCleared);
        };

        let new_checksum = AddressHasher::hash(&address);
        let old_checksum = partner.address_checksum().clone();
        let old_state = partner.address_confirmation_state();
        let changed = StateMachine::address_changed(&old_checksum, &new_checksum);

        let email_address = if StateMachine::requires_contact(changed, old_state) {
            self.gateway
                .get_responsible_contact(&partner)?
                .and_then(|contact| contact.email_address().map(str::to_owned))
        } else {
            None
        };

        let decision =
            StateMachine::decide(&old_checksum, &new_checksum, old_state, email_address.is_some());
        debug!(
            changed,
            %old_state,
            action = ?decision.action,
            "address confirmation decision"
        );

        partner.record_address_checksum(new_checksum);

        let outcome = match (decision.action, email_address) {
            (Action::Notify, Some(email_address)) => {
                self.notify(&mut partner, &decision, address, email_address)?
            }
            (Action::RecordChecksumOnly, _) | (Action::Notify, None) => {
                partner.set_address_confirmation_state(AddressConfirmationState::Initial)?;
                HandleOutcome::ChecksumRecorded
            }
            (Action::Noop, _) => {
                partner.set_address_confirmation_state(decision.next_state)?;
                HandleOutcome::Unchanged(decision.next_state)
            }
        };

        self.gateway.save(&partner)?;
        Ok(outcome)
    }

    fn notify(
        &self,
        partner: &mut BusinessPartner,
        decision: &Decision,
        address: Address,
        email_address: String,
    ) -> Result<HandleOutcome, HandleError> {
        let on_failure = decision
            .next_state_on_failure
            .unwrap_or(AddressConfirmationState::Initial);

        let confirmation_link = match self.confirmation_link(partner.key(), &address) {
            Ok(link) => link,
            Err(err) => {
                partner.set_address_confirmation_state(on_failure)?;
                return Ok(HandleOutcome::NotificationAborted(err));
            }
        };

        // Tentative; reverted below if the mail does not go out.
        partner.set_address_confirmation_state(decision.next_state)?;
        let notification = Notification {
            partner: partner.clone(),
            email_address,
            address,
            confirmation_link,
        };

        match self.notifier.send(&notification) {
            Ok(()) => Ok(HandleOutcome::Notified),
            Err(err) => {
                partner.set_address_confirmation_state(on_failure)?;
                Ok(HandleOutcome::DeliveryFailed(err))
            }
        }
    }

    fn confirmation_link(
        &self,
        key: &PartnerKey,
        address: &Address,
    ) -> Result<String, HandleError> {
        let token = AddressConfirmationToken::new(key.clone(), address.clone());
        let opaque = self.cipher.encrypt(&token)?;
        Ok(self.links.build(&opaque))
    }
}
