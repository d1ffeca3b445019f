//! Address confirmation lifecycle as data.
//!
//! | old state | address changed | email | action               | on send ok | on send fail |
//! |-----------|-----------------|-------|----------------------|------------|--------------|
//! | any       | yes             | yes   | `Notify`             | OPEN       | INITIAL      |
//! | any       | yes             | no    | `RecordChecksumOnly` | INITIAL    | -            |
//! | INITIAL   | no              | yes   | `Notify`             | OPEN       | INITIAL      |
//! | INITIAL   | no              | no    | `Noop`               | INITIAL    | -            |
//! | OPEN      | no              | *     | `Noop`               | OPEN       | -            |
//! | CONFIRMED | no              | *     | `Noop`               | CONFIRMED  | -            |
//!
//! The machine never produces CONFIRMED on its own; only the user-facing
//! confirmation path does.

use addrconfirm_partners::{AddressChecksum, AddressConfirmationState};

use AddressConfirmationState::{Confirmed, Initial, Open};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Send a confirmation mail.
    Notify,
    /// Remember the new checksum; nobody can be mailed.
    RecordChecksumOnly,
    /// Nothing to do.
    Noop,
}

/// Outcome of [`StateMachine::decide`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub action: Action,
    pub address_changed: bool,
    /// State to persist when the action succeeds (or when there is nothing to send).
    pub next_state: AddressConfirmationState,
    /// State to persist when sending fails; only set for [`Action::Notify`].
    pub next_state_on_failure: Option<AddressConfirmationState>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StateMachine;

impl StateMachine {
    /// An empty stored checksum differs from every real address.
    pub fn address_changed(old: &AddressChecksum, new: &AddressChecksum) -> bool {
        old.is_empty() || old != new
    }

    /// Whether the contact's email can influence the decision.
    ///
    /// For an unchanged address in OPEN or CONFIRMED the answer is NOOP either
    /// way, so the contact need not be fetched.
    pub fn requires_contact(address_changed: bool, old_state: AddressConfirmationState) -> bool {
        address_changed || old_state == Initial
    }

    pub fn decide(
        old_checksum: &AddressChecksum,
        new_checksum: &AddressChecksum,
        old_state: AddressConfirmationState,
        has_email: bool,
    ) -> Decision {
        let changed = Self::address_changed(old_checksum, new_checksum);

        let notify = Decision {
            action: Action::Notify,
            address_changed: changed,
            next_state: Open,
            next_state_on_failure: Some(Initial),
        };
        let settle = |action, next_state| Decision {
            action,
            address_changed: changed,
            next_state,
            next_state_on_failure: None,
        };

        match (changed, old_state, has_email) {
            (true, _, true) => notify,
            (true, _, false) => settle(Action::RecordChecksumOnly, Initial),
            (false, Initial, true) => notify,
            (false, Initial, false) => settle(Action::Noop, Initial),
            (false, Open, _) => settle(Action::Noop, Open),
            (false, Confirmed, _) => settle(Action::Noop, Confirmed),
        }
    }
}
