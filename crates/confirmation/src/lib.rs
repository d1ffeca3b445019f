//! Address confirmation core.
//!
//! Reacts to business partner events: detects address changes through the
//! stored checksum, drives the INITIAL → OPEN → CONFIRMED lifecycle and sends
//! the responsible contact an encrypted confirmation link. Collaborators (ERP,
//! mail transport, cipher, outcome sink) are injected as trait objects.

pub mod confirm;
pub mod gateway;
pub mod handler;
pub mod link;
pub mod notifier;
pub mod outcome;
pub mod state_machine;

#[cfg(test)]
mod test_support;

pub use confirm::{AddressConfirmationService, ConfirmationError, ConfirmationOutcome};
pub use gateway::{GatewayError, PartnerGateway};
pub use handler::{EventHandler, HandleError};
pub use link::{LinkBuilder, LinkError, TOKEN_PLACEHOLDER};
pub use notifier::{DeliveryError, Notification, Notifier};
pub use outcome::{HandleOutcome, IgnoreReason, OutcomeSink, TracingOutcomeSink};
pub use state_machine::{Action, Decision, StateMachine};
