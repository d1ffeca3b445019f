//! What happened to an event, for logs and metrics.

use tracing::{error, info, warn};

use addrconfirm_core::PartnerKey;
use addrconfirm_partners::AddressConfirmationState;

use crate::handler::HandleError;
use crate::notifier::DeliveryError;

/// Why an event was skipped without touching the partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NotBusinessPartnerEvent,
    MissingPartnerKey,
    PartnerNotFound,
    NotCustomer,
    PersonPartner,
}

impl IgnoreReason {
    pub fn as_str(self) -> &'static str {
        match self {
            IgnoreReason::NotBusinessPartnerEvent => "not_business_partner_event",
            IgnoreReason::MissingPartnerKey => "missing_partner_key",
            IgnoreReason::PartnerNotFound => "partner_not_found",
            IgnoreReason::NotCustomer => "not_customer",
            IgnoreReason::PersonPartner => "person_partner",
        }
    }
}

/// Result of handling one event. Handling itself never fails; errors are
/// folded in here so the broker can always acknowledge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleOutcome {
    Ignored(IgnoreReason),
    /// Partner has no address; checksum cleared, state INITIAL.
    AddressCleared,
    /// Nothing to send; state kept.
    Unchanged(AddressConfirmationState),
    /// Address changed but no email to send to; new checksum stored, state INITIAL.
    ChecksumRecorded,
    /// Mail delivered; state OPEN.
    Notified,
    /// Mail not delivered; state rolled back to INITIAL.
    DeliveryFailed(DeliveryError),
    /// The confirmation link could not be built; checksum stored, state INITIAL.
    NotificationAborted(HandleError),
    /// Nothing was written.
    Aborted(HandleError),
}

impl HandleOutcome {
    /// Stable label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            HandleOutcome::Ignored(reason) => reason.as_str(),
            HandleOutcome::AddressCleared => "address_cleared",
            HandleOutcome::Unchanged(_) => "unchanged",
            HandleOutcome::ChecksumRecorded => "checksum_recorded",
            HandleOutcome::Notified => "notified",
            HandleOutcome::DeliveryFailed(_) => "delivery_failed",
            HandleOutcome::NotificationAborted(_) => "notification_aborted",
            HandleOutcome::Aborted(_) => "aborted",
        }
    }
}

/// Operational signal sink, one record per handled event.
pub trait OutcomeSink: Send + Sync {
    fn record(&self, partner: Option<&PartnerKey>, outcome: &HandleOutcome);
}

/// Emits each outcome as a structured `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingOutcomeSink;

impl OutcomeSink for TracingOutcomeSink {
    fn record(&self, partner: Option<&PartnerKey>, outcome: &HandleOutcome) {
        let partner = partner.map(PartnerKey::as_str).unwrap_or("-");
        let label = outcome.label();
        match outcome {
            HandleOutcome::Aborted(err) | HandleOutcome::NotificationAborted(err) => {
                error!(partner, outcome = label, error = %err, "address confirmation event failed");
            }
            HandleOutcome::DeliveryFailed(err) => {
                warn!(
                    partner,
                    outcome = label,
                    error = %err,
                    "address confirmation mail not delivered"
                );
            }
            _ => info!(partner, outcome = label, "address confirmation event handled"),
        }
    }
}
