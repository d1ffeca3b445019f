use std::sync::Arc;

use thiserror::Error;

use addrconfirm_partners::{Address, BusinessPartner};

/// Mail delivery failed. Transient and permanent failures look the same to
/// the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("mail delivery failed: {0}")]
pub struct DeliveryError(pub String);

impl DeliveryError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Address confirmation mail for one partner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub partner: BusinessPartner,
    pub email_address: String,
    pub address: Address,
    pub confirmation_link: String,
}

impl Notification {
    /// The address as it appears in the mail.
    pub fn rendered_address(&self) -> String {
        self.address.to_string()
    }
}

/// Mail transport.
///
/// A failed `send` rolls the partner back to `INITIAL` (even if it was `OPEN`
/// or `CONFIRMED` before): the contact has no link to confirm with, and the
/// next event for the partner must send the mail again. There is no retry
/// queue behind this trait.
pub trait Notifier: Send + Sync {
    fn send(&self, notification: &Notification) -> Result<(), DeliveryError>;
}

impl<N> Notifier for Arc<N>
where
    N: Notifier + ?Sized,
{
    fn send(&self, notification: &Notification) -> Result<(), DeliveryError> {
        (**self).send(notification)
    }
}
