use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use addrconfirm_confirmation::{DeliveryError, Notification, Notifier};
use addrconfirm_core::PartnerKey;

/// A rendered plain-text confirmation mail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingMail {
    pub partner: PartnerKey,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub confirmation_link: String,
    pub queued_at: DateTime<Utc>,
}

impl OutgoingMail {
    pub fn render(notification: &Notification) -> Self {
        let partner = notification.partner.key();
        let subject = format!("Please confirm the postal address of business partner {partner}");
        let body = format!(
            "Hello,\n\
             \n\
             the postal address we have on file for business partner {partner} is:\n\
             \n\
             \x20   {address}\n\
             \n\
             If this address is correct, please confirm it by opening the following link:\n\
             \n\
             {link}\n\
             \n\
             If the address is not correct, please update it in your customer profile.\n",
            address = notification.rendered_address(),
            link = notification.confirmation_link,
        );

        Self {
            partner: partner.clone(),
            to: notification.email_address.clone(),
            subject,
            body,
            confirmation_link: notification.confirmation_link.clone(),
            queued_at: Utc::now(),
        }
    }
}

/// Notifier that renders mails into an in-process outbox.
///
/// A relay (or a test) drains the outbox. `fail_with` makes subsequent sends
/// fail until `recover` is called.
#[derive(Debug, Default)]
pub struct OutboxNotifier {
    outbox: Mutex<Vec<OutgoingMail>>,
    failure: Mutex<Option<String>>,
}

impl OutboxNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_with(&self, reason: impl Into<String>) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = Some(reason.into());
        }
    }

    pub fn recover(&self) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = None;
        }
    }

    /// Mails queued so far, oldest first.
    pub fn mails(&self) -> Vec<OutgoingMail> {
        self.outbox.lock().map(|o| o.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.outbox.lock().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove and return every queued mail.
    pub fn drain(&self) -> Vec<OutgoingMail> {
        self.outbox
            .lock()
            .map(|mut o| std::mem::take(&mut *o))
            .unwrap_or_default()
    }

    /// Queued mails as JSON lines, the relay's input format.
    pub fn to_json_lines(&self) -> serde_json::Result<String> {
        let mut lines = String::new();
        for mail in self.mails() {
            lines.push_str(&serde_json::to_string(&mail)?);
            lines.push('\n');
        }
        Ok(lines)
    }
}

impl Notifier for OutboxNotifier {
    fn send(&self, notification: &Notification) -> Result<(), DeliveryError> {
        if let Some(reason) = self
            .failure
            .lock()
            .map_err(|_| DeliveryError::new("outbox poisoned"))?
            .clone()
        {
            return Err(DeliveryError::new(reason));
        }

        let mail = OutgoingMail::render(notification);
        info!(partner = %mail.partner, to = %mail.to, "confirmation mail queued");
        self.outbox
            .lock()
            .map_err(|_| DeliveryError::new("outbox poisoned"))?
            .push(mail);
        Ok(())
    }
}
