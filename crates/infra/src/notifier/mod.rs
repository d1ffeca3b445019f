//! Mail transport adapters.

pub mod outbox;

pub use outbox::{OutboxNotifier, OutgoingMail};
