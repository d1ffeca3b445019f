//! Infrastructure layer: configuration, collaborator adapters, event worker
//! and process wiring.

pub mod config;
pub mod gateway;
pub mod notifier;
pub mod wiring;
pub mod workers;


pub use config::{ConfigError, Settings};
pub use gateway::{GatewayCalls, InMemoryPartnerGateway};
pub use notifier::{OutboxNotifier, OutgoingMail};
pub use wiring::AddressConfirmation;
pub use workers::{EventWorker, WorkerHandle};
