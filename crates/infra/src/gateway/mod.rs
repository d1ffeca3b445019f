//! ERP gateway adapters.

pub mod in_memory;

pub use in_memory::{GatewayCalls, InMemoryPartnerGateway};
