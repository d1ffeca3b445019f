//! Inbound ERP events and the in-process transport that carries them.
//!
//! The broker adapter that talks to the ERP's event mesh is outside this
//! workspace; it hands over decoded [`MessageEvent`]s, which travel to the
//! confirmation workers over an [`EventBus`] as [`Delivery`]s.

pub mod bus;
pub mod event;
pub mod in_memory_bus;

pub use bus::{BusError, Delivery, DeliveryTag, EventBus, Subscription};
pub use event::{EventDecodeError, InboundEvent, MessageEvent};
pub use in_memory_bus::{DEFAULT_RETENTION, InMemoryEventBus};
