//! Transport between the broker adapter and the confirmation workers.
//!
//! Delivery contract:
//!
//! - **At-least-once**: a delivery whose acknowledgement got lost comes back
//!   with the same [`DeliveryTag`] and a higher attempt; handlers must be idempotent
//! - **Per-partner ordering**: events for one partner key always go to the same
//!   consumer while the set of consumers is stable
//! - **No persistence**: the ERP stays the source of truth, a lost event is
//!   recovered by the next change

use std::fmt;
use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError};
use std::time::Duration;

use thiserror::Error;

use crate::event::MessageEvent;

/// Identifies one published event across its redeliveries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeliveryTag(pub(crate) u64);

impl fmt::Display for DeliveryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One delivery of an event to a consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub tag: DeliveryTag,
    /// 1 on first delivery.
    pub attempt: u32,
    pub event: MessageEvent,
}

impl Delivery {
    pub fn is_redelivery(&self) -> bool {
        self.attempt > 1
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// Nobody consumes; the broker adapter leaves the message unacknowledged.
    #[error("no consumer is subscribed")]
    NoConsumer,

    #[error("delivery {0} is unknown or no longer retained")]
    UnknownDelivery(DeliveryTag),

    #[error("event bus lock poisoned")]
    Poisoned,
}

/// Receiving end of one consumer. Drained by a single worker thread.
#[derive(Debug)]
pub struct Subscription {
    receiver: Receiver<Delivery>,
}

impl Subscription {
    pub(crate) fn new(receiver: Receiver<Delivery>) -> Self {
        Self { receiver }
    }

    pub fn try_recv(&self) -> Result<Delivery, TryRecvError> {
        self.receiver.try_recv()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<Delivery, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

/// Consumer-group transport for decoded ERP events.
pub trait EventBus: Send + Sync {
    /// Hand a new event to exactly one consumer.
    fn publish(&self, event: MessageEvent) -> Result<DeliveryTag, BusError>;

    /// Deliver a published event again, as the broker does when an
    /// acknowledgement is lost.
    fn redeliver(&self, tag: DeliveryTag) -> Result<(), BusError>;

    /// Join the consumer group.
    fn subscribe(&self) -> Result<Subscription, BusError>;
}
