//! In-process event bus for tests/dev.

use std::collections::VecDeque;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard, mpsc};

use addrconfirm_core::PartnerKey;

use crate::bus::{BusError, Delivery, DeliveryTag, EventBus, Subscription};
use crate::event::{InboundEvent, MessageEvent};

/// Deliveries kept for [`EventBus::redeliver`].
pub const DEFAULT_RETENTION: usize = 1024;

/// In-memory consumer group.
///
/// Each event goes to one consumer, picked by partner key, so one partner's
/// events are handled in publish order. Consumers that dropped their
/// subscription are pruned when a delivery to them fails. The last
/// `retention` deliveries can be redelivered.
#[derive(Debug)]
pub struct InMemoryEventBus {
    state: Mutex<BusState>,
    retention: usize,
}

#[derive(Debug, Default)]
struct BusState {
    next_tag: u64,
    consumers: Vec<mpsc::Sender<Delivery>>,
    retained: VecDeque<Delivery>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }

    pub fn with_retention(retention: usize) -> Self {
        Self {
            state: Mutex::new(BusState::default()),
            retention,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, BusState>, BusError> {
        self.state.lock().map_err(|_| BusError::Poisoned)
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

fn partition(key: Option<&PartnerKey>, consumers: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    (hasher.finish() % consumers as u64) as usize
}

fn dispatch(
    consumers: &mut Vec<mpsc::Sender<Delivery>>,
    mut delivery: Delivery,
) -> Result<(), BusError> {
    let key = delivery.event.business_partner_key();
    while !consumers.is_empty() {
        let idx = partition(key.as_ref(), consumers.len());
        match consumers[idx].send(delivery) {
            Ok(()) => return Ok(()),
            Err(mpsc::SendError(returned)) => {
                consumers.remove(idx);
                delivery = returned;
            }
        }
    }
    Err(BusError::NoConsumer)
}

impl EventBus for InMemoryEventBus {
    fn publish(&self, event: MessageEvent) -> Result<DeliveryTag, BusError> {
        let mut guard = self.lock()?;
        let state = &mut *guard;

        let delivery = Delivery {
            tag: DeliveryTag(state.next_tag),
            attempt: 1,
            event,
        };
        dispatch(&mut state.consumers, delivery.clone())?;
        state.next_tag += 1;

        if self.retention > 0 {
            if state.retained.len() == self.retention {
                state.retained.pop_front();
            }
            state.retained.push_back(delivery.clone());
        }
        Ok(delivery.tag)
    }

    fn redeliver(&self, tag: DeliveryTag) -> Result<(), BusError> {
        let mut guard = self.lock()?;
        let state = &mut *guard;

        let Some(retained) = state.retained.iter_mut().find(|d| d.tag == tag) else {
            return Err(BusError::UnknownDelivery(tag));
        };
        let mut delivery = retained.clone();
        delivery.attempt += 1;
        dispatch(&mut state.consumers, delivery)?;
        retained.attempt += 1;
        Ok(())
    }

    fn subscribe(&self) -> Result<Subscription, BusError> {
        let (tx, rx) = mpsc::channel();
        self.lock()?.consumers.push(tx);
        Ok(Subscription::new(rx))
    }
}
