use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use addrconfirm_confirmation::EventHandler;
use addrconfirm_events::Subscription;

/// Handle to control and join a background worker.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
    handled: Arc<AtomicUsize>,
}

impl WorkerHandle {
    /// Events handled so far.
    pub fn handled(&self) -> usize {
        self.handled.load(Ordering::SeqCst)
    }

    /// Block until at least `count` events were handled or `timeout` passed.
    /// Returns whether the count was reached.
    pub fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.handled() < count {
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(5));
        }
        true
    }

    /// Request graceful shutdown and wait for the worker to stop.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

/// Drives an [`EventHandler`] from one consumer of the event bus.
///
/// Delivery is at-least-once; the handler tolerates redelivery. The bus
/// routes a partner's events to a single consumer and one worker handles one
/// delivery at a time, which serializes events per partner key.
#[derive(Debug)]
pub struct EventWorker;

impl EventWorker {
    /// Spawn a worker thread named `name` draining `subscription`.
    pub fn spawn(
        name: &'static str,
        subscription: Subscription,
        handler: Arc<EventHandler>,
    ) -> io::Result<WorkerHandle> {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let handled = Arc::new(AtomicUsize::new(0));
        let counter = handled.clone();

        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || worker_loop(name, subscription, shutdown_rx, &handler, &counter))?;

        Ok(WorkerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
            handled,
        })
    }
}

fn worker_loop(
    name: &'static str,
    subscription: Subscription,
    shutdown_rx: mpsc::Receiver<()>,
    handler: &EventHandler,
    handled: &AtomicUsize,
) {
    let tick = Duration::from_millis(250);

    loop {
        // A dropped handle counts as a shutdown request.
        match shutdown_rx.try_recv() {
            Ok(()) | Err(mpsc::TryRecvError::Disconnected) => break,
            Err(mpsc::TryRecvError::Empty) => {}
        }

        match subscription.recv_timeout(tick) {
            Ok(delivery) => {
                let outcome = handler.handle(&delivery.event);
                debug!(
                    worker = name,
                    delivery = %delivery.tag,
                    attempt = delivery.attempt,
                    outcome = outcome.label(),
                    "event handled"
                );
                handled.fetch_add(1, Ordering::SeqCst);
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
    debug!(worker = name, "worker stopped");
}

#[cfg(test)]
mod tests {
    use addrconfirm_confirmation::{LinkBuilder, TracingOutcomeSink};
    use addrconfirm_core::PartnerKey;
    use addrconfirm_events::{EventBus, InMemoryEventBus, MessageEvent};
    use addrconfirm_security::{AddressConfirmationToken, CipherError, ConfirmationCipher};

    use super::*;
    use crate::gateway::InMemoryPartnerGateway;
    use crate::notifier::OutboxNotifier;

    struct NoCipher;

    impl ConfirmationCipher for NoCipher {
        fn encrypt(&self, _token: &AddressConfirmationToken) -> Result<String, CipherError> {
            Err(CipherError::unavailable("unused"))
        }

        fn decrypt(&self, _opaque: &str) -> Result<AddressConfirmationToken, CipherError> {
            Err(CipherError::unavailable("unused"))
        }
    }

    fn handler() -> Arc<EventHandler> {
        Arc::new(EventHandler::new(
            // Empty, so every business partner event is ignored.
            Arc::new(InMemoryPartnerGateway::new()),
            Arc::new(OutboxNotifier::new()),
            Arc::new(NoCipher),
            LinkBuilder::new("https://example.com/%s").unwrap(),
            Arc::new(TracingOutcomeSink),
        ))
    }

    #[test]
    fn dropped_handle_stops_the_worker() {
        let bus = InMemoryEventBus::new();
        let worker = EventWorker::spawn("dropped", bus.subscribe().unwrap(), handler()).unwrap();
        let handled = worker.handled.clone();
        drop(worker);

        // The stopped worker released its subscription; the bus prunes it.
        thread::sleep(Duration::from_millis(600));
        let event = MessageEvent::business_partner_changed(&PartnerKey::new("1").unwrap());
        assert!(bus.publish(event).is_err());
        assert_eq!(handled.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn redeliveries_are_handled_like_first_deliveries() {
        let bus = InMemoryEventBus::new();
        let worker = EventWorker::spawn("redelivery", bus.subscribe().unwrap(), handler()).unwrap();

        let event = MessageEvent::business_partner_changed(&PartnerKey::new("1").unwrap());
        let tag = bus.publish(event).unwrap();
        bus.redeliver(tag).unwrap();

        assert!(worker.wait_for(2, Duration::from_secs(5)));
        worker.shutdown();
    }
}
