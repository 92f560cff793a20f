//! Bounded producer-side queues (spec §4.6: capacity `2 × batchSize`,
//! non-blocking enqueue, drop-and-warn on overload). Ground:
//! `devolutions-gateway/src/job_queue.rs`'s `JobQueueHandle`, a clonable
//! `mpsc::Sender` wrapper with a blocking and non-blocking send variant.

use tokio::sync::mpsc;

use super::dispatch::LegacyEvent;
use crate::wire::event::Event;

#[derive(Clone)]
pub struct EventProducer {
    typed_tx: mpsc::Sender<Event>,
    legacy_tx: mpsc::Sender<LegacyEvent>,
}

pub struct EventConsumer {
    pub typed_rx: mpsc::Receiver<Event>,
    pub legacy_rx: mpsc::Receiver<LegacyEvent>,
}

pub fn channel(batch_size: usize) -> (EventProducer, EventConsumer) {
    let capacity = batch_size.saturating_mul(2).max(1);
    let (typed_tx, typed_rx) = mpsc::channel(capacity);
    let (legacy_tx, legacy_rx) = mpsc::channel(capacity);

    (
        EventProducer { typed_tx, legacy_tx },
        EventConsumer { typed_rx, legacy_rx },
    )
}

impl EventProducer {
    /// Non-blocking enqueue (spec §4.6 producer contract). Ordering within
    /// this producer's calls is preserved by the channel; no ordering is
    /// promised across producers.
    pub fn enqueue(&self, event: Event) {
        if let Err(error) = self.typed_tx.try_send(event) {
            tracing::warn!(
                capacity = self.typed_tx.capacity(),
                max_capacity = self.typed_tx.max_capacity(),
                "typed event queue full or closed, dropping event: {error}"
            );
        }
    }

    pub fn enqueue_legacy(&self, legacy: LegacyEvent) {
        if let Err(error) = self.legacy_tx.try_send(legacy) {
            tracing::warn!(
                capacity = self.legacy_tx.capacity(),
                max_capacity = self.legacy_tx.max_capacity(),
                "legacy event queue full or closed, dropping event: {error}"
            );
        }
    }
}
