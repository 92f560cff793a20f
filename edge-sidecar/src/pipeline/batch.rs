//! Batch assembly, the 1s flush timer, and the outbound send (spec §4.6).
//!
//! Ground: `devolutions-gateway/src/subscriber.rs`'s single-consumer
//! `tokio::select!` loop (config-change branch vs. message branch) is the
//! direct model for this task's three-way select (typed queue / legacy
//! queue / flush timer), generalized to a third branch and a drain-on-exit
//! step on shutdown.

use std::collections::HashMap;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant, Sleep};
use uuid::Uuid;

use super::dispatch::{legacy_event_id, legacy_to_event, merge_legacy_into_event, LegacyEvent};
use super::queue::EventConsumer;
use crate::clients::decklog::DecklogClient;
use crate::task::{ShutdownSignal, Task};
use crate::tenant::TenantResolver;
use crate::wire::event::{Event, Source};

const FLUSH_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct Batch {
    pub batch_id: Uuid,
    pub source: Source,
    pub tenant_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub events: Vec<Event>,
    pub metadata: HashMap<String, String>,
}

impl Batch {
    /// Batches with zero envelopes are never emitted (spec §3 invariant).
    pub fn from_events(events: Vec<Event>, metadata: HashMap<String, String>) -> Option<Self> {
        if events.is_empty() {
            return None;
        }

        let source = events[0].source;
        let tenant_id = events.iter().find_map(|e| e.tenant_id.clone());

        Some(Self {
            batch_id: Uuid::new_v4(),
            source,
            tenant_id,
            timestamp: Utc::now(),
            events,
            metadata,
        })
    }
}

pub struct BatcherTask {
    pub consumer: EventConsumer,
    pub batch_size: usize,
    pub decklog: DecklogClient,
    pub tenant_resolver: TenantResolver,
}

#[async_trait]
impl Task for BatcherTask {
    type Output = anyhow::Result<()>;

    const NAME: &'static str = "batcher";

    async fn run(self, mut shutdown_signal: ShutdownSignal) -> Self::Output {
        let Self {
            mut consumer,
            batch_size,
            decklog,
            tenant_resolver,
        } = self;

        // Flushes are serialized by a single mutex (spec §4.6); within this
        // single-consumer loop that is already true by construction, but the
        // lock is kept so the shutdown path can share the exact same flush
        // routine as the periodic one without risking a double-send.
        let flush_lock = Mutex::new(());

        let mut pending: Vec<Event> = Vec::new();
        let mut metadata: HashMap<String, String> = HashMap::new();

        let mut timer: Pin<Box<Sleep>> = Box::pin(sleep(FLUSH_INTERVAL));

        loop {
            tokio::select! {
                () = shutdown_signal.wait() => break,
                maybe_event = consumer.typed_rx.recv() => {
                    let Some(event) = maybe_event else { break };
                    pending.push(event);
                    if pending.len() >= batch_size {
                        flush(&flush_lock, &mut pending, &mut metadata, &decklog, &tenant_resolver).await;
                        timer.as_mut().reset(Instant::now() + FLUSH_INTERVAL);
                    }
                }
                maybe_legacy = consumer.legacy_rx.recv() => {
                    let Some(legacy) = maybe_legacy else { break };
                    merge_legacy_metadata(&mut metadata, &legacy);

                    // spec §9: when both paths coexist, merge by event id and
                    // prefer typed fields rather than emitting a second event.
                    let merged = legacy_event_id(&legacy).and_then(|id| {
                        pending.iter_mut().find(|event| event.id.to_string() == id)
                    });

                    match merged {
                        Some(event) => merge_legacy_into_event(event, &legacy),
                        None => match legacy_to_event(&legacy) {
                            Some(event) => pending.push(event),
                            None => tracing::warn!(event_type = legacy.event_type, "dropping unrecognized legacy event"),
                        },
                    }

                    if pending.len() >= batch_size {
                        flush(&flush_lock, &mut pending, &mut metadata, &decklog, &tenant_resolver).await;
                        timer.as_mut().reset(Instant::now() + FLUSH_INTERVAL);
                    }
                }
                () = &mut timer => {
                    flush(&flush_lock, &mut pending, &mut metadata, &decklog, &tenant_resolver).await;
                    timer.as_mut().reset(Instant::now() + FLUSH_INTERVAL);
                }
            }
        }

        // Shutdown: flush once synchronously, then return so the caller can
        // close the outbound channel (spec §4.6 shutdown sequence).
        flush(&flush_lock, &mut pending, &mut metadata, &decklog, &tenant_resolver).await;

        Ok(())
    }
}

fn merge_legacy_metadata(metadata: &mut HashMap<String, String>, legacy: &LegacyEvent) {
    for (key, value) in &legacy.fields {
        let flat = match value {
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        };
        metadata.insert(format!("{}.{}", legacy.event_type, key), flat);
    }
}

async fn flush(
    flush_lock: &Mutex<()>,
    pending: &mut Vec<Event>,
    metadata: &mut HashMap<String, String>,
    decklog: &DecklogClient,
    tenant_resolver: &TenantResolver,
) {
    let _guard = flush_lock.lock().await;

    if pending.is_empty() {
        return;
    }

    let mut events = std::mem::take(pending);
    let metadata = std::mem::take(metadata);

    let has_tenant = events.iter().any(|e| e.tenant_id.as_deref().is_some_and(|t| !t.is_empty()));
    if !has_tenant {
        if let Some(idx) = events.iter().position(|e| e.internal_name.is_some()) {
            let internal_name = events[idx].internal_name.clone().expect("checked above");
            let tenant_id = tenant_resolver.resolve(&internal_name).await;
            if !tenant_id.is_empty() {
                events[idx].tenant_id = Some(tenant_id);
            }
        }
    }

    let Some(batch) = Batch::from_events(events, metadata) else {
        return;
    };

    let batch_id = batch.batch_id;
    let event_count = batch.events.len();

    if let Err(error) = decklog.send_batch(batch.into()).await {
        tracing::error!(
            error = format!("{error:#}"),
            %batch_id,
            event_count,
            "failed to send analytics batch; events dropped"
        );
    }
}
