//! Dispatcher: synchronous publish/subscribe over the fixed topic set.
//!
//! `publish` appends to the log, persists it, then runs every handler for the
//! topic in registration order. Handlers get the dispatcher back so they can
//! publish the next stage; that nested publish settles completely before the
//! outer handler continues, so one submission walks the stage graph
//! depth-first and is fully settled when the top-level call returns.
//!
//! Locks are never held while a handler runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tracing::{debug, error};
use uuid::Uuid;

use super::envelope::{Envelope, Payload};
use super::log::{LogStore, MessageLog};
use super::topic::Topic;
use crate::config::DEFAULT_LOG_CAPACITY;
use crate::error::{DispatchError, PipelineError};

/// A subscriber on one topic.
pub trait Handler: Send + Sync {
    fn handle(&self, bus: &Dispatcher, payload: &Payload) -> Result<(), PipelineError>;
}

impl<F> Handler for F
where
    F: Fn(&Dispatcher, &Payload) -> Result<(), PipelineError> + Send + Sync,
{
    fn handle(&self, bus: &Dispatcher, payload: &Payload) -> Result<(), PipelineError> {
        self(bus, payload)
    }
}

/// Process-wide message bus. Construct once and pass by reference.
pub struct Dispatcher {
    handlers: RwLock<HashMap<Topic, Vec<Arc<dyn Handler>>>>,
    log: Mutex<MessageLog>,
    store: Option<LogStore>,
    persistence_failures: AtomicU64,
}

impl Dispatcher {
    /// In-memory dispatcher with no file backing.
    pub fn new(capacity: usize) -> Self {
        Self::build(MessageLog::new(capacity), None)
    }

    /// Dispatcher whose log is loaded from, and written back to, `store`.
    pub fn with_store(store: LogStore, capacity: usize) -> Self {
        let log = store.load(capacity);
        Self::build(log, Some(store))
    }

    fn build(log: MessageLog, store: Option<LogStore>) -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            log: Mutex::new(log),
            store,
            persistence_failures: AtomicU64::new(0),
        }
    }

    /// Register a closure for `topic`. Handlers run in registration order.
    pub fn subscribe<F>(&self, topic: Topic, handler: F)
    where
        F: Fn(&Dispatcher, &Payload) -> Result<(), PipelineError> + Send + Sync + 'static,
    {
        self.subscribe_handler(topic, Arc::new(handler));
    }

    /// Register a shared handler for `topic`.
    pub fn subscribe_handler(&self, topic: Topic, handler: Arc<dyn Handler>) {
        let mut handlers = self
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        handlers.entry(topic).or_default().push(handler);
        debug!(topic = %topic, "Registered handler");
    }

    /// Number of handlers registered on `topic`.
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&topic)
            .map_or(0, Vec::len)
    }

    /// Record `payload` on `topic` and run its handlers to completion.
    ///
    /// Returns the new envelope's id. A payload of the wrong kind for the
    /// topic is rejected before anything is logged. A handler error stops
    /// the remaining handlers and is returned as-is; it is never retried.
    pub fn publish(
        &self,
        topic: Topic,
        payload: impl Into<Payload>,
    ) -> Result<Uuid, DispatchError> {
        let payload = payload.into();
        if payload.kind() != topic.payload_kind() {
            return Err(DispatchError::PayloadMismatch {
                topic,
                expected: topic.payload_kind(),
                actual: payload.kind(),
            });
        }

        let envelope = Envelope::new(topic, payload.clone());
        let envelope_id = envelope.id();
        debug!(
            envelope_id = %envelope_id,
            message_id = %payload.message_id(),
            topic = %topic,
            "Publishing"
        );
        self.record(envelope);

        let handlers: Vec<Arc<dyn Handler>> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&topic)
            .cloned()
            .unwrap_or_default();

        for handler in handlers {
            handler
                .handle(self, &payload)
                .map_err(|source| DispatchError::Handler {
                    topic,
                    source: Box::new(source),
                })?;
        }

        Ok(envelope_id)
    }

    /// Append to the log and rewrite the store. A failed write leaves the
    /// in-memory log intact and is counted for operators.
    fn record(&self, envelope: Envelope) {
        let mut log = self.lock_log();
        log.append(envelope);
        if let Some(store) = &self.store
            && let Err(e) = store.save(&log)
        {
            self.persistence_failures.fetch_add(1, Ordering::Relaxed);
            error!(
                path = %store.path().display(),
                error = %e,
                "Failed to persist message log; audit history on disk is stale"
            );
        }
    }

    fn lock_log(&self) -> MutexGuard<'_, MessageLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Inspection ──────────────────────────────────────────────────

    /// Up to `n` most recent envelopes, oldest first.
    pub fn recent(&self, n: usize) -> Vec<Envelope> {
        self.lock_log().recent(n)
    }

    /// Up to `n` most recent envelopes on `topic`, oldest first.
    pub fn recent_for_topic(&self, topic: Topic, n: usize) -> Vec<Envelope> {
        self.lock_log().recent_for_topic(topic, n)
    }

    /// Retained envelopes about content message `message_id`.
    pub fn history(&self, message_id: Uuid) -> Vec<Envelope> {
        self.lock_log().history(message_id)
    }

    /// Envelopes currently retained.
    pub fn len(&self) -> usize {
        self.lock_log().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_log().is_empty()
    }

    /// Log writes that failed since startup.
    pub fn persistence_failures(&self) -> u64 {
        self.persistence_failures.load(Ordering::Relaxed)
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::{ContentMessage, Idea, RejectionRecord};
    use crate::policy::PolicyEvaluator;
    use tempfile::TempDir;

    fn idea(id: Uuid) -> ContentMessage {
        ContentMessage::Idea(Idea {
            id,
            content_kind: "article".into(),
            persona: "Validation Strategist".into(),
            title: "t".into(),
            raw_idea: "r".into(),
        })
    }

    fn rejection(id: Uuid) -> RejectionRecord {
        let verdict = PolicyEvaluator::default().evaluate_idea("r", "CFO");
        RejectionRecord::from_verdict(id, &verdict)
    }

    #[test]
    fn publish_logs_without_subscribers() {
        let bus = Dispatcher::new(10);
        let id = Uuid::new_v4();
        let envelope_id = bus.publish(Topic::IdeaQueue, idea(id)).unwrap();

        let recent = bus.recent(10);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id(), envelope_id);
        assert_eq!(recent[0].topic(), Topic::IdeaQueue);
        assert_eq!(recent[0].payload().message_id(), id);
    }

    #[test]
    fn handlers_run_in_registration_order() {
        let bus = Dispatcher::new(10);
        let calls = Arc::new(Mutex::new(Vec::new()));
        for n in 0..3 {
            let calls = Arc::clone(&calls);
            bus.subscribe(Topic::IdeaQueue, move |_: &Dispatcher, _: &Payload| {
                calls.lock().unwrap().push(n);
                Ok(())
            });
        }
        assert_eq!(bus.subscriber_count(Topic::IdeaQueue), 3);

        bus.publish(Topic::IdeaQueue, idea(Uuid::new_v4())).unwrap();
        assert_eq!(*calls.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn nested_publish_settles_before_outer_handler_returns() {
        let bus = Dispatcher::new(10);
        let order = Arc::new(Mutex::new(Vec::new()));

        {
            let order = Arc::clone(&order);
            bus.subscribe(Topic::IdeaQueue, move |bus: &Dispatcher, payload: &Payload| {
                order.lock().unwrap().push("idea:start");
                let message = payload.as_content().cloned().unwrap();
                bus.publish(Topic::BriefReady, message)?;
                order.lock().unwrap().push("idea:end");
                Ok(())
            });
        }
        {
            let order = Arc::clone(&order);
            bus.subscribe(Topic::IdeaQueue, move |_: &Dispatcher, _: &Payload| {
                order.lock().unwrap().push("idea:second");
                Ok(())
            });
        }
        {
            let order = Arc::clone(&order);
            bus.subscribe(Topic::BriefReady, move |_: &Dispatcher, _: &Payload| {
                order.lock().unwrap().push("brief");
                Ok(())
            });
        }

        bus.publish(Topic::IdeaQueue, idea(Uuid::new_v4())).unwrap();
        assert_eq!(
            *order.lock().unwrap(),
            vec!["idea:start", "brief", "idea:end", "idea:second"]
        );
        let topics: Vec<Topic> = bus.recent(10).iter().map(Envelope::topic).collect();
        assert_eq!(topics, vec![Topic::IdeaQueue, Topic::BriefReady]);
    }

    #[test]
    fn payload_kind_must_match_topic() {
        let bus = Dispatcher::new(10);
        let id = Uuid::new_v4();

        let err = bus.publish(Topic::IdeaRejected, idea(id)).unwrap_err();
        assert!(matches!(err, DispatchError::PayloadMismatch { .. }));

        let err = bus.publish(Topic::PublishQueue, rejection(id)).unwrap_err();
        assert!(matches!(err, DispatchError::PayloadMismatch { .. }));

        assert!(bus.is_empty());
    }

    #[test]
    fn handler_error_stops_dispatch() {
        let bus = Dispatcher::new(10);
        let ran = Arc::new(Mutex::new(false));
        bus.subscribe(Topic::IdeaQueue, |_: &Dispatcher, _: &Payload| {
            Err(PipelineError::UnexpectedRejection {
                topic: Topic::IdeaQueue,
            })
        });
        {
            let ran = Arc::clone(&ran);
            bus.subscribe(Topic::IdeaQueue, move |_: &Dispatcher, _: &Payload| {
                *ran.lock().unwrap() = true;
                Ok(())
            });
        }

        let err = bus.publish(Topic::IdeaQueue, idea(Uuid::new_v4())).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Handler {
                topic: Topic::IdeaQueue,
                ..
            }
        ));
        assert!(!*ran.lock().unwrap());
        // Still logged: the envelope is recorded before handlers run.
        assert_eq!(bus.len(), 1);
    }

    #[test]
    fn store_is_rewritten_on_every_publish() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.json");
        let bus = Dispatcher::with_store(LogStore::new(&path), 10);

        bus.publish(Topic::IdeaQueue, idea(Uuid::new_v4())).unwrap();
        bus.publish(Topic::IdeaQueue, idea(Uuid::new_v4())).unwrap();

        let reloaded = Dispatcher::with_store(LogStore::new(&path), 10);
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.recent(10), bus.recent(10));
        assert_eq!(bus.persistence_failures(), 0);
    }

    #[test]
    fn persistence_failure_does_not_stop_dispatch() {
        let dir = TempDir::new().unwrap();
        // A directory cannot be written as a file.
        let bus = Dispatcher::with_store(LogStore::new(dir.path()), 10);
        let handled = Arc::new(Mutex::new(0));
        {
            let handled = Arc::clone(&handled);
            bus.subscribe(Topic::IdeaQueue, move |_: &Dispatcher, _: &Payload| {
                *handled.lock().unwrap() += 1;
                Ok(())
            });
        }

        bus.publish(Topic::IdeaQueue, idea(Uuid::new_v4())).unwrap();
        assert_eq!(*handled.lock().unwrap(), 1);
        assert_eq!(bus.len(), 1);
        assert_eq!(bus.persistence_failures(), 1);
    }

    #[test]
    fn retention_bound_applies() {
        let bus = Dispatcher::new(2);
        for _ in 0..5 {
            bus.publish(Topic::IdeaQueue, idea(Uuid::new_v4())).unwrap();
        }
        assert_eq!(bus.len(), 2);
    }
}
