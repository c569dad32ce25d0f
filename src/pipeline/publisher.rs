//! Publish collaborator: receives content that cleared every gate.
//!
//! Whatever the publisher does with it (CMS post, queue, file) is its own
//! business. Failures are logged by the caller and never change the
//! message's pipeline state.

use std::sync::{Mutex, PoisonError};

use tracing::info;

use crate::error::PublisherError;
use crate::pipeline::types::PublishReady;

/// Downstream consumer of publish-ready content.
pub trait Publisher: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    fn publish(&self, message: &PublishReady) -> Result<(), PublisherError>;
}

/// Publisher that only records the handoff in the trace log.
#[derive(Debug, Default)]
pub struct LogPublisher;

impl Publisher for LogPublisher {
    fn name(&self) -> &str {
        "log"
    }

    fn publish(&self, message: &PublishReady) -> Result<(), PublisherError> {
        let idea = message.idea();
        info!(
            message_id = %idea.id,
            title = %idea.title,
            content_kind = %idea.content_kind,
            excerpt = %message.draft.excerpt,
            "Content ready for publishing"
        );
        Ok(())
    }
}

/// Publisher that keeps everything it receives in memory.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<PublishReady>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything published so far, in order.
    pub fn published(&self) -> Vec<PublishReady> {
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Publisher for RecordingPublisher {
    fn name(&self) -> &str {
        "recording"
    }

    fn publish(&self, message: &PublishReady) -> Result<(), PublisherError> {
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.clone());
        Ok(())
    }
}
