//! Envelopes: the log's record of one publish.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::topic::{PayloadKind, Topic};
use crate::pipeline::types::{ContentMessage, RejectionRecord};

/// What handlers receive. Each topic accepts exactly one kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Rejection(RejectionRecord),
    Content(ContentMessage),
}

impl Payload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Self::Content(_) => PayloadKind::Content,
            Self::Rejection(_) => PayloadKind::Rejection,
        }
    }

    /// Id of the content message this payload is about.
    pub fn message_id(&self) -> Uuid {
        match self {
            Self::Content(message) => message.id(),
            Self::Rejection(record) => record.original_message_id,
        }
    }

    pub fn as_content(&self) -> Option<&ContentMessage> {
        match self {
            Self::Content(message) => Some(message),
            Self::Rejection(_) => None,
        }
    }

    pub fn as_rejection(&self) -> Option<&RejectionRecord> {
        match self {
            Self::Rejection(record) => Some(record),
            Self::Content(_) => None,
        }
    }
}

impl From<ContentMessage> for Payload {
    fn from(message: ContentMessage) -> Self {
        Self::Content(message)
    }
}

impl From<RejectionRecord> for Payload {
    fn from(record: RejectionRecord) -> Self {
        Self::Rejection(record)
    }
}

/// One published message as recorded in the log. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    id: Uuid,
    topic: Topic,
    payload: Payload,
    timestamp: DateTime<Utc>,
}

impl Envelope {
    /// Wrap a payload with a fresh id and the current time.
    pub fn new(topic: Topic, payload: Payload) -> Self {
        Self {
            id: Uuid::new_v4(),
            topic,
            payload,
            timestamp: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn topic(&self) -> Topic {
        self.topic
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
