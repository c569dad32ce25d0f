//! Append-only message log with bounded retention, and its JSON file store.
//!
//! The on-disk format is a single document, `{"messages": [Envelope, ...]}`,
//! rewritten in full after every publish.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use super::envelope::Envelope;
use super::topic::Topic;
use crate::error::PersistenceError;

/// In-memory log of the most recent envelopes, oldest first.
#[derive(Debug, Clone)]
pub struct MessageLog {
    entries: VecDeque<Envelope>,
    capacity: usize,
}

impl MessageLog {
    /// Create an empty log retaining at most `capacity` envelopes.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Build from previously persisted envelopes, keeping the newest.
    pub fn from_envelopes(envelopes: Vec<Envelope>, capacity: usize) -> Self {
        let mut log = Self::new(capacity);
        for envelope in envelopes {
            log.append(envelope);
        }
        log
    }

    /// Append, evicting the oldest entry once full.
    pub fn append(&mut self, envelope: Envelope) {
        if self.entries.len() == self.capacity {
            if let Some(evicted) = self.entries.pop_front() {
                debug!(envelope_id = %evicted.id(), "Evicted oldest log entry");
            }
        }
        self.entries.push_back(envelope);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Up to `n` most recent envelopes, oldest first.
    pub fn recent(&self, n: usize) -> Vec<Envelope> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }

    /// Up to `n` most recent envelopes published on `topic`, oldest first.
    pub fn recent_for_topic(&self, topic: Topic, n: usize) -> Vec<Envelope> {
        let mut matching: Vec<Envelope> = self
            .entries
            .iter()
            .rev()
            .filter(|e| e.topic() == topic)
            .take(n)
            .cloned()
            .collect();
        matching.reverse();
        matching
    }

    /// Every retained envelope about content message `message_id`.
    pub fn history(&self, message_id: Uuid) -> Vec<Envelope> {
        self.entries
            .iter()
            .filter(|e| e.payload().message_id() == message_id)
            .cloned()
            .collect()
    }

    fn snapshot(&self) -> LogDocument<'_> {
        LogDocument {
            messages: self.entries.iter().collect(),
        }
    }
}

#[derive(Serialize)]
struct LogDocument<'a> {
    messages: Vec<&'a Envelope>,
}

#[derive(Deserialize)]
struct OwnedLogDocument {
    messages: Vec<Envelope>,
}

/// JSON file backing for a [`MessageLog`].
#[derive(Debug, Clone)]
pub struct LogStore {
    path: PathBuf,
}

impl LogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted log. A missing or unreadable file yields an empty
    /// log; that is a normal first start, not an error.
    pub fn load(&self, capacity: usize) -> MessageLog {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No message log on disk, starting empty");
                return MessageLog::new(capacity);
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Could not read message log, starting empty");
                return MessageLog::new(capacity);
            }
        };

        match serde_json::from_str::<OwnedLogDocument>(&raw) {
            Ok(doc) => {
                let log = MessageLog::from_envelopes(doc.messages, capacity);
                debug!(path = %self.path.display(), entries = log.len(), "Loaded message log");
                log
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Malformed message log, starting empty");
                MessageLog::new(capacity)
            }
        }
    }

    /// Replace the file with the full retained log.
    ///
    /// Writes a sibling `.tmp` file and renames it over the target, so a
    /// crash mid-write leaves the previous log in place.
    pub fn save(&self, log: &MessageLog) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(&log.snapshot())?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|source| io_error(parent, source))?;
        }

        let staging = self.staging_path();
        std::fs::write(&staging, json).map_err(|source| io_error(&staging, source))?;
        if let Err(source) = std::fs::rename(&staging, &self.path) {
            let _ = std::fs::remove_file(&staging);
            return Err(io_error(&self.path, source));
        }
        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> PersistenceError {
    PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::envelope::Payload;
    use crate::pipeline::types::{ContentMessage, Idea};
    use tempfile::TempDir;

    fn envelope(topic: Topic, id: Uuid) -> Envelope {
        let payload = Payload::Content(ContentMessage::Idea(Idea {
            id,
            content_kind: "article".into(),
            persona: "Validation Strategist".into(),
            title: "t".into(),
            raw_idea: "r".into(),
        }));
        Envelope::new(topic, payload)
    }

    #[test]
    fn evicts_oldest_past_capacity() {
        let mut log = MessageLog::new(3);
        let ids: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        for id in &ids {
            log.append(envelope(Topic::IdeaQueue, *id));
        }
        assert_eq!(log.len(), 3);
        let kept: Vec<Uuid> = log
            .recent(10)
            .iter()
            .map(|e| e.payload().message_id())
            .collect();
        assert_eq!(kept, ids[2..].to_vec());
    }

    #[test]
    fn recent_returns_newest_in_order() {
        let mut log = MessageLog::new(10);
        let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        for id in &ids {
            log.append(envelope(Topic::IdeaQueue, *id));
        }
        let recent: Vec<Uuid> = log
            .recent(2)
            .iter()
            .map(|e| e.payload().message_id())
            .collect();
        assert_eq!(recent, vec![ids[2], ids[3]]);
        assert!(log.recent(0).is_empty());
    }

    #[test]
    fn recent_for_topic_filters() {
        let mut log = MessageLog::new(10);
        let id = Uuid::new_v4();
        log.append(envelope(Topic::IdeaQueue, id));
        log.append(envelope(Topic::BriefReady, id));
        log.append(envelope(Topic::IdeaQueue, id));
        log.append(envelope(Topic::BriefForReview, id));

        let ideas = log.recent_for_topic(Topic::IdeaQueue, 5);
        assert_eq!(ideas.len(), 2);
        assert!(ideas.iter().all(|e| e.topic() == Topic::IdeaQueue));
        assert_eq!(log.recent_for_topic(Topic::IdeaQueue, 1).len(), 1);
        assert!(log.recent_for_topic(Topic::PublishQueue, 5).is_empty());
    }

    #[test]
    fn history_matches_message_id() {
        let mut log = MessageLog::new(10);
        let mine = Uuid::new_v4();
        log.append(envelope(Topic::IdeaQueue, mine));
        log.append(envelope(Topic::IdeaQueue, Uuid::new_v4()));
        log.append(envelope(Topic::BriefReady, mine));
        assert_eq!(log.history(mine).len(), 2);
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = LogStore::new(dir.path().join("nested/log.json"));
        let mut log = MessageLog::new(10);
        log.append(envelope(Topic::IdeaQueue, Uuid::new_v4()));
        log.append(envelope(Topic::BriefReady, Uuid::new_v4()));
        store.save(&log).unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(doc["messages"].as_array().unwrap().len(), 2);
        assert_eq!(doc["messages"][1]["topic"], "brief-ready");

        let loaded = store.load(10);
        assert_eq!(loaded.recent(10), log.recent(10));
    }

    #[test]
    fn load_trims_to_capacity() {
        let dir = TempDir::new().unwrap();
        let store = LogStore::new(dir.path().join("log.json"));
        let mut log = MessageLog::new(10);
        for _ in 0..6 {
            log.append(envelope(Topic::IdeaQueue, Uuid::new_v4()));
        }
        store.save(&log).unwrap();
        assert_eq!(store.load(4).len(), 4);
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = LogStore::new(dir.path().join("absent.json"));
        assert!(store.load(5).is_empty());
    }

    #[test]
    fn malformed_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.json");
        std::fs::write(&path, r#"{"messages": [{"nope": true}]}"#).unwrap();
        assert!(LogStore::new(&path).load(5).is_empty());

        std::fs::write(&path, "not json at all").unwrap();
        assert!(LogStore::new(&path).load(5).is_empty());
    }

    #[test]
    fn save_fails_when_path_is_a_directory() {
        let dir = TempDir::new().unwrap();
        let store = LogStore::new(dir.path());
        let err = store.save(&MessageLog::new(1)).unwrap_err();
        assert!(matches!(err, PersistenceError::Io { .. }));
    }

    #[test]
    fn torn_write_leaves_previous_log_readable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.json");
        let store = LogStore::new(&path);
        let mut log = MessageLog::new(10);
        log.append(envelope(Topic::IdeaQueue, Uuid::new_v4()));
        log.append(envelope(Topic::BriefReady, Uuid::new_v4()));
        store.save(&log).unwrap();

        // A crash mid-write only ever touches the staging file.
        let staging = dir.path().join("log.json.tmp");
        std::fs::write(&staging, r#"{"messages": [{"id"#).unwrap();
        assert_eq!(store.load(10).len(), 2);

        log.append(envelope(Topic::IdeaQueue, Uuid::new_v4()));
        store.save(&log).unwrap();
        assert!(!staging.exists());
        assert_eq!(store.load(10).len(), 3);
    }
}
