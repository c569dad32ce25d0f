//! Error types for the content firewall.
//!
//! Policy failures are not errors: they travel through the bus as
//! rejection records. Everything here is either invalid input caught at the
//! entry point, an I/O problem, or a wiring bug.

use std::path::PathBuf;

use uuid::Uuid;

use crate::bus::{PayloadKind, Topic, UnknownTopic};

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Submission error: {0}")]
    Submission(#[from] SubmissionError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to read policy file {path}: {source}")]
    PolicyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse policy file {path}: {source}")]
    PolicyParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Rejected before anything reaches the bus.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Malformed submission: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Dispatcher errors. Both variants abort the current dispatch chain.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Topic {topic} carries {expected} payloads, got {actual}")]
    PayloadMismatch {
        topic: Topic,
        expected: PayloadKind,
        actual: PayloadKind,
    },

    #[error("Handler for {topic} failed: {source}")]
    Handler {
        topic: Topic,
        #[source]
        source: Box<PipelineError>,
    },
}

/// Message log persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode message log: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Stage handler errors.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Handler for {topic} received a {actual} message")]
    UnexpectedStage { topic: Topic, actual: String },

    #[error("Handler for {topic} received a rejection record")]
    UnexpectedRejection { topic: Topic },

    #[error("Message {message_id} did not reach a terminal topic")]
    Unsettled { message_id: Uuid },

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Failures reported by the external publisher. Logged, never fed back.
#[derive(Debug, thiserror::Error)]
pub enum PublisherError {
    #[error("Publisher {name} unavailable: {reason}")]
    Unavailable { name: String, reason: String },
}

/// Errors parsing an interactive command line.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error(transparent)]
    Topic(#[from] UnknownTopic),

    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
