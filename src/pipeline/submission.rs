//! Entry-point validation and settled outcomes.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SubmissionError;
use crate::pipeline::types::{Idea, PublishReady, RejectionRecord};

/// Caller-supplied idea. Every field is required and must be non-blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IdeaSubmission {
    pub content_kind: String,
    pub persona: String,
    pub title: String,
    pub raw_idea: String,
}

impl IdeaSubmission {
    pub fn new(
        content_kind: impl Into<String>,
        persona: impl Into<String>,
        title: impl Into<String>,
        raw_idea: impl Into<String>,
    ) -> Self {
        Self {
            content_kind: content_kind.into(),
            persona: persona.into(),
            title: title.into(),
            raw_idea: raw_idea.into(),
        }
    }

    /// Parse one JSON submission.
    pub fn from_json(raw: &str) -> Result<Self, SubmissionError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Check required fields and mint the idea with a fresh id.
    pub fn into_idea(self) -> Result<Idea, SubmissionError> {
        let content_kind = required("contentKind", self.content_kind)?;
        let persona = required("persona", self.persona)?;
        let title = required("title", self.title)?;
        let raw_idea = required("rawIdea", self.raw_idea)?;
        Ok(Idea {
            id: Uuid::new_v4(),
            content_kind,
            persona,
            title,
            raw_idea,
        })
    }
}

fn required(field: &'static str, value: String) -> Result<String, SubmissionError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SubmissionError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

/// Where a submitted message came to rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum Outcome {
    Published(PublishReady),
    Rejected(RejectionRecord),
}

impl Outcome {
    pub fn message_id(&self) -> Uuid {
        match self {
            Self::Published(ready) => ready.idea().id,
            Self::Rejected(record) => record.original_message_id,
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published(_))
    }

    pub fn rejection(&self) -> Option<&RejectionRecord> {
        match self {
            Self::Rejected(record) => Some(record),
            Self::Published(_) => None,
        }
    }
}

/// Outcomes recorded by the terminal handlers, waiting for `submit` to
/// collect them. Independent of log retention.
///
/// Only ids registered with [`OutcomeBoard::expect`] are kept; messages
/// published straight onto the bus settle without leaving anything behind.
#[derive(Debug, Default)]
pub struct OutcomeBoard {
    settled: Mutex<HashMap<Uuid, Option<Outcome>>>,
}

impl OutcomeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in `message_id` before it is published.
    pub fn expect(&self, message_id: Uuid) {
        self.lock().insert(message_id, None);
    }

    /// Store `outcome` if someone is waiting for it. Returns whether it was kept.
    pub fn record(&self, outcome: Outcome) -> bool {
        match self.lock().get_mut(&outcome.message_id()) {
            Some(slot) => {
                *slot = Some(outcome);
                true
            }
            None => false,
        }
    }

    /// Collect the outcome for `message_id` and drop the registration.
    pub fn take(&self, message_id: Uuid) -> Option<Outcome> {
        self.lock().remove(&message_id).flatten()
    }

    /// Ids registered or settled but not yet collected.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, Option<Outcome>>> {
        self.settled.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PolicyEvaluator;

    #[test]
    fn valid_submission_becomes_idea() {
        let idea = IdeaSubmission::new("article", " Validation Strategist ", "Title", "Idea")
            .into_idea()
            .unwrap();
        assert_eq!(idea.persona, "Validation Strategist");
        assert_eq!(idea.title, "Title");
        assert!(!idea.id.is_nil());
    }

    #[test]
    fn each_submission_gets_a_fresh_id() {
        let submission = IdeaSubmission::new("article", "QA", "Title", "Idea");
        let a = submission.clone().into_idea().unwrap();
        let b = submission.into_idea().unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn blank_fields_are_rejected() {
        let cases = [
            (IdeaSubmission::new("", "QA", "T", "I"), "contentKind"),
            (IdeaSubmission::new("article", "  ", "T", "I"), "persona"),
            (IdeaSubmission::new("article", "QA", "", "I"), "title"),
            (IdeaSubmission::new("article", "QA", "T", "\n"), "rawIdea"),
        ];
        for (submission, field) in cases {
            match submission.into_idea() {
                Err(SubmissionError::MissingField(f)) => assert_eq!(f, field),
                other => panic!("expected missing {field}, got {other:?}"),
            }
        }
    }

    #[test]
    fn parses_json_with_missing_fields_as_blank() {
        let submission =
            IdeaSubmission::from_json(r#"{"contentKind": "post", "title": "T", "rawIdea": "I"}"#)
                .unwrap();
        assert!(matches!(
            submission.into_idea(),
            Err(SubmissionError::MissingField("persona"))
        ));
        assert!(matches!(
            IdeaSubmission::from_json("{"),
            Err(SubmissionError::Malformed(_))
        ));
    }

    fn rejected(id: Uuid) -> Outcome {
        let verdict = PolicyEvaluator::default().evaluate_idea("x", "CFO");
        Outcome::Rejected(RejectionRecord::from_verdict(id, &verdict))
    }

    #[test]
    fn board_hands_out_each_outcome_once() {
        let board = OutcomeBoard::new();
        let id = Uuid::new_v4();
        board.expect(id);
        assert!(board.record(rejected(id)));

        let outcome = board.take(id).unwrap();
        assert!(!outcome.is_published());
        assert_eq!(outcome.message_id(), id);
        assert!(board.take(id).is_none());
        assert!(board.is_empty());
    }

    #[test]
    fn board_ignores_outcomes_nobody_asked_for() {
        let board = OutcomeBoard::new();
        for _ in 0..100 {
            assert!(!board.record(rejected(Uuid::new_v4())));
        }
        assert!(board.is_empty());
    }

    #[test]
    fn unsettled_registration_is_cleared_by_take() {
        let board = OutcomeBoard::new();
        let id = Uuid::new_v4();
        board.expect(id);
        assert_eq!(board.len(), 1);
        assert!(board.take(id).is_none());
        assert!(board.is_empty());
    }
}
