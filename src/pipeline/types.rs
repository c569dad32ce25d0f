//! Shared types for the content pipeline.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::policy::{AnalysisReport, Check, PolicyStage, Verdict};

// ── Stages ──────────────────────────────────────────────────────────

/// Position of a content message in the lifecycle. Only ever advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Idea,
    Brief,
    BriefValidated,
    Draft,
    Final,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idea => "idea",
            Self::Brief => "brief",
            Self::BriefValidated => "brief-validated",
            Self::Draft => "draft",
            Self::Final => "final",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Content messages ────────────────────────────────────────────────

/// A submitted idea. The only message a caller builds directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Idea {
    pub id: Uuid,
    pub content_kind: String,
    pub persona: String,
    pub title: String,
    pub raw_idea: String,
}

impl Idea {
    /// Text the brief gate evaluates: title followed by the raw idea.
    pub fn brief_text(&self) -> String {
        format!("{} {}", self.title, self.raw_idea)
    }

    /// Advance to the brief stage, attaching the idea-stage analysis.
    pub fn into_brief(self, analysis: AnalysisReport) -> Brief {
        Brief {
            idea: self,
            analysis,
        }
    }
}

/// An idea that passed the idea gate, with the analyzer's findings attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brief {
    #[serde(flatten)]
    pub idea: Idea,
    #[serde(flatten)]
    pub analysis: AnalysisReport,
}

impl Brief {
    /// Advance past brief review with the review-time analysis and the
    /// approved brief text.
    pub fn approve(self, analysis: AnalysisReport, approved_brief: String) -> ApprovedBrief {
        ApprovedBrief {
            brief: Brief {
                idea: self.idea,
                analysis,
            },
            approved_brief,
        }
    }
}

/// A brief that passed review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovedBrief {
    #[serde(flatten)]
    pub brief: Brief,
    pub approved_brief: String,
}

impl ApprovedBrief {
    pub fn idea(&self) -> &Idea {
        &self.brief.idea
    }

    /// Attach the written draft.
    pub fn into_draft(self, body: DraftBody) -> Draft {
        Draft {
            approved: self,
            draft_content: body.content,
            draft_html: body.html,
            excerpt: body.excerpt,
        }
    }
}

/// Draft output of the authoring step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftBody {
    pub content: String,
    pub html: String,
    pub excerpt: String,
}

/// A written draft awaiting the publish gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    #[serde(flatten)]
    pub approved: ApprovedBrief,
    pub draft_content: String,
    pub draft_html: String,
    pub excerpt: String,
}

impl Draft {
    pub fn idea(&self) -> &Idea {
        self.approved.idea()
    }

    /// Mark final, replacing the analysis with the draft-time findings.
    pub fn finalize(mut self, analysis: AnalysisReport) -> PublishReady {
        self.approved.brief.analysis = analysis;
        PublishReady { draft: self }
    }
}

/// A draft cleared for the external publisher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReady {
    #[serde(flatten)]
    pub draft: Draft,
}

impl PublishReady {
    pub fn idea(&self) -> &Idea {
        self.draft.idea()
    }

    pub fn analysis(&self) -> &AnalysisReport {
        &self.draft.approved.brief.analysis
    }
}

/// Payload flowing between stage topics, discriminated by `stage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "kebab-case")]
pub enum ContentMessage {
    Idea(Idea),
    Brief(Brief),
    BriefValidated(ApprovedBrief),
    Draft(Draft),
    Final(PublishReady),
}

impl ContentMessage {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Idea(_) => Stage::Idea,
            Self::Brief(_) => Stage::Brief,
            Self::BriefValidated(_) => Stage::BriefValidated,
            Self::Draft(_) => Stage::Draft,
            Self::Final(_) => Stage::Final,
        }
    }

    /// Fields every stage carries forward from the original idea.
    pub fn idea(&self) -> &Idea {
        match self {
            Self::Idea(idea) => idea,
            Self::Brief(brief) => &brief.idea,
            Self::BriefValidated(approved) => approved.idea(),
            Self::Draft(draft) => draft.idea(),
            Self::Final(ready) => ready.idea(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.idea().id
    }

    /// Latest analysis attached to the message, if it has passed a gate.
    pub fn analysis(&self) -> Option<&AnalysisReport> {
        match self {
            Self::Idea(_) => None,
            Self::Brief(brief) => Some(&brief.analysis),
            Self::BriefValidated(approved) => Some(&approved.brief.analysis),
            Self::Draft(draft) => Some(&draft.approved.brief.analysis),
            Self::Final(ready) => Some(ready.analysis()),
        }
    }
}

// ── Rejections ──────────────────────────────────────────────────────

/// Terminal record for a message that failed a gate. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectionRecord {
    pub id: Uuid,
    /// Content message id; lookup only.
    pub original_message_id: Uuid,
    pub stage: PolicyStage,
    pub reason: String,
    pub failed_checks: Vec<Check>,
    pub analysis: AnalysisReport,
    pub timestamp: DateTime<Utc>,
}

impl RejectionRecord {
    /// Build from a failed verdict.
    pub fn from_verdict(original_message_id: Uuid, verdict: &Verdict) -> Self {
        Self {
            id: Uuid::new_v4(),
            original_message_id,
            stage: verdict.stage,
            reason: verdict.summary.clone(),
            failed_checks: verdict.failed_checks.clone(),
            analysis: verdict.analysis.clone(),
            timestamp: Utc::now(),
        }
    }
}
