//! Stage wiring: turns the dispatcher and the policy evaluator into the
//! idea → brief → draft → publish pipeline.
//!
//! ```text
//! idea-queue ──► idea-rejected
//!     └──► brief-ready ──► brief-for-review ──► brief-rejected
//!                               └──► brief-approved
//!                               └──► cpa-work-queue ──► draft-for-publish-review
//!                                                          ├──► draft-rejected
//!                                                          └──► publish-queue
//! ```
//!
//! Each gate re-analyzes the text in front of it. A brief that passed
//! review is checked again as a draft, so edits made in between cannot
//! slip through.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::bus::{Dispatcher, Handler, Payload, Topic};
use crate::error::{Error, PipelineError};
use crate::pipeline::author::ContentAuthor;
use crate::pipeline::publisher::Publisher;
use crate::pipeline::submission::{IdeaSubmission, Outcome, OutcomeBoard};
use crate::pipeline::types::{ContentMessage, RejectionRecord, Stage};
use crate::policy::{PolicyEvaluator, Verdict};

/// The wired pipeline. Owns the handlers' shared state; the dispatcher is
/// shared with whoever else needs to inspect the log.
pub struct Pipeline {
    bus: Arc<Dispatcher>,
    outcomes: Arc<OutcomeBoard>,
}

impl Pipeline {
    /// Register one handler per stage topic on `bus`.
    ///
    /// Call once per dispatcher; wiring twice would run every gate twice.
    pub fn wire(
        bus: Arc<Dispatcher>,
        evaluator: Arc<PolicyEvaluator>,
        author: Arc<dyn ContentAuthor>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        let outcomes = Arc::new(OutcomeBoard::new());

        bus.subscribe_handler(
            Topic::IdeaQueue,
            Arc::new(IdeaGate {
                evaluator: Arc::clone(&evaluator),
            }),
        );
        bus.subscribe_handler(Topic::BriefReady, Arc::new(BriefIntake));
        bus.subscribe_handler(
            Topic::BriefForReview,
            Arc::new(BriefGate {
                evaluator: Arc::clone(&evaluator),
                author: Arc::clone(&author),
            }),
        );
        bus.subscribe_handler(Topic::BriefApproved, Arc::new(BriefApprovalAudit));
        bus.subscribe_handler(Topic::CpaWorkQueue, Arc::new(DraftingDesk { author }));
        bus.subscribe_handler(Topic::DraftForPublishReview, Arc::new(DraftGate { evaluator }));
        bus.subscribe_handler(
            Topic::PublishQueue,
            Arc::new(PublishHandoff {
                publisher,
                outcomes: Arc::clone(&outcomes),
            }),
        );
        for topic in [
            Topic::IdeaRejected,
            Topic::BriefRejected,
            Topic::DraftRejected,
        ] {
            bus.subscribe_handler(
                topic,
                Arc::new(RejectionRecorder {
                    topic,
                    outcomes: Arc::clone(&outcomes),
                }),
            );
        }

        info!("Content pipeline wired");
        Self { bus, outcomes }
    }

    pub fn bus(&self) -> &Arc<Dispatcher> {
        &self.bus
    }

    /// Validate a submission and run it to a terminal topic.
    ///
    /// Returns once the whole chain has settled. Invalid submissions never
    /// reach the bus.
    pub fn submit(&self, submission: IdeaSubmission) -> crate::error::Result<Outcome> {
        let idea = submission.into_idea()?;
        let message_id = idea.id;
        info!(
            message_id = %message_id,
            title = %idea.title,
            persona = %idea.persona,
            "Idea submitted"
        );

        self.outcomes.expect(message_id);
        if let Err(e) = self.bus.publish(Topic::IdeaQueue, ContentMessage::Idea(idea)) {
            self.outcomes.take(message_id);
            return Err(e.into());
        }

        self.outcomes
            .take(message_id)
            .ok_or_else(|| Error::from(PipelineError::Unsettled { message_id }))
    }
}

// ── Gates ───────────────────────────────────────────────────────────

struct IdeaGate {
    evaluator: Arc<PolicyEvaluator>,
}

impl Handler for IdeaGate {
    fn handle(&self, bus: &Dispatcher, payload: &Payload) -> Result<(), PipelineError> {
        let ContentMessage::Idea(idea) = content(Topic::IdeaQueue, payload)? else {
            return Err(unexpected(Topic::IdeaQueue, payload));
        };

        let verdict = self.evaluator.evaluate_idea(&idea.raw_idea, &idea.persona);
        if !verdict.passed {
            return reject(bus, Topic::IdeaRejected, idea.id, &verdict);
        }

        let brief = idea.clone().into_brief(verdict.analysis);
        bus.publish(Topic::BriefReady, ContentMessage::Brief(brief))?;
        Ok(())
    }
}

/// Moves a fresh brief into review.
struct BriefIntake;

impl Handler for BriefIntake {
    fn handle(&self, bus: &Dispatcher, payload: &Payload) -> Result<(), PipelineError> {
        let message = content(Topic::BriefReady, payload)?;
        if message.stage() != Stage::Brief {
            return Err(unexpected(Topic::BriefReady, payload));
        }
        bus.publish(Topic::BriefForReview, message.clone())?;
        Ok(())
    }
}

struct BriefGate {
    evaluator: Arc<PolicyEvaluator>,
    author: Arc<dyn ContentAuthor>,
}

impl Handler for BriefGate {
    fn handle(&self, bus: &Dispatcher, payload: &Payload) -> Result<(), PipelineError> {
        let ContentMessage::Brief(brief) = content(Topic::BriefForReview, payload)? else {
            return Err(unexpected(Topic::BriefForReview, payload));
        };

        let verdict = self
            .evaluator
            .evaluate_brief(&brief.idea.brief_text(), &brief.idea.persona);
        if !verdict.passed {
            return reject(bus, Topic::BriefRejected, brief.idea.id, &verdict);
        }

        let approved_text = self.author.compose_brief(brief);
        let approved = ContentMessage::BriefValidated(
            brief.clone().approve(verdict.analysis, approved_text),
        );
        bus.publish(Topic::BriefApproved, approved.clone())?;
        bus.publish(Topic::CpaWorkQueue, approved)?;
        Ok(())
    }
}

struct BriefApprovalAudit;

impl Handler for BriefApprovalAudit {
    fn handle(&self, _bus: &Dispatcher, payload: &Payload) -> Result<(), PipelineError> {
        let ContentMessage::BriefValidated(approved) = content(Topic::BriefApproved, payload)?
        else {
            return Err(unexpected(Topic::BriefApproved, payload));
        };
        info!(
            message_id = %approved.idea().id,
            anchors = approved.brief.analysis.anchor_count(),
            "Brief approved"
        );
        Ok(())
    }
}

/// Picks approved briefs off the work queue and submits the draft for review.
struct DraftingDesk {
    author: Arc<dyn ContentAuthor>,
}

impl Handler for DraftingDesk {
    fn handle(&self, bus: &Dispatcher, payload: &Payload) -> Result<(), PipelineError> {
        let ContentMessage::BriefValidated(approved) = content(Topic::CpaWorkQueue, payload)?
        else {
            return Err(unexpected(Topic::CpaWorkQueue, payload));
        };

        let body = self.author.write_draft(approved);
        debug!(
            message_id = %approved.idea().id,
            chars = body.content.len(),
            "Draft written"
        );
        let draft = approved.clone().into_draft(body);
        bus.publish(Topic::DraftForPublishReview, ContentMessage::Draft(draft))?;
        Ok(())
    }
}

/// Terminal gate. Re-runs every check on the draft as written.
struct DraftGate {
    evaluator: Arc<PolicyEvaluator>,
}

impl Handler for DraftGate {
    fn handle(&self, bus: &Dispatcher, payload: &Payload) -> Result<(), PipelineError> {
        let ContentMessage::Draft(draft) = content(Topic::DraftForPublishReview, payload)? else {
            return Err(unexpected(Topic::DraftForPublishReview, payload));
        };

        let idea = draft.idea();
        let verdict = self
            .evaluator
            .evaluate_draft(&draft.draft_content, &idea.persona);
        if !verdict.passed {
            return reject(bus, Topic::DraftRejected, idea.id, &verdict);
        }

        let ready = draft.clone().finalize(verdict.analysis);
        bus.publish(Topic::PublishQueue, ContentMessage::Final(ready))?;
        Ok(())
    }
}

// ── Terminal handlers ───────────────────────────────────────────────

struct PublishHandoff {
    publisher: Arc<dyn Publisher>,
    outcomes: Arc<OutcomeBoard>,
}

impl Handler for PublishHandoff {
    fn handle(&self, _bus: &Dispatcher, payload: &Payload) -> Result<(), PipelineError> {
        let ContentMessage::Final(ready) = content(Topic::PublishQueue, payload)? else {
            return Err(unexpected(Topic::PublishQueue, payload));
        };

        info!(
            message_id = %ready.idea().id,
            publisher = self.publisher.name(),
            "Handing off to publisher"
        );
        if let Err(e) = self.publisher.publish(ready) {
            warn!(
                message_id = %ready.idea().id,
                publisher = self.publisher.name(),
                error = %e,
                "Publisher failed"
            );
        }
        self.outcomes.record(Outcome::Published(ready.clone()));
        Ok(())
    }
}

struct RejectionRecorder {
    topic: Topic,
    outcomes: Arc<OutcomeBoard>,
}

impl Handler for RejectionRecorder {
    fn handle(&self, _bus: &Dispatcher, payload: &Payload) -> Result<(), PipelineError> {
        let Some(record) = payload.as_rejection() else {
            return Err(unexpected(self.topic, payload));
        };
        info!(
            message_id = %record.original_message_id,
            stage = %record.stage,
            failed = ?record.failed_checks,
            reason = %record.reason,
            "Content rejected"
        );
        self.outcomes.record(Outcome::Rejected(record.clone()));
        Ok(())
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn content(topic: Topic, payload: &Payload) -> Result<&ContentMessage, PipelineError> {
    payload
        .as_content()
        .ok_or(PipelineError::UnexpectedRejection { topic })
}

fn unexpected(topic: Topic, payload: &Payload) -> PipelineError {
    match payload {
        Payload::Content(message) => PipelineError::UnexpectedStage {
            topic,
            actual: message.stage().to_string(),
        },
        Payload::Rejection(_) => PipelineError::UnexpectedRejection { topic },
    }
}

fn reject(
    bus: &Dispatcher,
    topic: Topic,
    message_id: Uuid,
    verdict: &Verdict,
) -> Result<(), PipelineError> {
    let record = RejectionRecord::from_verdict(message_id, verdict);
    bus.publish(topic, record)?;
    Ok(())
}
