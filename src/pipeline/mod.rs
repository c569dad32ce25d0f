//! Content pipeline: idea → brief → draft → publish.
//!
//! Every transition goes through the dispatcher:
//! 1. `IdeaSubmission::into_idea()` validates input at the entry point
//! 2. Stage gates run `PolicyEvaluator` on the text in front of them
//! 3. Passing content moves forward; failing content becomes a `RejectionRecord`
//! 4. Terminal handlers settle an `Outcome` for the caller
//!
//! **Nothing reaches `publish-queue` without passing the draft gate.**

pub mod author;
pub mod publisher;
pub mod stages;
pub mod submission;
pub mod types;

pub use author::{ContentAuthor, TemplateAuthor};
pub use publisher::{LogPublisher, Publisher, RecordingPublisher};
pub use stages::Pipeline;
pub use submission::{IdeaSubmission, Outcome, OutcomeBoard};
pub use types::{
    ApprovedBrief, Brief, ContentMessage, Draft, DraftBody, Idea, PublishReady, RejectionRecord,
    Stage,
};
