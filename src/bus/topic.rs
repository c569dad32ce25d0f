//! The closed set of bus topics.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Every channel on the bus. The set is fixed at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Topic {
    IdeaQueue,
    IdeaRejected,
    BriefReady,
    BriefForReview,
    BriefRejected,
    BriefApproved,
    CpaWorkQueue,
    DraftForPublishReview,
    DraftRejected,
    PublishQueue,
}

/// What a topic carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    Content,
    Rejection,
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Content => f.write_str("content"),
            Self::Rejection => f.write_str("rejection"),
        }
    }
}

impl Topic {
    /// All topics in pipeline order.
    pub const ALL: [Topic; 10] = [
        Topic::IdeaQueue,
        Topic::IdeaRejected,
        Topic::BriefReady,
        Topic::BriefForReview,
        Topic::BriefRejected,
        Topic::BriefApproved,
        Topic::CpaWorkQueue,
        Topic::DraftForPublishReview,
        Topic::DraftRejected,
        Topic::PublishQueue,
    ];

    /// Wire name, as written to the log.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IdeaQueue => "idea-queue",
            Self::IdeaRejected => "idea-rejected",
            Self::BriefReady => "brief-ready",
            Self::BriefForReview => "brief-for-review",
            Self::BriefRejected => "brief-rejected",
            Self::BriefApproved => "brief-approved",
            Self::CpaWorkQueue => "cpa-work-queue",
            Self::DraftForPublishReview => "draft-for-publish-review",
            Self::DraftRejected => "draft-rejected",
            Self::PublishQueue => "publish-queue",
        }
    }

    /// Payload type this topic accepts.
    pub fn payload_kind(&self) -> PayloadKind {
        if self.is_rejection() {
            PayloadKind::Rejection
        } else {
            PayloadKind::Content
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::IdeaRejected | Self::BriefRejected | Self::DraftRejected
        )
    }

    /// Topics where a message stops moving through the pipeline.
    pub fn is_terminal(&self) -> bool {
        self.is_rejection() || matches!(self, Self::PublishQueue)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown topic name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown topic: {0}")]
pub struct UnknownTopic(pub String);

impl FromStr for Topic {
    type Err = UnknownTopic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Topic::ALL
            .into_iter()
            .find(|t| t.as_str() == name)
            .ok_or_else(|| UnknownTopic(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_parse_back() {
        for topic in Topic::ALL {
            assert_eq!(topic.as_str().parse::<Topic>().unwrap(), topic);
        }
        assert!("brief-queue".parse::<Topic>().is_err());
    }

    #[test]
    fn serde_uses_wire_names() {
        for topic in Topic::ALL {
            let json = serde_json::to_value(topic).unwrap();
            assert_eq!(json, topic.as_str());
        }
    }

    #[test]
    fn rejection_topics_carry_rejections() {
        let rejections: Vec<Topic> = Topic::ALL
            .into_iter()
            .filter(|t| t.payload_kind() == PayloadKind::Rejection)
            .collect();
        assert_eq!(
            rejections,
            vec![Topic::IdeaRejected, Topic::BriefRejected, Topic::DraftRejected]
        );
    }

    #[test]
    fn terminal_topics() {
        let terminal: Vec<Topic> = Topic::ALL.into_iter().filter(Topic::is_terminal).collect();
        assert_eq!(terminal.len(), 4);
        assert!(terminal.contains(&Topic::PublishQueue));
        assert!(!Topic::BriefApproved.is_terminal());
    }
}
