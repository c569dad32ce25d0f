//! Text analyzer: literal, case-insensitive term matching.
//!
//! The analyzer holds no state between calls. Every stage re-runs it on the
//! text in front of it, so a report always describes the current text.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::PolicyConfig;

/// Terms found in a piece of text.
///
/// Entries are reported trimmed (`" aml "` is reported as `"aml"`), once per
/// distinct term, in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub matched_anchors: BTreeSet<String>,
    pub matched_prohibited: BTreeSet<String>,
    pub matched_pillars: BTreeSet<String>,
}

impl AnalysisReport {
    /// Number of distinct anchor terms found.
    pub fn anchor_count(&self) -> usize {
        self.matched_anchors.len()
    }

    /// True when any prohibited term was found.
    pub fn has_prohibited(&self) -> bool {
        !self.matched_prohibited.is_empty()
    }

    /// True when at least one pillar phrase was found.
    pub fn has_pillar(&self) -> bool {
        !self.matched_pillars.is_empty()
    }
}

/// Substring matcher over the three configured term lists.
#[derive(Debug, Clone)]
pub struct TextAnalyzer {
    anchors: Vec<String>,
    prohibited: Vec<String>,
    pillars: Vec<String>,
}

impl TextAnalyzer {
    /// Build an analyzer over the policy's term lists.
    pub fn new(policy: &PolicyConfig) -> Self {
        Self {
            anchors: policy.anchors.clone(),
            prohibited: policy.prohibited.clone(),
            pillars: policy.pillars.clone(),
        }
    }

    /// Match every term list against `text`.
    pub fn analyze(&self, text: &str) -> AnalysisReport {
        let haystack = text.to_lowercase();
        AnalysisReport {
            matched_anchors: find_terms(&haystack, &self.anchors),
            matched_prohibited: find_terms(&haystack, &self.prohibited),
            matched_pillars: find_terms(&haystack, &self.pillars),
        }
    }
}

impl Default for TextAnalyzer {
    fn default() -> Self {
        Self::new(&PolicyConfig::default())
    }
}

fn find_terms(haystack: &str, terms: &[String]) -> BTreeSet<String> {
    terms
        .iter()
        .filter(|term| !term.trim().is_empty() && haystack.contains(term.as_str()))
        .map(|term| term.trim().to_string())
        .collect()
}
