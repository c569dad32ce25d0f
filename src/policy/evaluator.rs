//! Policy evaluator: per-stage pass/fail verdicts with itemized checks.
//!
//! Evaluation is total: every call returns a [`Verdict`], however bad the
//! input. Callers validate required fields before they get here.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::PolicyConfig;
use crate::policy::analyzer::{AnalysisReport, TextAnalyzer};

/// Lifecycle stage a verdict was produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyStage {
    Idea,
    Brief,
    Draft,
}

impl PolicyStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idea => "idea",
            Self::Brief => "brief",
            Self::Draft => "draft",
        }
    }

    /// Whether the pillar check gates this stage. Raw ideas are too short to
    /// carry value-proposition language.
    pub fn requires_pillars(&self) -> bool {
        !matches!(self, Self::Idea)
    }
}

impl fmt::Display for PolicyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Names of the individual policy checks, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Check {
    AudienceLock,
    DomainAnchors,
    ProhibitedTerms,
    PersonaLock,
    Pillars,
}

impl Check {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AudienceLock => "AUDIENCE_LOCK",
            Self::DomainAnchors => "DOMAIN_ANCHORS",
            Self::ProhibitedTerms => "PROHIBITED_TERMS",
            Self::PersonaLock => "PERSONA_LOCK",
            Self::Pillars => "PILLARS",
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of each check. `pillars` is always computed but only gates the
/// brief and draft stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResults {
    pub audience_lock: bool,
    pub domain_anchors: bool,
    pub prohibited_terms: bool,
    pub persona_lock: bool,
    pub pillars: bool,
}

/// Structured result of evaluating one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub passed: bool,
    pub stage: PolicyStage,
    pub analysis: AnalysisReport,
    pub checks: CheckResults,
    pub failed_checks: Vec<Check>,
    pub summary: String,
}

/// Stateless evaluator over a fixed policy.
#[derive(Debug, Clone)]
pub struct PolicyEvaluator {
    analyzer: TextAnalyzer,
    personas: Vec<String>,
    min_anchors: usize,
}

impl PolicyEvaluator {
    pub fn new(policy: &PolicyConfig) -> Self {
        Self {
            analyzer: TextAnalyzer::new(policy),
            personas: policy.personas.clone(),
            min_anchors: policy.min_anchors,
        }
    }

    /// Analyzer backing this evaluator.
    pub fn analyzer(&self) -> &TextAnalyzer {
        &self.analyzer
    }

    /// Gate a raw idea. Pillars are not required.
    pub fn evaluate_idea(&self, raw_idea: &str, persona: &str) -> Verdict {
        self.evaluate(PolicyStage::Idea, raw_idea, persona)
    }

    /// Gate a brief. `text` is the title followed by the raw idea.
    pub fn evaluate_brief(&self, text: &str, persona: &str) -> Verdict {
        self.evaluate(PolicyStage::Brief, text, persona)
    }

    /// Final gate before publishing. Re-runs every check on the draft text.
    pub fn evaluate_draft(&self, draft: &str, persona: &str) -> Verdict {
        self.evaluate(PolicyStage::Draft, draft, persona)
    }

    /// Evaluate `text` for `stage`.
    pub fn evaluate(&self, stage: PolicyStage, text: &str, persona: &str) -> Verdict {
        let analysis = self.analyzer.analyze(text);

        // Audience and domain anchoring are the same rule today.
        let anchored = analysis.anchor_count() >= self.min_anchors;
        let checks = CheckResults {
            audience_lock: anchored,
            domain_anchors: anchored,
            prohibited_terms: !analysis.has_prohibited(),
            persona_lock: self.is_valid_persona(persona),
            pillars: analysis.has_pillar(),
        };

        let mut failed_checks = Vec::new();
        if !checks.audience_lock {
            failed_checks.push(Check::AudienceLock);
        }
        if !checks.domain_anchors {
            failed_checks.push(Check::DomainAnchors);
        }
        if !checks.prohibited_terms {
            failed_checks.push(Check::ProhibitedTerms);
        }
        if !checks.persona_lock {
            failed_checks.push(Check::PersonaLock);
        }
        if stage.requires_pillars() && !checks.pillars {
            failed_checks.push(Check::Pillars);
        }

        let passed = failed_checks.is_empty();
        let summary = self.summarize(stage, &analysis, &failed_checks, persona);

        debug!(
            stage = %stage,
            passed,
            anchors = analysis.anchor_count(),
            failed = ?failed_checks,
            "Policy verdict"
        );

        Verdict {
            passed,
            stage,
            analysis,
            checks,
            failed_checks,
            summary,
        }
    }

    fn is_valid_persona(&self, persona: &str) -> bool {
        let persona = persona.trim();
        self.personas.iter().any(|p| p == persona)
    }

    fn summarize(
        &self,
        stage: PolicyStage,
        analysis: &AnalysisReport,
        failed: &[Check],
        persona: &str,
    ) -> String {
        if failed.is_empty() {
            return format!(
                "{stage} checks passed: {} anchors, {} pillars",
                analysis.anchor_count(),
                analysis.matched_pillars.len()
            );
        }

        let mut reasons = Vec::new();
        if failed.contains(&Check::AudienceLock) || failed.contains(&Check::DomainAnchors) {
            reasons.push(format!(
                "found {} of {} required domain anchors",
                analysis.anchor_count(),
                self.min_anchors
            ));
        }
        if failed.contains(&Check::ProhibitedTerms) {
            let terms: Vec<&str> = analysis
                .matched_prohibited
                .iter()
                .map(String::as_str)
                .collect();
            reasons.push(format!("prohibited terms present: {}", terms.join(", ")));
        }
        if failed.contains(&Check::PersonaLock) {
            reasons.push(format!("persona {persona:?} is not an approved persona"));
        }
        if failed.contains(&Check::Pillars) {
            reasons.push("no pillar phrase present".to_string());
        }

        let names: Vec<&str> = failed.iter().map(Check::as_str).collect();
        format!(
            "{stage} checks failed [{}]: {}",
            names.join(", "),
            reasons.join("; ")
        )
    }
}

impl Default for PolicyEvaluator {
    fn default() -> Self {
        Self::new(&PolicyConfig::default())
    }
}
