//! Content policy ("firewall").
//!
//! 1. [`TextAnalyzer`] finds anchor, prohibited and pillar terms in text
//! 2. [`PolicyEvaluator`] turns a report plus a persona into a stage [`Verdict`]
//!
//! Both are pure. Nothing here touches the bus.

pub mod analyzer;
pub mod evaluator;
pub mod terms;

pub use analyzer::{AnalysisReport, TextAnalyzer};
pub use evaluator::{Check, CheckResults, PolicyEvaluator, PolicyStage, Verdict};
