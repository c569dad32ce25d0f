//! Built-in term lists and the persona allowlist.
//!
//! Entries are lower-case. Entries padded with spaces only match as a whole
//! word surrounded by spaces (`" aml "` must not fire inside "streamlined").

/// Vocabulary that places content inside life-sciences compliance.
pub const ANCHOR_TERMS: &[&str] = &[
    "fda",
    "21 cfr part 11",
    "annex 11",
    "csv",
    "computer software assurance",
    "validation",
    "gxp",
    "gmp",
    "gamp",
    "data integrity",
    "alcoa",
    "audit trail",
    " capa ",
    "qms",
    " ema ",
    "mhra",
    "ich q9",
    "ich q10",
    "iso 13485",
    "life sciences",
    "pharmaceutical",
    "medical device",
];

/// Out-of-domain regulatory vocabulary. Any hit vetoes the content.
pub const PROHIBITED_TERMS: &[&str] = &[
    "sox",
    "sarbanes-oxley",
    " sec ",
    "securities",
    "doj",
    " aml ",
    "anti-money laundering",
    "kyc",
    "finra",
    "fcpa",
    "dodd-frank",
    "insider trading",
    "pci dss",
];

/// Value-proposition language the content must reinforce.
pub const PILLAR_PHRASES: &[&str] = &[
    "save time",
    "saving time",
    "saves time",
    "reduce documentation burden",
    "reducing documentation burden",
    "reduces documentation burden",
    "audit-ready",
    "audit ready",
    "inspection-ready",
    "inspection ready",
    "streamline",
    "lower validation cost",
    "risk-based",
];

/// Personas content may be written for.
pub const VALID_PERSONAS: &[&str] = &[
    "Validation Strategist",
    "Quality Assurance Director",
    "Regulatory Affairs Lead",
    "IT Compliance Manager",
];

/// Distinct anchors required before content counts as on-domain.
pub const MIN_ANCHOR_TERMS: usize = 2;

/// Collect a constant list into owned strings.
pub fn owned(terms: &[&str]) -> Vec<String> {
    terms.iter().map(|t| t.to_string()).collect()
}
