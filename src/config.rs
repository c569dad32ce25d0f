//! Configuration types.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::policy::terms;

/// Retention bound for the message log.
pub const DEFAULT_LOG_CAPACITY: usize = 500;

/// Where the message log is written when nothing else is configured.
pub const DEFAULT_LOG_PATH: &str = "./data/message-log.json";

/// Runtime configuration for the dispatcher and its log.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// JSON file holding the persisted message log.
    pub log_path: PathBuf,
    /// Most recent envelopes kept in memory and on disk.
    pub log_capacity: usize,
    /// Optional JSON file overriding the built-in policy terms.
    pub policy_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            log_capacity: DEFAULT_LOG_CAPACITY,
            policy_path: None,
        }
    }
}

impl PipelineConfig {
    /// Build from environment variables, falling back to defaults.
    ///
    /// - `GOVERNANCE_LOG_PATH`
    /// - `GOVERNANCE_LOG_CAPACITY` (must be a positive integer)
    /// - `GOVERNANCE_POLICY_PATH`
    pub fn from_env() -> Result<Self, ConfigError> {
        let log_path = std::env::var("GOVERNANCE_LOG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_LOG_PATH));

        let log_capacity = match std::env::var("GOVERNANCE_LOG_CAPACITY") {
            Ok(raw) => parse_capacity(&raw)?,
            Err(_) => DEFAULT_LOG_CAPACITY,
        };

        let policy_path = std::env::var("GOVERNANCE_POLICY_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            log_path,
            log_capacity,
            policy_path,
        })
    }
}

fn parse_capacity(raw: &str) -> Result<usize, ConfigError> {
    match raw.trim().parse::<usize>() {
        Ok(0) | Err(_) => Err(ConfigError::InvalidValue {
            key: "GOVERNANCE_LOG_CAPACITY".to_string(),
            message: format!("expected a positive integer, got {raw:?}"),
        }),
        Ok(n) => Ok(n),
    }
}

/// Term lists and persona allowlist used by the policy evaluator.
///
/// Loaded once at startup and shared read-only afterwards.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyConfig {
    pub personas: Vec<String>,
    pub anchors: Vec<String>,
    pub prohibited: Vec<String>,
    pub pillars: Vec<String>,
    pub min_anchors: usize,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            personas: terms::owned(terms::VALID_PERSONAS),
            anchors: terms::owned(terms::ANCHOR_TERMS),
            prohibited: terms::owned(terms::PROHIBITED_TERMS),
            pillars: terms::owned(terms::PILLAR_PHRASES),
            min_anchors: terms::MIN_ANCHOR_TERMS,
        }
    }
}

impl PolicyConfig {
    /// Read a JSON override file. Fields left out keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::PolicyRead {
            path: path.to_path_buf(),
            source,
        })?;
        let policy = Self::from_json(&raw).map_err(|source| ConfigError::PolicyParse {
            path: path.to_path_buf(),
            source,
        })?;
        policy.validate()?;
        Ok(policy)
    }

    /// Reject overrides that would let any text through the anchor checks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_anchors == 0 {
            return Err(ConfigError::InvalidValue {
                key: "minAnchors".to_string(),
                message: "expected a positive integer, got 0".to_string(),
            });
        }
        Ok(())
    }

    /// Resolve the policy for a pipeline config: the override file if one is
    /// set, the built-in lists otherwise.
    pub fn resolve(config: &PipelineConfig) -> Result<Self, ConfigError> {
        match &config.policy_path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let mut policy: Self = serde_json::from_str(raw)?;
        // Submitted personas are trimmed before comparison.
        for persona in policy.personas.iter_mut() {
            *persona = persona.trim().to_string();
        }
        // Matching is case-insensitive against lower-cased text.
        for list in [
            &mut policy.anchors,
            &mut policy.prohibited,
            &mut policy.pillars,
        ] {
            for term in list.iter_mut() {
                *term = term.to_lowercase();
            }
        }
        Ok(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_pipeline_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.log_capacity, 500);
        assert_eq!(config.log_path, PathBuf::from(DEFAULT_LOG_PATH));
        assert!(config.policy_path.is_none());
    }

    #[test]
    fn capacity_must_be_positive() {
        assert!(parse_capacity("0").is_err());
        assert!(parse_capacity("lots").is_err());
        assert_eq!(parse_capacity(" 42 ").unwrap(), 42);
    }

    #[test]
    fn default_policy_uses_builtin_lists() {
        let policy = PolicyConfig::default();
        assert_eq!(policy.min_anchors, 2);
        assert!(policy.personas.iter().any(|p| p == "Validation Strategist"));
        assert!(policy.prohibited.iter().any(|t| t == " aml "));
    }

    #[test]
    fn partial_override_keeps_defaults() {
        let policy =
            PolicyConfig::from_json(r#"{"personas": ["Lab Manager"], "pillars": ["Go Faster"]}"#)
                .unwrap();
        assert_eq!(policy.personas, vec!["Lab Manager".to_string()]);
        assert_eq!(policy.pillars, vec!["go faster".to_string()]);
        assert_eq!(policy.anchors, terms::owned(terms::ANCHOR_TERMS));
        assert_eq!(policy.min_anchors, 2);
    }

    #[test]
    fn load_reports_bad_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("policy.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = PolicyConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::PolicyParse { .. }));
    }

    #[test]
    fn override_personas_are_trimmed() {
        let policy = PolicyConfig::from_json(r#"{"personas": [" Lab Manager "]}"#).unwrap();
        assert_eq!(policy.personas, vec!["Lab Manager".to_string()]);
    }

    #[test]
    fn load_rejects_zero_min_anchors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("policy.json");
        std::fs::write(&path, r#"{"minAnchors": 0}"#).unwrap();
        match PolicyConfig::load(&path) {
            Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, "minAnchors"),
            other => panic!("expected invalid minAnchors, got {other:?}"),
        }

        std::fs::write(&path, r#"{"minAnchors": 3}"#).unwrap();
        assert_eq!(PolicyConfig::load(&path).unwrap().min_anchors, 3);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = PolicyConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::PolicyRead { .. }));
    }
}
