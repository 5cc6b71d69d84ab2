//! Workflow configuration loaded from TOML.
//!
//! Every section is optional; a missing file or missing key falls back to
//! the defaults below.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "cadence.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub store: StoreConfig,
    pub gates: GateConfig,
    pub risk: RiskConfig,
    pub automation: AutomationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".cadence"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Overall review score needed for approval.
    pub approval_threshold: f64,
    /// Shorter descriptions trip the `unclear_scope` blocker.
    pub min_description_len: usize,
    /// Fewer criteria than this downgrade the check to a warning.
    pub min_acceptance_criteria: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            approval_threshold: 8.0,
            min_description_len: 50,
            min_acceptance_criteria: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub complexity_threshold: u8,
    pub dependency_threshold: u8,
    pub time_threshold: u8,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            complexity_threshold: 7,
            dependency_threshold: 5,
            time_threshold: 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    /// Maximum nesting of rule-triggered operations.
    pub max_depth: usize,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self { max_depth: 8 }
    }
}

impl WorkflowConfig {
    /// Load configuration from `path`, returning defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: WorkflowConfig = toml::from_str(content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let config = WorkflowConfig::load(&temp.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, WorkflowConfig::default());
        assert_eq!(config.gates.approval_threshold, 8.0);
        assert_eq!(config.automation.max_depth, 8);
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config = WorkflowConfig::parse(
            r#"
[gates]
min_description_len = 10

[risk]
time_threshold = 3
"#,
        )
        .unwrap();

        assert_eq!(config.gates.min_description_len, 10);
        assert_eq!(config.gates.min_acceptance_criteria, 2);
        assert_eq!(config.risk.time_threshold, 3);
        assert_eq!(config.risk.complexity_threshold, 7);
        assert_eq!(config.store.dir, PathBuf::from(".cadence"));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE);
        fs::write(&path, "[gates\napproval_threshold = ").unwrap();
        assert!(WorkflowConfig::load(&path).is_err());
    }
}
