use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::WorkflowError;

/// Outcome of a single check or of a whole gate, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    #[default]
    Passed,
    Warning,
    Failed,
    Blocked,
}

impl QualityLevel {
    /// Only passed and warning verdicts let a transition commit.
    pub fn allows_commit(&self) -> bool {
        matches!(self, QualityLevel::Passed | QualityLevel::Warning)
    }

    pub fn worst(self, other: QualityLevel) -> QualityLevel {
        self.max(other)
    }
}

impl std::fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QualityLevel::Passed => write!(f, "passed"),
            QualityLevel::Warning => write!(f, "warning"),
            QualityLevel::Failed => write!(f, "failed"),
            QualityLevel::Blocked => write!(f, "blocked"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub level: QualityLevel,
    #[serde(default)]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Result of evaluating every check attached to a target state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateVerdict {
    pub target: String,
    pub level: QualityLevel,
    #[serde(default)]
    pub checks: Vec<CheckResult>,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    pub checked_at: DateTime<Utc>,
}

impl GateVerdict {
    pub fn passed(&self) -> bool {
        self.level.allows_commit()
    }

    /// Convert a non-committing verdict into the matching error.
    pub fn into_result(self) -> Result<GateVerdict, WorkflowError> {
        match self.level {
            QualityLevel::Passed | QualityLevel::Warning => Ok(self),
            QualityLevel::Failed => Err(WorkflowError::GateFailed {
                target: self.target.clone(),
                verdict: self,
            }),
            QualityLevel::Blocked => Err(WorkflowError::GateBlocked {
                target: self.target.clone(),
                verdict: self,
            }),
        }
    }
}

/// Append-only entry in an entity's gate history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateRecord {
    pub target: String,
    pub level: QualityLevel,
    pub issues_count: usize,
    pub recommendations_count: usize,
    pub checked_at: DateTime<Utc>,
}

impl From<&GateVerdict> for GateRecord {
    fn from(verdict: &GateVerdict) -> Self {
        Self {
            target: verdict.target.clone(),
            level: verdict.level,
            issues_count: verdict.issues.len(),
            recommendations_count: verdict.recommendations.len(),
            checked_at: verdict.checked_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificationLevel {
    Full,
    Conditional,
    None,
}

impl CertificationLevel {
    pub fn from_level(level: QualityLevel) -> Self {
        match level {
            QualityLevel::Passed => CertificationLevel::Full,
            QualityLevel::Warning => CertificationLevel::Conditional,
            _ => CertificationLevel::None,
        }
    }
}

impl std::fmt::Display for CertificationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CertificationLevel::Full => write!(f, "full"),
            CertificationLevel::Conditional => write!(f, "conditional"),
            CertificationLevel::None => write!(f, "none"),
        }
    }
}

/// Immutable certificate issued by a final gate assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    pub id: String,
    pub story_id: String,
    pub level: CertificationLevel,
    pub issued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    pub story_id: String,
    pub verdict: GateVerdict,
    pub certification: CertificationLevel,
    pub final_approval: bool,
    pub certificate: Option<Certificate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub requirement: String,
    pub implementation_status: String,
    pub test_coverage: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceReport {
    pub story_id: String,
    /// `REQ_<story>_<n>` -> entry
    pub requirements: BTreeMap<String, TraceEntry>,
    pub gaps: Vec<String>,
    pub coverage_percentage: f64,
    pub traced_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NfrCategory {
    pub status: String,
    pub score: f64,
    #[serde(default)]
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NfrReport {
    pub story_id: String,
    pub categories: BTreeMap<String, NfrCategory>,
    pub overall_status: String,
    pub total_issues: usize,
    pub recommendations: Vec<String>,
    pub assessed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSection {
    pub score: f64,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewReport {
    pub story_id: String,
    pub sections: BTreeMap<String, ReviewSection>,
    pub overall_score: f64,
    pub grade: String,
    pub approved: bool,
    pub recommendations: Vec<String>,
    pub reviewed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateMetrics {
    pub gates_checked: u64,
    pub gates_passed: u64,
    pub gates_failed: u64,
    pub risk_assessments: u64,
    pub comprehensive_reviews: u64,
}
