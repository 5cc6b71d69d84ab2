//! Quality Gate Engine
//!
//! Decides whether a story or project may enter a gate-bearing state and
//! produces the QA reports (risk, test strategy, tracing, NFR, review,
//! certification) later gates consume.

mod checks;
mod engine;
mod reports;
mod risk;
mod types;

pub use checks::{gate_spec, BlockingIssue, Check, GateSpec};
pub use engine::{GateCommand, GateOutcome, QualityGateEngine};
pub use reports::grade;
pub use risk::{KeywordRiskScorer, RiskScorer, RiskScores};
pub use types::{
    Certificate, CertificationLevel, CheckResult, GateMetrics, GateRecord, GateVerdict,
    NfrCategory, NfrReport, QualityAssessment, QualityLevel, ReviewReport, ReviewSection,
    TraceEntry, TraceReport,
};
