use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::checks::gate_spec;
use super::reports;
use super::risk::{build_profile, KeywordRiskScorer, RiskScorer};
use super::types::{
    Certificate, CertificationLevel, CheckResult, GateMetrics, GateRecord, GateVerdict,
    NfrReport, QualityAssessment, QualityLevel, ReviewReport, TraceReport,
};
use crate::config::{GateConfig, RiskConfig, WorkflowConfig};
use crate::error::WorkflowError;
use crate::models::project::ProjectContext;
use crate::models::roles::Role;
use crate::models::state::{ProjectState, StoryState};
use crate::models::story::{RiskProfile, StoryContext, TestStrategy};

/// QA commands the gate engine can run against a story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateCommand {
    Risk,
    Design,
    Trace,
    Nfr,
    Review,
    Gate,
    /// Every command above, in order.
    Comprehensive,
}

impl GateCommand {
    pub const SEQUENCE: [GateCommand; 6] = [
        GateCommand::Risk,
        GateCommand::Design,
        GateCommand::Trace,
        GateCommand::Nfr,
        GateCommand::Review,
        GateCommand::Gate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GateCommand::Risk => "risk",
            GateCommand::Design => "design",
            GateCommand::Trace => "trace",
            GateCommand::Nfr => "nfr",
            GateCommand::Review => "review",
            GateCommand::Gate => "gate",
            GateCommand::Comprehensive => "comprehensive",
        }
    }
}

impl std::fmt::Display for GateCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for GateCommand {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().trim_start_matches('*').to_lowercase();
        GateCommand::SEQUENCE
            .into_iter()
            .chain([GateCommand::Comprehensive])
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| WorkflowError::CommandNotAllowed {
                role: Role::Qa,
                command: s.to_string(),
                allowed: Role::Qa.commands().iter().map(|c| c.to_string()).collect(),
            })
    }
}

/// Report produced by a gate command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "report", rename_all = "lowercase")]
pub enum GateOutcome {
    Risk(RiskProfile),
    Design(TestStrategy),
    Trace(TraceReport),
    Nfr(NfrReport),
    Review(ReviewReport),
    Gate(QualityAssessment),
    Comprehensive(Vec<GateOutcome>),
}

impl GateOutcome {
    /// One-line summary for logs and session bookkeeping.
    pub fn summary(&self) -> String {
        match self {
            GateOutcome::Risk(p) => format!("Risk assessment completed: {} risk level", p.level),
            GateOutcome::Design(s) => {
                format!("Test strategy designed with {} scenarios", s.scenarios.len())
            }
            GateOutcome::Trace(t) => {
                format!("Requirements tracing completed - {} gaps identified", t.gaps.len())
            }
            GateOutcome::Nfr(n) => format!("NFR assessment completed - {}", n.overall_status),
            GateOutcome::Review(r) => format!(
                "Comprehensive review completed - Score: {:.1}/10.0 ({})",
                r.overall_score, r.grade
            ),
            GateOutcome::Gate(a) => {
                format!("Quality gate assessment: {} certification", a.certification)
            }
            GateOutcome::Comprehensive(all) => format!("Ran {} quality commands", all.len()),
        }
    }

    /// Pass/fail for commands that decide something; `None` for pure reports.
    pub fn approved(&self) -> Option<bool> {
        match self {
            GateOutcome::Review(r) => Some(r.approved),
            GateOutcome::Gate(a) => Some(a.final_approval),
            GateOutcome::Comprehensive(all) => all
                .iter()
                .filter_map(GateOutcome::approved)
                .reduce(|a, b| a && b),
            _ => None,
        }
    }
}

/// Evaluates gates and produces QA reports.
///
/// Verdicts are computed without touching the story; the `&mut` entry points
/// only append history, notes and reports, never the story's state.
pub struct QualityGateEngine {
    gates: GateConfig,
    risk: RiskConfig,
    scorer: Box<dyn RiskScorer>,
    metrics: GateMetrics,
}

impl QualityGateEngine {
    pub fn new(config: &WorkflowConfig) -> Self {
        Self {
            gates: config.gates.clone(),
            risk: config.risk.clone(),
            scorer: Box::new(KeywordRiskScorer),
            metrics: GateMetrics::default(),
        }
    }

    pub fn with_scorer(mut self, scorer: Box<dyn RiskScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn metrics(&self) -> &GateMetrics {
        &self.metrics
    }

    /// Compute the verdict for moving `story` into `target` without recording it.
    pub fn evaluate(&self, story: &StoryContext, target: StoryState) -> GateVerdict {
        let spec = gate_spec(target);
        let mut level = QualityLevel::Passed;
        let mut checks = Vec::new();
        let mut issues = Vec::new();
        let mut recommendations = Vec::new();

        for check in spec.required {
            let result = match check.evaluate(story, &self.gates) {
                Ok(result) => result,
                Err(e) => {
                    warn!(story_id = %story.id, check = check.name(), "Check errored: {e:#}");
                    CheckResult {
                        name: check.name().to_string(),
                        level: QualityLevel::Warning,
                        optional: false,
                        message: Some(format!("Check {} errored: {e}", check.name())),
                    }
                }
            };

            level = level.worst(result.level);
            if result.level != QualityLevel::Passed {
                if let Some(message) = &result.message {
                    issues.push(message.clone());
                }
            }
            if result.level == QualityLevel::Failed {
                recommendations.push(check.recommendation());
            }
            checks.push(result);
        }

        for check in spec.optional {
            let result = match check.evaluate(story, &self.gates) {
                Ok(result) => result,
                Err(e) => {
                    warn!(story_id = %story.id, check = check.name(), "Optional check errored: {e:#}");
                    CheckResult {
                        name: check.name().to_string(),
                        level: QualityLevel::Warning,
                        optional: true,
                        message: Some(format!("Check {} errored: {e}", check.name())),
                    }
                }
            };
            if result.level == QualityLevel::Failed {
                recommendations.push(format!(
                    "Consider addressing optional check: {}",
                    check.name()
                ));
            }
            checks.push(CheckResult {
                optional: true,
                ..result
            });
        }

        for issue in spec.blocking {
            if issue.detected(story, &self.gates) {
                level = QualityLevel::Blocked;
                issues.push(format!("Blocking issue detected: {}", issue.name()));
            }
        }

        GateVerdict {
            target: target.to_string(),
            level,
            checks,
            issues,
            recommendations,
            checked_at: Utc::now(),
        }
    }

    /// Evaluate the gate for `target` and append the result to the story's history.
    pub fn check_gates(&mut self, story: &mut StoryContext, target: StoryState) -> GateVerdict {
        let verdict = self.evaluate(story, target);
        story.record_gate(GateRecord::from(&verdict));
        self.count(&verdict);
        info!(
            story_id = %story.id,
            target = %target,
            level = %verdict.level,
            issues = verdict.issues.len(),
            "Quality gate checked"
        );
        verdict
    }

    /// Project-level gate. Only `completed` carries a check: every linked story
    /// must itself be completed.
    pub fn check_project_gates(
        &mut self,
        project: &mut ProjectContext,
        target: ProjectState,
    ) -> GateVerdict {
        let mut verdict = GateVerdict {
            target: target.to_string(),
            level: QualityLevel::Passed,
            checks: Vec::new(),
            issues: Vec::new(),
            recommendations: Vec::new(),
            checked_at: Utc::now(),
        };

        if target == ProjectState::Completed {
            let open = project
                .stories
                .iter()
                .filter(|s| s.state != StoryState::Completed)
                .count();
            let (level, message) = if project.stories.is_empty() {
                (QualityLevel::Warning, Some("Project has no stories".to_string()))
            } else if open > 0 {
                (QualityLevel::Failed, Some(format!("{open} stories not completed")))
            } else {
                (QualityLevel::Passed, None)
            };

            if let Some(message) = &message {
                verdict.issues.push(message.clone());
            }
            if level == QualityLevel::Failed {
                verdict
                    .recommendations
                    .push("Complete or remove open stories".to_string());
            }
            verdict.level = level;
            verdict.checks.push(CheckResult {
                name: "stories_completed".to_string(),
                level,
                optional: false,
                message,
            });
        }

        project.record_gate(GateRecord::from(&verdict));
        self.count(&verdict);
        info!(project_id = %project.id, target = %target, level = %verdict.level, "Project gate checked");
        verdict
    }

    pub fn risk_assessment(&mut self, story: &mut StoryContext) -> RiskProfile {
        let scores = self.scorer.score(story);
        let profile = build_profile(story, scores, &self.risk);
        story.risk_profile = Some(profile.clone());
        story.add_agent_note(
            Role::Qa,
            format!("Risk assessment completed: {} risk level", profile.level),
        );
        self.metrics.risk_assessments += 1;
        info!(story_id = %story.id, level = %profile.level, "Risk assessment");
        profile
    }

    pub fn design_test_strategy(&mut self, story: &mut StoryContext) -> TestStrategy {
        let strategy = reports::test_strategy(story);
        story.test_strategy = Some(strategy.clone());
        story.add_agent_note(Role::Qa, "Test strategy designed and documented");
        info!(story_id = %story.id, scenarios = strategy.scenarios.len(), "Test strategy designed");
        strategy
    }

    pub fn trace_requirements(&mut self, story: &mut StoryContext) -> TraceReport {
        let report = reports::trace_requirements(story);
        store_report(story, "requirements_tracing", &report);
        story.add_agent_note(
            Role::Qa,
            format!(
                "Requirements tracing completed - {} gaps identified",
                report.gaps.len()
            ),
        );
        report
    }

    pub fn check_nfr(&mut self, story: &mut StoryContext) -> NfrReport {
        let report = reports::check_nfr(story);
        store_report(story, "nfr_assessment", &report);
        story.add_agent_note(
            Role::Qa,
            format!("NFR assessment completed - {} issues identified", report.total_issues),
        );
        report
    }

    pub fn comprehensive_review(&mut self, story: &mut StoryContext) -> ReviewReport {
        let report = reports::comprehensive_review(story, self.gates.approval_threshold);
        store_report(story, "comprehensive_review", &report);
        story.add_agent_note(
            Role::Qa,
            format!(
                "Comprehensive review completed - Score: {:.1}/10.0",
                report.overall_score
            ),
        );
        self.metrics.comprehensive_reviews += 1;
        info!(story_id = %story.id, grade = %report.grade, "Comprehensive review");
        report
    }

    /// Final assessment: rerun the `completed` gate and certify on success.
    pub fn quality_gate_assessment(&mut self, story: &mut StoryContext) -> QualityAssessment {
        let verdict = self.check_gates(story, StoryState::Completed);
        let certification = CertificationLevel::from_level(verdict.level);
        let final_approval = certification != CertificationLevel::None;

        let certificate = final_approval.then(|| Certificate {
            id: format!("QC-{}-{}", story.id, Utc::now().format("%Y%m%d%H%M%S")),
            story_id: story.id.clone(),
            level: certification,
            issued_at: Utc::now(),
        });
        if let Some(certificate) = &certificate {
            story.certificate = Some(certificate.clone());
        }

        let assessment = QualityAssessment {
            story_id: story.id.clone(),
            verdict,
            certification,
            final_approval,
            certificate,
        };
        store_report(story, "quality_gate_assessment", &assessment);
        story.add_agent_note(
            Role::Qa,
            format!("Quality gate assessment: {certification} certification"),
        );
        info!(story_id = %story.id, certification = %certification, "Quality gate assessment");
        assessment
    }

    /// Dispatch a QA command.
    pub fn run(&mut self, story: &mut StoryContext, command: GateCommand) -> GateOutcome {
        match command {
            GateCommand::Risk => GateOutcome::Risk(self.risk_assessment(story)),
            GateCommand::Design => GateOutcome::Design(self.design_test_strategy(story)),
            GateCommand::Trace => GateOutcome::Trace(self.trace_requirements(story)),
            GateCommand::Nfr => GateOutcome::Nfr(self.check_nfr(story)),
            GateCommand::Review => GateOutcome::Review(self.comprehensive_review(story)),
            GateCommand::Gate => GateOutcome::Gate(self.quality_gate_assessment(story)),
            GateCommand::Comprehensive => GateOutcome::Comprehensive(
                GateCommand::SEQUENCE
                    .into_iter()
                    .map(|c| self.run(story, c))
                    .collect(),
            ),
        }
    }

    fn count(&mut self, verdict: &GateVerdict) {
        self.metrics.gates_checked += 1;
        if verdict.passed() {
            self.metrics.gates_passed += 1;
        } else {
            self.metrics.gates_failed += 1;
        }
    }
}

fn store_report<T: Serialize>(story: &mut StoryContext, key: &str, report: &T) {
    match serde_json::to_value(report) {
        Ok(value) => story.record_validation(key, value),
        Err(e) => warn!(story_id = %story.id, key, "Failed to store report: {e}"),
    }
}
