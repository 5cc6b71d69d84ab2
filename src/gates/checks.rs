//! Check and blocking-issue tables keyed by target story state.

use anyhow::{anyhow, Result};
use serde_json::Value;

use super::types::{CheckResult, QualityLevel};
use crate::config::GateConfig;
use crate::models::state::StoryState;
use crate::models::story::StoryContext;

/// A single quality check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    AcceptanceCriteria,
    TaskBreakdown,
    /// Read the validation entry of the same name.
    Evidence(&'static str),
}

impl Check {
    pub fn name(&self) -> &'static str {
        match self {
            Check::AcceptanceCriteria => "acceptance_criteria",
            Check::TaskBreakdown => "task_breakdown",
            Check::Evidence(name) => *name,
        }
    }

    pub fn evaluate(&self, story: &StoryContext, config: &GateConfig) -> Result<CheckResult> {
        let (level, message) = match self {
            Check::AcceptanceCriteria => {
                let count = story.acceptance_criteria.len();
                if count == 0 {
                    (QualityLevel::Failed, Some("No acceptance criteria defined".to_string()))
                } else if count < config.min_acceptance_criteria {
                    (QualityLevel::Warning, Some("Limited acceptance criteria".to_string()))
                } else {
                    (QualityLevel::Passed, None)
                }
            }
            Check::TaskBreakdown => {
                if story.tasks.is_empty() {
                    (QualityLevel::Failed, Some("No tasks defined".to_string()))
                } else {
                    (QualityLevel::Passed, None)
                }
            }
            Check::Evidence(name) => match evidence(story, name).as_ref() {
                None | Some(Value::Bool(true)) => (QualityLevel::Passed, None),
                Some(Value::Bool(false)) => {
                    (QualityLevel::Failed, Some(format!("Check not satisfied: {name}")))
                }
                Some(other) => {
                    return Err(anyhow!(
                        "expected boolean evidence for {name}, found {other}"
                    ))
                }
            },
        };

        Ok(CheckResult {
            name: self.name().to_string(),
            level,
            optional: false,
            message,
        })
    }

    /// Recommendation attached to a failing required check.
    pub fn recommendation(&self) -> String {
        match self {
            Check::AcceptanceCriteria => "Define clear, testable acceptance criteria".to_string(),
            Check::TaskBreakdown => "Break down story into implementable tasks".to_string(),
            Check::Evidence(name) => format!("Provide evidence for {name}"),
        }
    }
}

/// Evidence for a check: an explicit validation entry, else the verdict of a
/// QA report stored on the story by an earlier command.
fn evidence(story: &StoryContext, name: &str) -> Option<Value> {
    if let Some(value) = story.validation_results.get(name) {
        return Some(value.clone());
    }
    match name {
        "qa_review_passed" => stored(story, "comprehensive_review", "/approved").cloned(),
        "acceptance_criteria_met" => none_listed(stored(story, "requirements_tracing", "/gaps")),
        "security_review" => none_listed(stored(
            story,
            "nfr_assessment",
            "/categories/security/issues",
        )),
        "performance_validation" => none_listed(stored(
            story,
            "nfr_assessment",
            "/categories/performance/issues",
        )),
        _ => None,
    }
}

fn stored<'a>(story: &'a StoryContext, report: &str, pointer: &str) -> Option<&'a Value> {
    story
        .validation_results
        .get(report)
        .and_then(|r| r.pointer(pointer))
}

/// `true` when the listed items are empty.
fn none_listed(list: Option<&Value>) -> Option<Value> {
    list.and_then(Value::as_array)
        .map(|items| Value::Bool(items.is_empty()))
}

/// Conditions that force a `blocked` verdict regardless of check results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockingIssue {
    MissingRequirements,
    UnclearScope,
    TestFailures,
    CodeQualityIssues,
    FailingTests,
    IncompleteFeatures,
    UnresolvedDefects,
    MissingApprovals,
}

impl BlockingIssue {
    pub fn name(&self) -> &'static str {
        match self {
            BlockingIssue::MissingRequirements => "missing_requirements",
            BlockingIssue::UnclearScope => "unclear_scope",
            BlockingIssue::TestFailures => "test_failures",
            BlockingIssue::CodeQualityIssues => "code_quality_issues",
            BlockingIssue::FailingTests => "failing_tests",
            BlockingIssue::IncompleteFeatures => "incomplete_features",
            BlockingIssue::UnresolvedDefects => "unresolved_defects",
            BlockingIssue::MissingApprovals => "missing_approvals",
        }
    }

    pub fn detected(&self, story: &StoryContext, config: &GateConfig) -> bool {
        match self {
            BlockingIssue::MissingRequirements => story.acceptance_criteria.is_empty(),
            BlockingIssue::UnclearScope => story.description_len() < config.min_description_len,
            BlockingIssue::TestFailures => number(story, "test_failures").is_some_and(|n| n > 0.0),
            BlockingIssue::CodeQualityIssues => {
                number(story, "code_quality_score").is_some_and(|n| n < 7.0)
            }
            BlockingIssue::FailingTests => number(story, "failing_tests").is_some_and(|n| n > 0.0),
            BlockingIssue::IncompleteFeatures => {
                !story.tasks.is_empty() && !story.all_tasks_completed()
            }
            BlockingIssue::UnresolvedDefects => {
                number(story, "open_defects").is_some_and(|n| n > 0.0)
            }
            BlockingIssue::MissingApprovals => {
                story.validation_results.get("stakeholder_approved") != Some(&Value::Bool(true))
            }
        }
    }
}

fn number(story: &StoryContext, key: &str) -> Option<f64> {
    story.validation_results.get(key).and_then(Value::as_f64)
}

/// Checks attached to one target state.
#[derive(Debug, Clone, Copy)]
pub struct GateSpec {
    pub required: &'static [Check],
    pub optional: &'static [Check],
    pub blocking: &'static [BlockingIssue],
}

const EMPTY_GATE: GateSpec = GateSpec {
    required: &[],
    optional: &[],
    blocking: &[],
};

pub fn gate_spec(target: StoryState) -> GateSpec {
    use BlockingIssue::*;
    use Check::*;
    match target {
        StoryState::Development => GateSpec {
            required: &[AcceptanceCriteria, TaskBreakdown],
            optional: &[Evidence("risk_assessment"), Evidence("design_review")],
            blocking: &[MissingRequirements, UnclearScope],
        },
        StoryState::QaCheck => GateSpec {
            required: &[
                AcceptanceCriteria,
                Evidence("implementation_complete"),
                Evidence("unit_tests"),
                Evidence("code_review"),
            ],
            optional: &[Evidence("integration_tests"), Evidence("performance_tests")],
            blocking: &[TestFailures, CodeQualityIssues],
        },
        StoryState::ReadyForReview => GateSpec {
            required: &[
                Evidence("all_tests_passed"),
                Evidence("documentation_updated"),
                Evidence("acceptance_criteria_met"),
            ],
            optional: &[Evidence("security_review"), Evidence("performance_validation")],
            blocking: &[FailingTests, IncompleteFeatures],
        },
        StoryState::Completed => GateSpec {
            required: &[
                Evidence("qa_review_passed"),
                Evidence("stakeholder_approval"),
                Evidence("deployment_ready"),
            ],
            optional: &[Evidence("user_acceptance_testing"), Evidence("load_testing")],
            blocking: &[UnresolvedDefects, MissingApprovals],
        },
        _ => EMPTY_GATE,
    }
}
