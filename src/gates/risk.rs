//! Risk scoring.
//!
//! The keyword heuristic is weak, so it sits behind [`RiskScorer`] and the
//! gate engine only sees the three scores it produces.

use chrono::Utc;

use crate::config::RiskConfig;
use crate::models::story::{RiskLevel, RiskProfile, StoryContext};

const COMPLEXITY_KEYWORDS: [&str; 6] = [
    "complex",
    "integration",
    "algorithm",
    "performance",
    "security",
    "architecture",
];

const DEPENDENCY_KEYWORDS: [&str; 5] = ["api", "service", "external", "third-party", "integration"];

/// Raw scores on a 1-10 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskScores {
    pub complexity: u8,
    pub dependency: u8,
    pub time: u8,
}

pub trait RiskScorer: Send + Sync {
    fn score(&self, story: &StoryContext) -> RiskScores;
}

/// Scores stories by keyword density in the description plus artifact counts.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordRiskScorer;

impl KeywordRiskScorer {
    fn keyword_hits(text: &str, keywords: &[&str]) -> usize {
        keywords.iter().filter(|k| text.contains(*k)).count()
    }
}

impl RiskScorer for KeywordRiskScorer {
    fn score(&self, story: &StoryContext) -> RiskScores {
        let text = story.description.as_deref().unwrap_or("").to_lowercase();
        let criteria = story.acceptance_criteria.len();
        let tasks = story.tasks.len();

        let mut complexity = 1 + Self::keyword_hits(&text, &COMPLEXITY_KEYWORDS);
        if criteria > 5 {
            complexity += 1;
        }
        if tasks > 8 {
            complexity += 1;
        }

        let dependency = 1 + Self::keyword_hits(&text, &DEPENDENCY_KEYWORDS);

        let mut time = 1;
        if tasks > 10 {
            time += 2;
        } else if tasks > 5 {
            time += 1;
        }
        if criteria < 3 {
            time += 2;
        }

        RiskScores {
            complexity: cap(complexity),
            dependency: cap(dependency),
            time: cap(time),
        }
    }
}

fn cap(score: usize) -> u8 {
    score.min(10) as u8
}

/// Turn raw scores into a leveled profile with factors and mitigations.
pub fn build_profile(story: &StoryContext, scores: RiskScores, config: &RiskConfig) -> RiskProfile {
    let mut level = RiskLevel::Low;
    let mut risk_factors = Vec::new();
    let mut mitigations = Vec::new();

    if scores.complexity > config.complexity_threshold {
        level = RiskLevel::High;
        risk_factors.push("High technical complexity".to_string());
        mitigations.push("Break down into smaller technical tasks".to_string());
        mitigations.push("Involve architect for design review".to_string());
    }

    if scores.dependency > config.dependency_threshold {
        level = level.max(RiskLevel::Medium);
        risk_factors.push("External dependencies".to_string());
        mitigations.push("Identify and validate all dependencies early".to_string());
    }

    if story.acceptance_criteria.len() < 3 {
        level = level.max(RiskLevel::Medium);
        risk_factors.push("Unclear or insufficient acceptance criteria".to_string());
        mitigations.push("Refine acceptance criteria with stakeholders".to_string());
    }

    if scores.time > config.time_threshold {
        level = level.max(RiskLevel::Medium);
        risk_factors.push("Time estimation uncertainty".to_string());
        mitigations.push("Add time buffers and interim checkpoints".to_string());
    }

    RiskProfile {
        level,
        complexity_score: scores.complexity,
        dependency_score: scores.dependency,
        time_score: scores.time,
        risk_factors,
        mitigations,
        next_actions: next_actions(level),
        assessed_at: Utc::now(),
    }
}

fn next_actions(level: RiskLevel) -> Vec<String> {
    let actions: &[&str] = match level {
        RiskLevel::Low => &["Proceed with standard development process"],
        RiskLevel::Medium => &[
            "Schedule architect review",
            "Add additional testing",
            "Create detailed task breakdown",
        ],
        RiskLevel::High => &[
            "Mandatory architect review",
            "Prototype key components",
            "Extended testing phase",
            "Stakeholder sign-off required",
        ],
    };
    actions.iter().map(|a| a.to_string()).collect()
}
