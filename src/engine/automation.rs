use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::gates::GateCommand;
use crate::models::roles::Role;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AutomationAction {
    /// Same target syntax as `advance_workflow`; `story_` prefixes address
    /// the workflow's current story.
    Advance {
        #[serde(default)]
        target: Option<String>,
    },
    AssignAgent {
        task_type: String,
        #[serde(default)]
        role: Option<Role>,
    },
    /// Runs against the workflow's current story.
    RunQualityGate { gate: GateCommand },
}

impl std::fmt::Display for AutomationAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AutomationAction::Advance { target: Some(t) } => write!(f, "advance to {t}"),
            AutomationAction::Advance { target: None } => write!(f, "advance"),
            AutomationAction::AssignAgent { task_type, .. } => write!(f, "assign {task_type}"),
            AutomationAction::RunQualityGate { gate } => write!(f, "run {gate}"),
        }
    }
}

/// Rule evaluated after every engine mutation.
///
/// Conditions are compared for equality against the top-level fields of the
/// serialized workflow record, e.g. `current_state = "alignment"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationRule {
    pub name: String,
    #[serde(default)]
    pub conditions: BTreeMap<String, serde_json::Value>,
    pub action: AutomationAction,
}

impl AutomationRule {
    pub fn new(name: impl Into<String>, action: AutomationAction) -> Self {
        Self {
            name: name.into(),
            conditions: BTreeMap::new(),
            action,
        }
    }

    pub fn when(mut self, field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.conditions.insert(field.into(), value.into());
        self
    }

    pub fn matches(&self, context: &serde_json::Value) -> bool {
        self.conditions
            .iter()
            .all(|(field, expected)| context.get(field) == Some(expected))
    }
}

/// A rule firing, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationEvent {
    pub rule: String,
    pub action: String,
    pub depth: usize,
    pub succeeded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub triggered_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rule_matches_every_condition() {
        let rule = AutomationRule::new("auto", AutomationAction::Advance { target: None })
            .when("current_state", "alignment")
            .when("status", "active");

        assert!(rule.matches(&json!({"current_state": "alignment", "status": "active"})));
        assert!(!rule.matches(&json!({"current_state": "alignment", "status": "completed"})));
        assert!(!rule.matches(&json!({"current_state": "alignment"})));
    }

    #[test]
    fn test_rule_without_conditions_always_matches() {
        let rule = AutomationRule::new("always", AutomationAction::Advance { target: None });
        assert!(rule.matches(&json!({})));
    }

    #[test]
    fn test_action_deserializes_from_tagged_form() {
        let action: AutomationAction =
            serde_json::from_value(json!({"type": "run_quality_gate", "gate": "risk"})).unwrap();
        assert_eq!(action, AutomationAction::RunQualityGate { gate: GateCommand::Risk });

        let action: AutomationAction =
            serde_json::from_value(json!({"type": "assign_agent", "task_type": "testing"})).unwrap();
        assert_eq!(
            action,
            AutomationAction::AssignAgent {
                task_type: "testing".into(),
                role: None
            }
        );
    }
}
