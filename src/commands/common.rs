//! Shared setup for CLI commands.

use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::Path;

use crate::config::WorkflowConfig;
use crate::engine::{EventLog, WorkflowEngine};
use crate::fs::FileStore;
use crate::gates::{GateVerdict, QualityLevel};
use crate::orchestrator::NextStep;

pub const EVENT_LOG_FILE: &str = "events.jsonl";

/// A file-backed engine with the event log attached.
pub struct Workspace {
    pub engine: WorkflowEngine,
    pub events: EventLog,
}

pub fn open_workspace(config_path: &Path) -> Result<Workspace> {
    let config = WorkflowConfig::load(config_path)?;
    let dir = &config.store.dir;
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create store directory: {}", dir.display()))?;

    let mut engine = WorkflowEngine::open(&config, Box::new(FileStore::new(dir)))
        .with_context(|| format!("Failed to load workflows from {}", dir.display()))?;
    let events = EventLog::new(dir.join(EVENT_LOG_FILE));
    engine.on_all(events.clone().listener());

    Ok(Workspace { engine, events })
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to render JSON")?
    );
    Ok(())
}

pub fn level_label(level: QualityLevel) -> colored::ColoredString {
    match level {
        QualityLevel::Passed => level.to_string().green(),
        QualityLevel::Warning => level.to_string().yellow(),
        QualityLevel::Failed => level.to_string().red(),
        QualityLevel::Blocked => level.to_string().red().bold(),
    }
}

pub fn print_verdict(verdict: &GateVerdict) {
    println!("  Gate:     {}", level_label(verdict.level));
    for issue in &verdict.issues {
        println!("    {} {issue}", "-".dimmed());
    }
    for rec in &verdict.recommendations {
        println!("    {} {rec}", "→".cyan());
    }
}

pub fn print_next_steps(steps: &[NextStep]) {
    if steps.is_empty() {
        return;
    }
    println!("\n{}", "Next steps".bold());
    for step in steps {
        let role = step
            .role
            .map(|r| format!(" (@{r})"))
            .unwrap_or_default();
        println!("  {} {}{role}", step.action.cyan(), step.description);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{WorkflowEventKind, WorkflowType};
    use tempfile::TempDir;

    #[test]
    fn test_open_workspace_uses_configured_store() {
        let temp = TempDir::new().unwrap();
        let store = temp.path().join("state");
        let config_path = temp.path().join("cadence.toml");
        fs::write(
            &config_path,
            format!("[store]\ndir = {:?}\n", store.display().to_string()),
        )
        .unwrap();

        let mut ws = open_workspace(&config_path).unwrap();
        let workflow_id = ws
            .engine
            .start_project_workflow("Checkout Redesign", None, WorkflowType::Full)
            .unwrap()
            .workflow_id;

        assert_eq!(ws.events.path(), store.join(EVENT_LOG_FILE));
        assert!(store.join(format!("{workflow_id}.json")).exists());
        assert_eq!(
            ws.events.read_recent(5).unwrap()[0].kind,
            WorkflowEventKind::ProjectCreated
        );
    }
}
