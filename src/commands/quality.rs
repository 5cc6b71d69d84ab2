use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use std::str::FromStr;

use super::common::{open_workspace, print_json};
use crate::gates::{GateCommand, GateOutcome};
use crate::models::project::ArtifactSlot;

/// Run a QA command against a story
pub fn gate(
    config: &Path,
    workflow_id: &str,
    story_id: &str,
    command: &str,
    json: bool,
) -> Result<()> {
    let command = GateCommand::from_str(command)?;
    let mut ws = open_workspace(config)?;
    let outcome = ws.engine.run_quality_gate(workflow_id, story_id, command)?;

    if json {
        return print_json(&outcome);
    }
    print_outcome(&outcome);
    Ok(())
}

/// Route a role command, e.g. `@qa *review`
pub fn agent(
    config: &Path,
    workflow_id: &str,
    role: &str,
    command: &str,
    story_id: Option<&str>,
) -> Result<()> {
    let mut ws = open_workspace(config)?;
    let result = ws
        .engine
        .execute_agent_command(workflow_id, role, command, story_id)?;

    println!(
        "{} {} → @{}",
        "Routed".green().bold(),
        result.route.command,
        result.route.role
    );
    if let Some(outcome) = result.route.expected_outcome {
        println!("  Expected: {outcome}");
    }
    if let Some(outcome) = &result.gate {
        print_outcome(outcome);
    }
    Ok(())
}

/// Fill a project artifact slot
pub fn artifact(config: &Path, workflow_id: &str, slot: &str, value: &str) -> Result<()> {
    let slot = ArtifactSlot::from_str(slot)?;
    let mut ws = open_workspace(config)?;
    ws.engine.set_project_artifact(workflow_id, slot, value)?;
    println!("{} {slot}", "Recorded".green());
    Ok(())
}

fn print_outcome(outcome: &GateOutcome) {
    let status = match outcome.approved() {
        Some(true) => "approved".green(),
        Some(false) => "not approved".red(),
        None => "report".normal(),
    };
    println!("  {} [{status}]", outcome.summary());
    if let GateOutcome::Comprehensive(all) = outcome {
        for step in all {
            println!("    {} {}", "-".dimmed(), step.summary());
        }
    }
}
