use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use super::common::{open_workspace, print_json, print_next_steps};
use crate::engine::{EngineStatus, RecordStatus};
use crate::orchestrator::WorkflowStatus;

/// Show one workflow, or every workflow when no id is given
pub fn status(config: &Path, workflow_id: Option<&str>, json: bool) -> Result<()> {
    let ws = open_workspace(config)?;
    let status = ws.engine.get_workflow_status(workflow_id)?;
    if json {
        return print_json(&status);
    }

    match status {
        EngineStatus::Overview {
            workflows,
            metrics,
            automation_rules,
            ..
        } => {
            println!("{}", "cadence workflows".bold().blue());
            println!("{}", "=".repeat(50));
            if workflows.is_empty() {
                println!("No workflows. Start one with `cadence start <name>`.");
            }
            for wf in workflows {
                let status = match wf.status {
                    RecordStatus::Active => "active".green(),
                    RecordStatus::Completed => "completed".dimmed(),
                };
                println!(
                    "  {:<40} {:<18} {status}",
                    wf.workflow_id,
                    wf.current_state.to_string()
                );
            }
            println!(
                "\n  Events fired this run: {}  Automation rules: {automation_rules}",
                metrics.events_fired
            );
        }
        EngineStatus::Workflow { record, status } => {
            println!("{}", record.workflow_id.bold().blue());
            println!("{}", "=".repeat(50));
            println!("  Type:   {}", record.workflow_type);
            println!("  State:  {}", record.current_state.to_string().cyan());
            if let Some(story) = &record.current_story_id {
                println!("  Story:  {story}");
            }
            if let WorkflowStatus::Project(project) = status {
                if let Some(role) = project.responsible_role {
                    println!("  Owner:  @{role}");
                }
                if !project.stories.is_empty() {
                    println!("\n{}", "Stories".bold());
                    for story in &project.stories {
                        let cert = if story.certified { " ✓" } else { "" };
                        println!("  {:<36} {}{cert}", story.story_id, story.state);
                    }
                }
                print_next_steps(&project.next_steps);
            }
        }
    }
    Ok(())
}

pub fn report(config: &Path, workflow_id: &str, json: bool) -> Result<()> {
    let ws = open_workspace(config)?;
    let report = ws.engine.generate_workflow_report(workflow_id)?;
    if json {
        return print_json(&report);
    }

    println!("{}", format!("Report for {}", report.project_name).bold().blue());
    println!("{}", "=".repeat(50));
    println!("  Duration:   {} (estimate {})", report.duration, report.estimated_duration);
    println!("  State:      {}", report.current_state);
    println!("  Completion: {:.0}%", report.completion_percentage);
    println!(
        "  Stories:    {}/{} completed",
        report.stories_completed, report.stories_total
    );
    println!(
        "  Gates:      {} checked, {} passed, {} failed",
        report.gates.total,
        report.gates.passed.to_string().green(),
        report.gates.failed.to_string().red()
    );
    if !report.role_interactions.is_empty() {
        println!("\n{}", "Role interactions".bold());
        for (role, count) in &report.role_interactions {
            println!("  @{role:<10} {count}");
        }
    }
    if !report.recommendations.is_empty() {
        println!("\n{}", "Recommendations".bold());
        for rec in &report.recommendations {
            println!("  {} {rec}", "→".cyan());
        }
    }
    Ok(())
}

/// Print the tail of the event log
pub fn events(config: &Path, limit: usize) -> Result<()> {
    let ws = open_workspace(config)?;
    for event in ws.events.read_recent(limit)? {
        let story = event
            .story_id
            .as_deref()
            .map(|s| format!(" {s}"))
            .unwrap_or_default();
        println!(
            "{} {:<22} {}{story}",
            event.timestamp.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
            event.kind.to_string(),
            event.workflow_id
        );
    }
    Ok(())
}
