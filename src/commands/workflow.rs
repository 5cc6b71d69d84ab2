use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use std::str::FromStr;

use super::common::{open_workspace, print_next_steps, print_verdict};
use crate::engine::{WorkflowAdvance, WorkflowType};
use crate::models::roles::Role;

/// Start a project workflow
pub fn start(config: &Path, name: &str, idea: Option<&str>, workflow_type: &str) -> Result<()> {
    let workflow_type = WorkflowType::from_str(workflow_type)?;
    let mut ws = open_workspace(config)?;
    let started = ws.engine.start_project_workflow(name, idea, workflow_type)?;

    println!("{} {}", "Started".green().bold(), started.workflow_id.bold());
    println!("  Project:  {}", started.project_id);
    println!("  Session:  {}", started.session_id);
    println!("  Type:     {}", started.workflow_type);
    println!("  State:    {}", started.state.to_string().cyan());
    println!("  Estimate: {}", started.plan.estimated_duration);

    println!("\n{}", "Plan".bold());
    for phase in &started.plan.phases {
        let roles: Vec<String> = phase.roles.iter().map(|r| format!("@{r}")).collect();
        println!("  {:<12} {}", phase.name, roles.join(" ").dimmed());
    }
    print_next_steps(&started.next_steps);
    Ok(())
}

/// Advance a workflow's project, or its current story with a `story_` target
pub fn advance(
    config: &Path,
    workflow_id: &str,
    target: Option<&str>,
    agent: Option<&str>,
) -> Result<()> {
    let agent = agent.map(Role::from_str).transpose()?;
    let mut ws = open_workspace(config)?;

    match ws.engine.advance_workflow(workflow_id, target, agent)? {
        WorkflowAdvance::Project(advance) => {
            println!(
                "{} project {}: {} → {}",
                "Advanced".green().bold(),
                advance.project_id,
                advance.from,
                advance.to.to_string().cyan()
            );
            print_verdict(&advance.verdict);
            print_next_steps(&advance.next_steps);
        }
        WorkflowAdvance::Story(advance) => {
            println!(
                "{} story {}: {} → {}",
                "Advanced".green().bold(),
                advance.story_id,
                advance.from,
                advance.to.to_string().cyan()
            );
            print_verdict(&advance.verdict);
            print_next_steps(&advance.next_steps);
        }
    }
    Ok(())
}
