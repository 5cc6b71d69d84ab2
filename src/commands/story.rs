use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use super::common::open_workspace;
use crate::models::story::StoryUpdate;

/// Create a story and make it the workflow's current story
pub fn create(
    config: &Path,
    workflow_id: &str,
    title: &str,
    description: Option<&str>,
    epic: Option<&str>,
) -> Result<()> {
    let mut ws = open_workspace(config)?;
    let created = ws
        .engine
        .start_story_cycle(workflow_id, title, description, epic)?;

    println!("{} {}", "Created".green().bold(), created.story_id.bold());
    println!("  State: {}", created.state.to_string().cyan());
    if created.project_promoted {
        println!("  Project {} moved to in_development", created.project_id);
    }
    Ok(())
}

/// Replace a story's description, criteria or tasks
pub fn update(
    config: &Path,
    workflow_id: &str,
    story_id: &str,
    description: Option<String>,
    criteria: Vec<String>,
    tasks: Vec<String>,
) -> Result<()> {
    let update = StoryUpdate {
        description,
        acceptance_criteria: (!criteria.is_empty()).then_some(criteria),
        tasks: (!tasks.is_empty()).then_some(tasks),
    };
    let mut ws = open_workspace(config)?;
    ws.engine.update_story(workflow_id, story_id, update)?;
    println!("{} {story_id}", "Updated".green());
    Ok(())
}

pub fn complete_task(config: &Path, workflow_id: &str, story_id: &str, index: usize) -> Result<()> {
    let mut ws = open_workspace(config)?;
    ws.engine.complete_task(workflow_id, story_id, index)?;
    println!("{} task {index} of {story_id}", "Completed".green());
    Ok(())
}

/// Record gate evidence. `value` is parsed as JSON, falling back to a string.
pub fn evidence(
    config: &Path,
    workflow_id: &str,
    story_id: &str,
    key: &str,
    value: &str,
) -> Result<()> {
    let value = serde_json::from_str(value)
        .or_else(|_| serde_json::to_value(value))
        .context("Failed to encode evidence value")?;
    let mut ws = open_workspace(config)?;
    ws.engine
        .record_validation(workflow_id, story_id, key, value.clone())?;
    println!("{} {key} = {value}", "Recorded".green());
    Ok(())
}

pub fn focus(config: &Path, workflow_id: &str, story_id: &str) -> Result<()> {
    let mut ws = open_workspace(config)?;
    ws.engine.focus_story(workflow_id, story_id)?;
    println!("Current story for {workflow_id}: {}", story_id.bold());
    Ok(())
}
