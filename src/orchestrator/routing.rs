//! Role assignment and command routing.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::info;

use super::Orchestrator;
use crate::error::Result;
use crate::models::roles::Role;
use crate::models::session::ActionKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub project_id: String,
    pub story_id: Option<String>,
    pub task_type: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRoute {
    pub project_id: String,
    pub story_id: Option<String>,
    pub role: Role,
    pub command: String,
    pub expected_outcome: Option<String>,
}

impl Orchestrator {
    /// Resolve the role for a task in a given context.
    ///
    /// The owner of the story's state wins when a story is named, else the
    /// owner of the project's state. States nobody owns fall back to task
    /// type keywords, then the PM.
    pub fn resolve_role(
        &self,
        project_id: &str,
        story_id: Option<&str>,
        task_type: &str,
    ) -> Result<Role> {
        let owner = match story_id {
            Some(story_id) => self.story_ref(story_id)?.state.responsible_role(),
            None => self.project_ref(project_id)?.state.responsible_role(),
        };
        Ok(owner.unwrap_or_else(|| Role::for_task_type(task_type)))
    }

    /// Assign a role to a task and queue it on the project session.
    pub fn assign_agent_to_task(
        &mut self,
        project_id: &str,
        task_type: &str,
        story_id: Option<&str>,
        role: Option<Role>,
    ) -> Result<Assignment> {
        self.project_ref(project_id)?;
        let role = match role {
            Some(role) => role,
            None => self.resolve_role(project_id, story_id, task_type)?,
        };
        if let Some(story_id) = story_id {
            self.story_ref(story_id)?;
        }

        self.project_mut(project_id)?
            .assigned_roles
            .insert(task_type.to_string(), role);
        if let Some(story_id) = story_id {
            self.story_mut(story_id)?
                .assigned_roles
                .insert(task_type.to_string(), role);
        }

        let session = self.session_mut(project_id)?;
        session.engage(role);
        session.enqueue(
            ActionKind::Assignment,
            format!("{task_type} assigned to {role}"),
            Some(role),
        );
        self.count_interaction(role);
        info!(project_id, task_type, role = %role, "Agent assigned");

        Ok(Assignment {
            project_id: project_id.to_string(),
            story_id: story_id.map(str::to_string),
            task_type: task_type.to_string(),
            role,
        })
    }

    /// Route a command to a role, rejecting commands outside its declared set.
    pub fn route_agent_command(
        &mut self,
        project_id: &str,
        role: &str,
        command: &str,
        story_id: Option<&str>,
    ) -> Result<CommandRoute> {
        let role = Role::from_str(role)?;
        role.check_command(command)?;
        // fail before bookkeeping if the project is unknown
        self.project_mut(project_id)?;

        if let Some(story_id) = story_id {
            self.story_mut(story_id)?
                .add_agent_note(role, format!("Executed {command}"));
        }

        let session = self.session_mut(project_id)?;
        session.engage(role);
        session.complete(
            ActionKind::Command,
            format!("{role} executed {command}"),
            Some(role),
        );
        self.count_interaction(role);
        info!(project_id, role = %role, command, "Command routed");

        Ok(CommandRoute {
            project_id: project_id.to_string(),
            story_id: story_id.map(str::to_string),
            role,
            command: command.to_string(),
            expected_outcome: role.predicted_outcome(command).map(str::to_string),
        })
    }
}
