use anyhow::Result;
use cadence::commands::{quality, status, story, workflow};
use cadence::config::CONFIG_FILE;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Role-driven project and story workflows with quality gates", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a project workflow
    Start {
        /// Project name
        name: String,

        /// Initial idea (required before the project brief)
        #[arg(short, long)]
        idea: Option<String>,

        /// Workflow type: full, planning_only, development_only
        #[arg(short = 't', long = "type", default_value = "full")]
        workflow_type: String,
    },

    /// Advance a workflow; prefix the target with `story_` to move the current story
    Advance {
        workflow_id: String,

        /// Target state (defaults to the first legal next state)
        target: Option<String>,

        /// Assign this role to the new state
        #[arg(short, long)]
        agent: Option<String>,
    },

    /// Fill a project artifact slot
    Artifact {
        workflow_id: String,
        /// idea, research, brief, prd, ux_design, architecture, test_strategy, master_checklist
        slot: String,
        value: String,
    },

    /// Manage stories
    Story {
        #[command(subcommand)]
        command: StoryCommands,
    },

    /// Run a QA command (risk, design, trace, nfr, review, gate, comprehensive)
    Gate {
        workflow_id: String,
        story_id: String,
        command: String,

        #[arg(long)]
        json: bool,
    },

    /// Route a command to a role, e.g. `cadence agent <id> qa *review --story <story>`
    Agent {
        workflow_id: String,
        role: String,
        command: String,

        #[arg(short, long)]
        story: Option<String>,
    },

    /// Show workflow status
    Status {
        workflow_id: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Generate a workflow report
    Report {
        workflow_id: String,

        #[arg(long)]
        json: bool,
    },

    /// Show recent workflow events
    Events {
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(Subcommand)]
enum StoryCommands {
    /// Create a story under the workflow's project
    Create {
        workflow_id: String,
        title: String,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(short, long)]
        epic: Option<String>,
    },

    /// Replace description, acceptance criteria or tasks
    Update {
        workflow_id: String,
        story_id: String,

        #[arg(short, long)]
        description: Option<String>,

        /// Acceptance criterion (repeatable)
        #[arg(long = "criterion")]
        criteria: Vec<String>,

        /// Task title (repeatable)
        #[arg(long = "task")]
        tasks: Vec<String>,
    },

    /// Mark a task complete by index
    Task {
        workflow_id: String,
        story_id: String,
        index: usize,
    },

    /// Record gate evidence, e.g. `unit_tests true` or `open_defects 0`
    Evidence {
        workflow_id: String,
        story_id: String,
        key: String,
        value: String,
    },

    /// Make a story the target of `story_*` advancement
    Focus {
        workflow_id: String,
        story_id: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = cli.config.as_path();
    match cli.command {
        Commands::Start {
            name,
            idea,
            workflow_type,
        } => workflow::start(config, &name, idea.as_deref(), &workflow_type),
        Commands::Advance {
            workflow_id,
            target,
            agent,
        } => workflow::advance(config, &workflow_id, target.as_deref(), agent.as_deref()),
        Commands::Artifact {
            workflow_id,
            slot,
            value,
        } => quality::artifact(config, &workflow_id, &slot, &value),
        Commands::Story { command } => match command {
            StoryCommands::Create {
                workflow_id,
                title,
                description,
                epic,
            } => story::create(
                config,
                &workflow_id,
                &title,
                description.as_deref(),
                epic.as_deref(),
            ),
            StoryCommands::Update {
                workflow_id,
                story_id,
                description,
                criteria,
                tasks,
            } => story::update(config, &workflow_id, &story_id, description, criteria, tasks),
            StoryCommands::Task {
                workflow_id,
                story_id,
                index,
            } => story::complete_task(config, &workflow_id, &story_id, index),
            StoryCommands::Evidence {
                workflow_id,
                story_id,
                key,
                value,
            } => story::evidence(config, &workflow_id, &story_id, &key, &value),
            StoryCommands::Focus {
                workflow_id,
                story_id,
            } => story::focus(config, &workflow_id, &story_id),
        },
        Commands::Gate {
            workflow_id,
            story_id,
            command,
            json,
        } => quality::gate(config, &workflow_id, &story_id, &command, json),
        Commands::Agent {
            workflow_id,
            role,
            command,
            story,
        } => quality::agent(config, &workflow_id, &role, &command, story.as_deref()),
        Commands::Status { workflow_id, json } => {
            status::status(config, workflow_id.as_deref(), json)
        }
        Commands::Report { workflow_id, json } => status::report(config, &workflow_id, json),
        Commands::Events { limit } => status::events(config, limit),
    }
}
