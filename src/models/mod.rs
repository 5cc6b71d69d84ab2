pub mod project;
pub mod roles;
pub mod session;
pub mod state;
pub mod story;

pub use project::{ArtifactSlot, ProjectContext, StoryRef};
pub use roles::Role;
pub use session::{ActionKind, SessionAction, WorkflowSession};
pub use state::{ProjectState, StoryState, WorkflowPhase};
pub use story::{RiskLevel, RiskProfile, StoryContext, StoryTask, StoryUpdate, TestStrategy};
