mod methods;
mod types;

pub use types::{ActionKind, SessionAction, WorkflowSession};
