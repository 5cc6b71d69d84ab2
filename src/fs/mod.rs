pub mod locking;
pub mod store;

pub use store::{FileStore, MemoryStore, WorkflowStore};
