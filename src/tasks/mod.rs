//! Persisted task list.

pub mod model;
pub mod store;

pub use model::{Task, TaskCreated, TaskList, TaskStatus};
pub use store::{TaskReader, TaskStore};
