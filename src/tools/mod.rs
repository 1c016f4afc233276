//! Side-effecting tools the planner can request.

pub mod call;
pub mod executor;

pub use call::*;
pub use executor::ToolExecutor;
