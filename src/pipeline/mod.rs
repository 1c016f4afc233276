//! Email processing pipeline.
//!
//! Every email flows through:
//! 1. `Extractor::extract()`: keyword and pattern heuristics, one action
//! 2. `MemoryStore::add_recent_email()`: cross-run memory
//! 3. `Planner::plan()`: rule-based decision, conflict-checked against tasks
//! 4. `ToolExecutor::execute()`: the side effect, if any
//!
//! `Pipeline` drives the steps and aggregates an `EmailReport` per email.

pub mod dates;
pub mod extractor;
pub mod heuristics;
pub mod planner;
pub mod processor;
pub mod types;

pub use extractor::Extractor;
pub use planner::{Planner, Ruleset};
pub use processor::Pipeline;
