//! Durable cross-run memory: user profile, recent emails, known task ids.

pub mod model;
pub mod store;

pub use model::{Memory, Preferences, RecentEmail, UserProfile};
pub use store::MemoryStore;
