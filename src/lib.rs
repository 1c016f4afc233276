//! MailSense: email action extraction, rule-based planning, task tracking.

pub mod channels;
pub mod config;
pub mod error;
pub mod memory;
pub mod pipeline;
pub mod tasks;
pub mod tools;
pub mod workspace;
