//! Email sources.

pub mod file;

pub use file::{load_batch, load_eml, load_inputs, parse_eml, strip_quoted_text};
