//! File-based email input.
//!
//! Two formats are accepted:
//! - a JSON array of `{subject, body, ...}` objects (extra fields ignored)
//! - a single RFC 5322 message in a `.eml` file

use std::path::{Path, PathBuf};

use mail_parser::MessageParser;
use tracing::debug;

use crate::error::InputError;
use crate::pipeline::types::EmailInput;

/// Load a JSON batch of emails.
pub async fn load_batch(path: &Path) -> Result<Vec<EmailInput>, InputError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| InputError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    let emails: Vec<EmailInput> =
        serde_json::from_str(&raw).map_err(|e| InputError::InvalidBatch {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    debug!(path = %path.display(), count = emails.len(), "Loaded email batch");
    Ok(emails)
}

/// Load one `.eml` message.
pub async fn load_eml(path: &Path) -> Result<EmailInput, InputError> {
    let raw = tokio::fs::read(path)
        .await
        .map_err(|source| InputError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    parse_eml(&raw).ok_or_else(|| InputError::InvalidMessage {
        path: path.to_path_buf(),
    })
}

/// Load every path in order; `.eml` files contribute one email, anything
/// else is read as a JSON batch.
pub async fn load_inputs(paths: &[PathBuf]) -> Result<Vec<EmailInput>, InputError> {
    let mut emails = Vec::new();
    for path in paths {
        let is_eml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("eml"));
        if is_eml {
            emails.push(load_eml(path).await?);
        } else {
            emails.extend(load_batch(path).await?);
        }
    }
    Ok(emails)
}

/// Subject and plain-text body of a raw message, with quoted replies removed.
pub fn parse_eml(raw: &[u8]) -> Option<EmailInput> {
    let parsed = MessageParser::default().parse(raw)?;
    let subject = parsed.subject().unwrap_or_default().to_string();
    let body = parsed
        .body_text(0)
        .map(|text| strip_quoted_text(&text))
        .unwrap_or_default();
    Some(EmailInput::new(subject, body))
}

/// Strip quoted reply text from an email body.
///
/// Drops `>` lines and everything after an `On ... wrote:` attribution or an
/// `--- Original Message ---` separator.
pub fn strip_quoted_text(body: &str) -> String {
    let mut kept = Vec::new();
    for line in body.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('>') {
            continue;
        }
        if (trimmed.starts_with("On ") && trimmed.ends_with("wrote:"))
            || (trimmed.starts_with("---") && trimmed.contains("Original Message"))
        {
            break;
        }
        kept.push(line);
    }
    while kept.last().is_some_and(|l| l.trim().is_empty()) {
        kept.pop();
    }
    kept.join("\n")
}
