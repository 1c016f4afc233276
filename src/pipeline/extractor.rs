//! Text → structured action extraction.
//!
//! Every email yields exactly one [`Action`]: a keyword classifier picks the
//! type, the date scanner collects calendar references, and addresses in the
//! text become contacts. Nothing here fails; unrecognised input degrades to
//! an `info` action with empty collections.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::debug;

use crate::pipeline::dates::{Clock, SystemClock, scan_dates};
use crate::pipeline::heuristics::{
    polite_name_from_email, summarise_by_sentences, truncate_with_ellipsis,
};
use crate::pipeline::types::{Action, ActionType, Contact, ExtractorOutput, Priority, short_id};

/// Characters of body text kept in an action description.
pub const DESCRIPTION_LIMIT: usize = 280;

/// Characters of email text used as a fallback title.
const FALLBACK_TITLE_CHARS: usize = 40;

/// Subjects shorter than this may stand alone as the summary.
const SUBJECT_SUMMARY_LIMIT: usize = 80;

static ADDRESS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\w.-]+@[\w.-]+\.\w+").expect("valid address regex"));

// Checked in order; the first list with a hit decides the type.
const INVOICE_KEYWORDS: &[&str] = &["invoice", "due", "payment", "amount", "invoice#"];
const SCHEDULE_KEYWORDS: &[&str] = &[
    "schedule",
    "meet",
    "meeting",
    "call",
    "available",
    "free",
    "book",
];
const TASK_KEYWORDS: &[&str] = &[
    "please",
    "kindly",
    "request",
    "could you",
    "can you",
    "send",
];
const DELEGATE_KEYWORDS: &[&str] = &["forward", "delegate", "cc:", "please assign"];

const SUMMARY_SUBJECT_MARKERS: &[&str] = &["request", "inv", "meeting"];

/// Extracts one action and a summary from an email.
pub struct Extractor {
    clock: Arc<dyn Clock>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl Extractor {
    /// Create an extractor resolving relative dates against `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Extract the action and summary for one email.
    pub fn extract(&self, subject: &str, body: &str) -> ExtractorOutput {
        let full_text = format!("{subject}\n\n{body}");
        let full_text = full_text.trim();

        let dates = scan_dates(full_text, self.clock.now());
        let action_type = classify(full_text);
        let priority = (action_type == ActionType::Invoice).then_some(Priority::High);
        let contacts = extract_contacts(full_text);

        debug!(
            action_type = %action_type,
            dates = dates.len(),
            contacts = contacts.len(),
            "Extracted action"
        );

        let action = Action {
            id: short_id("a"),
            action_type,
            title: title_for(action_type, subject, full_text),
            description: truncate_with_ellipsis(body, DESCRIPTION_LIMIT),
            dates,
            contacts,
            priority,
            confidence: if action_type == ActionType::Info {
                0.4
            } else {
                0.9
            },
        };

        let (summary_text, summary_length) = summarize_email(subject, body);
        ExtractorOutput {
            email_id: short_id("e"),
            summary_text,
            summary_length,
            actions: vec![action],
        }
    }
}

/// Keyword classification, first matching category wins.
pub fn classify(text: &str) -> ActionType {
    let lower = text.to_lowercase();
    let hit = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));
    if hit(INVOICE_KEYWORDS) {
        ActionType::Invoice
    } else if hit(SCHEDULE_KEYWORDS) {
        ActionType::Schedule
    } else if hit(TASK_KEYWORDS) {
        ActionType::Task
    } else if hit(DELEGATE_KEYWORDS) {
        ActionType::Delegate
    } else {
        ActionType::Info
    }
}

/// Addresses found in `text`, one contact per distinct address.
pub fn extract_contacts(text: &str) -> Vec<Contact> {
    let mut contacts: Vec<Contact> = Vec::new();
    for m in ADDRESS_RE.find_iter(text) {
        let email = m.as_str();
        if contacts.iter().any(|c| c.email == email) {
            continue;
        }
        contacts.push(Contact {
            name: polite_name_from_email(email),
            email: email.to_string(),
        });
    }
    contacts
}

/// Short summary and its word count.
///
/// A short subject that already names a request, invoice or meeting stands
/// alone; otherwise the subject is followed by the first two body sentences.
pub fn summarize_email(subject: &str, body: &str) -> (String, usize) {
    let subject = subject.trim();
    let lower = subject.to_lowercase();
    let summary = if !subject.is_empty()
        && subject.chars().count() < SUBJECT_SUMMARY_LIMIT
        && SUMMARY_SUBJECT_MARKERS.iter().any(|k| lower.contains(k))
    {
        subject.to_string()
    } else {
        let lead = if subject.is_empty() {
            String::new()
        } else {
            format!("{subject}. ")
        };
        format!("{lead}{}", summarise_by_sentences(body, 2))
            .trim()
            .to_string()
    };
    let words = summary.split_whitespace().count();
    (summary, words)
}

fn title_for(action_type: ActionType, subject: &str, full_text: &str) -> String {
    let subject_or = |fallback: &str| {
        if subject.is_empty() {
            fallback.to_string()
        } else {
            subject.to_string()
        }
    };
    match action_type {
        ActionType::Schedule => format!("Schedule: {}", subject_or("Meeting")),
        ActionType::Invoice => format!("Invoice Action: {}", subject_or("Payment due")),
        ActionType::Task => format!("Task: {}", subject_or("Action required")),
        ActionType::Delegate | ActionType::Info => {
            subject_or(&full_text.chars().take(FALLBACK_TITLE_CHARS).collect::<String>())
        }
    }
}
