//! Memory record data model.

use serde::{Deserialize, Serialize};

/// Scheduling preferences. Persisted and reported, not consulted by planning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Windows such as `09:00-12:00`.
    #[serde(default)]
    pub preferred_hours: Vec<String>,
    #[serde(default)]
    pub timezone: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            preferred_hours: vec!["09:00-12:00".into(), "15:00-18:00".into()],
            timezone: "Asia/Kolkata".into(),
        }
    }
}

/// Who the mailbox belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub preferences: Preferences,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: "User".into(),
            email: "you@example.com".into(),
            preferences: Preferences::default(),
        }
    }
}

/// One processed email as remembered across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentEmail {
    pub email_id: String,
    pub subject: String,
    pub summary: String,
}

/// The persisted memory record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    #[serde(default)]
    pub user_profile: UserProfile,
    /// Most recent first.
    #[serde(default)]
    pub recent_emails: Vec<RecentEmail>,
    /// Unique task ids in insertion order.
    #[serde(default)]
    pub tasks_index: Vec<String>,
}

impl Memory {
    /// Put `entry` at the front, keeping at most `limit` entries.
    pub fn push_recent(&mut self, entry: RecentEmail, limit: usize) {
        self.recent_emails.insert(0, entry);
        self.recent_emails.truncate(limit);
    }

    /// Append `task_id` unless already known. Returns whether it was added.
    pub fn index_task(&mut self, task_id: &str) -> bool {
        if self.tasks_index.iter().any(|id| id == task_id) {
            return false;
        }
        self.tasks_index.push(task_id.to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recent(n: usize) -> RecentEmail {
        RecentEmail {
            email_id: format!("e-{n}"),
            subject: format!("Subject {n}"),
            summary: String::new(),
        }
    }

    #[test]
    fn default_record_shape() {
        let json = serde_json::to_value(Memory::default()).unwrap();
        assert_eq!(json["user_profile"]["name"], "User");
        assert_eq!(json["user_profile"]["email"], "you@example.com");
        assert_eq!(
            json["user_profile"]["preferences"]["preferred_hours"],
            serde_json::json!(["09:00-12:00", "15:00-18:00"])
        );
        assert_eq!(json["user_profile"]["preferences"]["timezone"], "Asia/Kolkata");
        assert_eq!(json["recent_emails"], serde_json::json!([]));
        assert_eq!(json["tasks_index"], serde_json::json!([]));
    }

    #[test]
    fn push_recent_caps_and_orders() {
        let mut memory = Memory::default();
        for n in 0..5 {
            memory.push_recent(recent(n), 3);
        }
        let ids: Vec<&str> = memory
            .recent_emails
            .iter()
            .map(|e| e.email_id.as_str())
            .collect();
        assert_eq!(ids, vec!["e-4", "e-3", "e-2"]);
    }

    #[test]
    fn index_task_is_unique() {
        let mut memory = Memory::default();
        assert!(memory.index_task("t-1"));
        assert!(memory.index_task("t-2"));
        assert!(!memory.index_task("t-1"));
        assert_eq!(memory.tasks_index, vec!["t-1", "t-2"]);
    }

    #[test]
    fn partial_record_fills_defaults() {
        let memory: Memory = serde_json::from_str(r#"{"tasks_index": ["t-9"]}"#).unwrap();
        assert_eq!(memory.user_profile, UserProfile::default());
        assert!(memory.recent_emails.is_empty());
        assert_eq!(memory.tasks_index, vec!["t-9"]);
    }
}
