//! Configuration types.

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::workspace::Workspace;

/// Number of recent emails kept in memory.
pub const DEFAULT_RECENT_LIMIT: usize = 50;

/// What to do when a persisted record exists but fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorruptStatePolicy {
    /// Move the bad file aside, log a warning, and start from the default record.
    #[default]
    Reset,
    /// Surface the error to the caller.
    Fail,
}

impl FromStr for CorruptStatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reset" => Ok(Self::Reset),
            "fail" => Ok(Self::Fail),
            other => Err(format!("expected 'reset' or 'fail', got '{other}'")),
        }
    }
}

/// How each email's action is turned into side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Planner decides, executor applies the plan's tool call.
    #[default]
    Plan,
    /// Fixed rule, no planner: invoices and tasks become tasks, dated
    /// schedule requests become placeholder tasks.
    Direct,
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plan" => Ok(Self::Plan),
            "direct" => Ok(Self::Direct),
            other => Err(format!("expected 'plan' or 'direct', got '{other}'")),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding `memory.json` and `tasks.json`.
    pub data_dir: PathBuf,
    /// Maximum entries in `recent_emails`.
    pub recent_limit: usize,
    /// Behavior on corrupt memory records.
    pub on_corrupt: CorruptStatePolicy,
    /// Planner or direct mode.
    pub mode: RunMode,
    /// Optional directory for daily-rolling log files.
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            recent_limit: DEFAULT_RECENT_LIMIT,
            on_corrupt: CorruptStatePolicy::Reset,
            mode: RunMode::Plan,
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Build config from `MAILSENSE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup (env in production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup("MAILSENSE_DATA_DIR").filter(|s| !s.trim().is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }

        if let Some(raw) = lookup("MAILSENSE_RECENT_LIMIT") {
            let limit: usize = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "MAILSENSE_RECENT_LIMIT".into(),
                message: format!("'{raw}' is not a non-negative integer"),
            })?;
            if limit == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "MAILSENSE_RECENT_LIMIT".into(),
                    message: "must be at least 1".into(),
                });
            }
            config.recent_limit = limit;
        }

        if let Some(raw) = lookup("MAILSENSE_ON_CORRUPT") {
            config.on_corrupt = raw.parse().map_err(|message| ConfigError::InvalidValue {
                key: "MAILSENSE_ON_CORRUPT".into(),
                message,
            })?;
        }

        if let Some(raw) = lookup("MAILSENSE_MODE") {
            config.mode = raw.parse().map_err(|message| ConfigError::InvalidValue {
                key: "MAILSENSE_MODE".into(),
                message,
            })?;
        }

        config.log_dir = lookup("MAILSENSE_LOG_DIR")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Ok(config)
    }

    /// Workspace rooted at the configured data directory.
    pub fn workspace(&self) -> Workspace {
        Workspace::new(self.data_dir.clone())
    }
}
