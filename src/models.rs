//! Frontend Models
//!
//! Data structures matching the task service's JSON and the board markup.

use serde::{Deserialize, Deserializer, Serialize};

/// Ids arrive as numbers from the server and as strings from `data-*`
/// attributes; both are kept as the opaque string.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => s,
        }
    }
}

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                RawId::deserialize(deserializer).map(|raw| Self(raw.into_string()))
            }
        }
    };
}

opaque_id!(
    /// Task identifier (`data-task-id`)
    TaskId
);
opaque_id!(
    /// List identifier (the `<id>` in `tasks-<id>`)
    ListId
);

/// Task priority and the Bootstrap color it renders with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

/// Color used when the priority is unknown
pub const FALLBACK_COLOR: &str = "secondary";

impl Priority {
    pub fn color(&self) -> &'static str {
        match self {
            Priority::Low => "success",
            Priority::Medium => "warning",
            Priority::High => "danger",
            Priority::Critical => "dark",
        }
    }

    pub fn from_color(color: &str) -> Option<Self> {
        match color {
            "success" => Some(Priority::Low),
            "warning" => Some(Priority::Medium),
            "danger" => Some(Priority::High),
            "dark" => Some(Priority::Critical),
            _ => None,
        }
    }
}

/// Task as returned by quick-create
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    /// Display label chosen by the server, e.g. "Medium"
    #[serde(rename = "priority", default)]
    pub priority_label: String,
    #[serde(default)]
    pub priority_color: String,
    #[serde(default)]
    pub completed: bool,
}

impl Task {
    pub fn priority(&self) -> Option<Priority> {
        Priority::from_color(&self.priority_color)
    }

    pub fn badge_color(&self) -> &'static str {
        self.priority().map(|p| p.color()).unwrap_or(FALLBACK_COLOR)
    }
}

/// A move as sent to the server: `task` ends up at `position` in `list`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRequest {
    pub task: TaskId,
    pub list: ListId,
    pub position: usize,
}

/// Notification severity, matching Bootstrap's alert variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Danger,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Danger => "danger",
        }
    }
}
