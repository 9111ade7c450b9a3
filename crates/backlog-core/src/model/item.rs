use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::lenient;

/// Wall-clock instant stored on entities (`addedAt`, `updatedAt`, ...).
pub type Timestamp = DateTime<Utc>;

/// The four stored lifecycle states.
///
/// `blocked` is never stored; it is derived from `blocked_by` at filter time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Todo,
    InProgress,
    Completed,
    Cancelled,
}

impl Status {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Completed and cancelled items sink to the end of the active queue.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Four-level priority; `medium` when absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Sort rank, lower first: `critical=0 < high=1 < medium=2 < low=3`.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Critical => 0,
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }
}

/// Which release (and platform build) an item ships in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseAssignment {
    pub release_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

/// A top-level backlog entry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkItem {
    pub id: String,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient::status")]
    pub status: Status,
    #[serde(deserialize_with = "lenient::priority")]
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub blocked_by: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epic_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_assignment: Option<ReleaseAssignment>,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub subitems: Vec<SubItem>,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub collapsed: bool,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub actively_working: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worktree: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worktree_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worktree_window_id: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused_reason: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::optional_status"
    )]
    pub paused_previous_status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<Timestamp>,
}

/// A child unit of work. Never has children of its own.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SubItem {
    pub id: String,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient::status")]
    pub status: Status,
    #[serde(deserialize_with = "lenient::priority")]
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub blocked_by: Vec<String>,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub actively_working: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused_reason: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::optional_status"
    )]
    pub paused_previous_status: Option<Status>,
    /// Elapsed time recorded by the session tracker when the subitem completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_worked_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
}

/// Read access shared by items and subitems.
///
/// Dependency, status and sort logic are written once against this trait.
pub trait Entity {
    fn id(&self) -> &str;
    fn status(&self) -> Status;
    fn priority(&self) -> Priority;
    fn due_date(&self) -> Option<NaiveDate>;
    fn blocked_by(&self) -> &[String];
    fn paused_reason(&self) -> Option<&str>;
    fn completed_at(&self) -> Option<Timestamp>;

    /// Whether moving into or out of `cancelled` stamps `cancelledAt`.
    fn tracks_cancellation(&self) -> bool {
        false
    }
}

impl Entity for WorkItem {
    fn id(&self) -> &str {
        &self.id
    }
    fn status(&self) -> Status {
        self.status
    }
    fn priority(&self) -> Priority {
        self.priority
    }
    fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }
    fn blocked_by(&self) -> &[String] {
        &self.blocked_by
    }
    fn paused_reason(&self) -> Option<&str> {
        self.paused_reason.as_deref()
    }
    fn completed_at(&self) -> Option<Timestamp> {
        self.completed_at
    }
    fn tracks_cancellation(&self) -> bool {
        true
    }
}

impl Entity for SubItem {
    fn id(&self) -> &str {
        &self.id
    }
    fn status(&self) -> Status {
        self.status
    }
    fn priority(&self) -> Priority {
        self.priority
    }
    fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }
    fn blocked_by(&self) -> &[String] {
        &self.blocked_by
    }
    fn paused_reason(&self) -> Option<&str> {
        self.paused_reason.as_deref()
    }
    fn completed_at(&self) -> Option<Timestamp> {
        self.completed_at
    }
}

impl WorkItem {
    /// Timestamp used to order the completed view: completion, else cancellation.
    #[must_use]
    pub fn closed_at(&self) -> Option<Timestamp> {
        self.completed_at.or(self.cancelled_at)
    }
}

/// Width of the numeric suffix on subitem ids.
pub const SUBITEM_SUFFIX_WIDTH: usize = 3;

/// Return `true` if `id` is `parent_id` followed by `-` and a 3-digit suffix
/// (`XACA-0001-007`).
#[must_use]
pub fn is_subitem_of(id: &str, parent_id: &str) -> bool {
    id.strip_prefix(parent_id)
        .and_then(|rest| rest.strip_prefix('-'))
        .is_some_and(|suffix| {
            suffix.len() == SUBITEM_SUFFIX_WIDTH && suffix.bytes().all(|b| b.is_ascii_digit())
        })
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {expected}: '{got}'")]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize(input: &str) -> String {
    input.trim().to_ascii_lowercase().replace('-', "_")
}

impl FromStr for Status {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "todo" => Ok(Self::Todo),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseEnumError {
                expected: "status",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "critical" => Ok(Self::Critical),
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(ParseEnumError {
                expected: "priority",
                got: s.to_string(),
            }),
        }
    }
}
