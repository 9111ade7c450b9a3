//! The backlog queue: filter pipeline, total orders, and annotated view.
//!
//! All queue state lives in an explicit [`QueueConfig`] passed to pure
//! functions; nothing here holds module-level state.
//!
//! ## Submodules
//!
//! - [`filter`]: the AND-chain of filter stages.
//! - [`sort`]: priority-mode and due-date-mode comparators, subitem order.
//! - [`view`]: `snapshot + config → Vec<ItemView>`.
//! - [`stats`]: per-category counts for filter badges.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::date::DueBucket;
use crate::due::DUE_THIS_WEEK;
use crate::model::item::ParseEnumError;

pub mod filter;
pub mod sort;
pub mod stats;
pub mod view;

pub use sort::SortMode;
pub use view::{ItemView, SubItemView, build_queue};

/// Tags recognized as OS-platform markers when none are configured.
pub const DEFAULT_PLATFORM_TAGS: &[&str] = &["macos", "windows", "linux", "ios", "android", "web"];

/// Everything that shapes one rendering of the queue.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Free text or a structured prefix (`worktree:`, `branch:`, `working`, `active`).
    pub search: String,
    pub os: OsFilter,
    pub release: AssignmentFilter,
    pub epic: AssignmentFilter,
    pub category: CategoryFilter,
    pub status: StatusFilter,
    pub sort: SortMode,
    /// Tags treated as platform markers (matched case-insensitively).
    pub platform_tags: Vec<String>,
    /// When set, only items whose id is in the set are shown.
    pub spotlight: Option<HashSet<String>>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            search: String::new(),
            os: OsFilter::All,
            release: AssignmentFilter::All,
            epic: AssignmentFilter::All,
            category: CategoryFilter::All,
            status: StatusFilter::All,
            sort: SortMode::Priority,
            platform_tags: DEFAULT_PLATFORM_TAGS
                .iter()
                .map(|t| (*t).to_string())
                .collect(),
            spotlight: None,
        }
    }
}

/// `all | none | <platform>`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OsFilter {
    #[default]
    All,
    None,
    Platform(String),
}

/// `all | assigned | unassigned | <id>` for releases and epics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AssignmentFilter {
    #[default]
    All,
    Assigned,
    Unassigned,
    Id(String),
}

/// `all | none | <category>`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    None,
    Named(String),
}

/// Status-category filter.
///
/// `All` means active only: completed and cancelled items are shown only by
/// `Completed`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    InProgress,
    Paused,
    Blocked,
    /// A due bucket key (`past_due`, `due_3`, ...) or `due_this_week`.
    Due(String),
}

impl StatusFilter {
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::All => "all",
            Self::Completed => "completed",
            Self::InProgress => "in_progress",
            Self::Paused => "paused",
            Self::Blocked => "blocked",
            Self::Due(key) => key,
        }
    }
}

fn normalize(input: &str) -> String {
    input.trim().to_ascii_lowercase()
}

/// Keyword form for fixed vocabularies: `due-this-week` reads as `due_this_week`.
fn normalize_key(input: &str) -> String {
    normalize(input).replace('-', "_")
}

impl FromStr for OsFilter {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "" => Err(ParseEnumError {
                expected: "os filter",
                got: s.to_string(),
            }),
            "all" => Ok(Self::All),
            "none" => Ok(Self::None),
            other => Ok(Self::Platform(other.to_string())),
        }
    }
}

impl FromStr for AssignmentFilter {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "" => Err(ParseEnumError {
                expected: "assignment filter",
                got: s.to_string(),
            }),
            "all" => Ok(Self::All),
            "assigned" => Ok(Self::Assigned),
            "unassigned" => Ok(Self::Unassigned),
            // Ids keep their original case.
            _ => Ok(Self::Id(s.trim().to_string())),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "" => Err(ParseEnumError {
                expected: "category filter",
                got: s.to_string(),
            }),
            "all" => Ok(Self::All),
            "none" => Ok(Self::None),
            _ => Ok(Self::Named(s.trim().to_string())),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize_key(s);
        match normalized.as_str() {
            "all" => Ok(Self::All),
            "completed" => Ok(Self::Completed),
            "in_progress" => Ok(Self::InProgress),
            "paused" => Ok(Self::Paused),
            "blocked" => Ok(Self::Blocked),
            DUE_THIS_WEEK => Ok(Self::Due(normalized)),
            other => other
                .parse::<DueBucket>()
                .map(|bucket| Self::Due(bucket.key().into_owned()))
                .map_err(|_| ParseEnumError {
                    expected: "status filter",
                    got: s.to_string(),
                }),
        }
    }
}

impl fmt::Display for OsFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::None => f.write_str("none"),
            Self::Platform(p) => f.write_str(p),
        }
    }
}

impl fmt::Display for AssignmentFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Assigned => f.write_str("assigned"),
            Self::Unassigned => f.write_str("unassigned"),
            Self::Id(id) => f.write_str(id),
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::None => f.write_str("none"),
            Self::Named(c) => f.write_str(c),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
