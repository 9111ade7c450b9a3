//! Filter pipeline.
//!
//! Stages run as an AND-chain in a fixed order and the first failing stage
//! excludes the item:
//!
//! 1. spotlight (when set)
//! 2. text search or structured prefix
//! 3. OS platform tag
//! 4. release assignment
//! 5. epic assignment
//! 6. category
//! 7. status category

use chrono::NaiveDate;

use super::{AssignmentFilter, CategoryFilter, OsFilter, QueueConfig, StatusFilter};
use crate::due::{bucket_matches_filter, effective_bucket};
use crate::graph::blocking::is_blocked;
use crate::model::item::{Status, WorkItem};

const WORKTREE_PREFIX: &str = "worktree:";
const BRANCH_PREFIX: &str = "branch:";

/// First tag that is a recognized platform marker.
#[must_use]
pub fn platform_tag<'a>(tags: &'a [String], platform_tags: &[String]) -> Option<&'a str> {
    tags.iter()
        .find(|tag| is_platform_tag(tag, platform_tags))
        .map(String::as_str)
}

/// Tags for generic display: everything except the platform marker.
#[must_use]
pub fn display_tags<'a>(tags: &'a [String], platform_tags: &[String]) -> Vec<&'a str> {
    let platform = platform_tag(tags, platform_tags);
    tags.iter()
        .map(String::as_str)
        .filter(|tag| Some(*tag) != platform)
        .collect()
}

fn is_platform_tag(tag: &str, platform_tags: &[String]) -> bool {
    platform_tags.iter().any(|p| p.eq_ignore_ascii_case(tag))
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

fn opt_contains_ci(haystack: Option<&str>, needle_lower: &str) -> bool {
    haystack.is_some_and(|h| contains_ci(h, needle_lower))
}

/// Text search stage.
///
/// An empty query matches everything. `worktree:<s>` and `branch:<s>` match
/// on the session worktree path and branch; the bare words `working` and
/// `active` match items where the item or any subitem is actively worked.
/// Anything else is a case-insensitive substring over title, description,
/// id, category and tags of the item and its subitems.
#[must_use]
pub fn matches_search(item: &WorkItem, query: &str) -> bool {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return true;
    }

    if let Some(rest) = q.strip_prefix(WORKTREE_PREFIX) {
        return opt_contains_ci(item.worktree.as_deref(), rest.trim());
    }
    if let Some(rest) = q.strip_prefix(BRANCH_PREFIX) {
        return opt_contains_ci(item.worktree_branch.as_deref(), rest.trim());
    }
    if q == "working" || q == "active" {
        return item.actively_working || item.subitems.iter().any(|s| s.actively_working);
    }

    let item_hit = contains_ci(&item.title, &q)
        || opt_contains_ci(item.description.as_deref(), &q)
        || contains_ci(&item.id, &q)
        || opt_contains_ci(item.category.as_deref(), &q)
        || item.tags.iter().any(|t| contains_ci(t, &q));
    item_hit
        || item.subitems.iter().any(|sub| {
            contains_ci(&sub.title, &q)
                || opt_contains_ci(sub.description.as_deref(), &q)
                || contains_ci(&sub.id, &q)
                || sub.tags.iter().any(|t| contains_ci(t, &q))
        })
}

#[must_use]
pub fn matches_os(item: &WorkItem, filter: &OsFilter, platform_tags: &[String]) -> bool {
    match filter {
        OsFilter::All => true,
        OsFilter::None => platform_tag(&item.tags, platform_tags).is_none(),
        OsFilter::Platform(p) => {
            platform_tag(&item.tags, platform_tags).is_some_and(|t| t.eq_ignore_ascii_case(p))
        }
    }
}

fn matches_assignment(assigned: Option<&str>, filter: &AssignmentFilter) -> bool {
    match filter {
        AssignmentFilter::All => true,
        AssignmentFilter::Assigned => assigned.is_some(),
        AssignmentFilter::Unassigned => assigned.is_none(),
        AssignmentFilter::Id(id) => assigned == Some(id.as_str()),
    }
}

#[must_use]
pub fn matches_release(item: &WorkItem, filter: &AssignmentFilter) -> bool {
    matches_assignment(
        item.release_assignment
            .as_ref()
            .map(|r| r.release_id.as_str()),
        filter,
    )
}

#[must_use]
pub fn matches_epic(item: &WorkItem, filter: &AssignmentFilter) -> bool {
    matches_assignment(item.epic_id.as_deref(), filter)
}

#[must_use]
pub fn matches_category(item: &WorkItem, filter: &CategoryFilter) -> bool {
    let category = item.category.as_deref().filter(|c| !c.trim().is_empty());
    match filter {
        CategoryFilter::All => true,
        CategoryFilter::None => category.is_none(),
        CategoryFilter::Named(name) => category == Some(name.as_str()),
    }
}

/// Status-category stage.
///
/// `completed` shows completed and cancelled items; every other key hides
/// them and then applies its own test.
#[must_use]
pub fn matches_status(item: &WorkItem, filter: &StatusFilter, today: NaiveDate) -> bool {
    let closed = item.status.is_closed();
    if *filter == StatusFilter::Completed {
        return closed;
    }
    if closed {
        return false;
    }
    match filter {
        StatusFilter::All | StatusFilter::Completed => true,
        StatusFilter::InProgress => item.status == Status::InProgress,
        StatusFilter::Paused => item.paused_reason.is_some(),
        StatusFilter::Blocked => is_blocked(item),
        StatusFilter::Due(key) => {
            effective_bucket(item, today).is_some_and(|bucket| bucket_matches_filter(bucket, key))
        }
    }
}

/// The full predicate: every stage must pass.
#[must_use]
pub fn matches(item: &WorkItem, config: &QueueConfig, today: NaiveDate) -> bool {
    if let Some(spotlight) = &config.spotlight {
        if !spotlight.contains(&item.id) {
            return false;
        }
    }
    matches_search(item, &config.search)
        && matches_os(item, &config.os, &config.platform_tags)
        && matches_release(item, &config.release)
        && matches_epic(item, &config.epic)
        && matches_category(item, &config.category)
        && matches_status(item, &config.status, today)
}

/// Items passing every stage, in input order.
#[must_use]
pub fn apply_filters<'a>(
    items: &'a [WorkItem],
    config: &QueueConfig,
    today: NaiveDate,
) -> Vec<&'a WorkItem> {
    items
        .iter()
        .filter(|item| matches(item, config, today))
        .collect()
}
