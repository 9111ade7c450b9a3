//! Effective due dates.
//!
//! An item's effective due date is its own `dueDate` when set. Otherwise it
//! inherits the earliest `dueDate` among its subitems that are not completed.
//! Completed subitems never contribute, so finishing the most urgent child
//! moves the parent's date to the next open one.

use chrono::NaiveDate;
use serde::Serialize;

use crate::date::{DueBucket, classify};
use crate::model::item::{Status, WorkItem};

/// Where an effective due date came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DueSource {
    Direct,
    Inherited,
}

/// The date used for display and sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EffectiveDueDate {
    pub date: NaiveDate,
    pub source: DueSource,
}

/// Composite filter key matching `due_tomorrow` and `due_2`..`due_7`.
pub const DUE_THIS_WEEK: &str = "due_this_week";

/// Direct date if set, else the minimum non-completed subitem date.
#[must_use]
pub fn effective_due_date(item: &WorkItem) -> Option<EffectiveDueDate> {
    if let Some(date) = item.due_date {
        return Some(EffectiveDueDate {
            date,
            source: DueSource::Direct,
        });
    }

    item.subitems
        .iter()
        .filter(|sub| sub.status != Status::Completed)
        .filter_map(|sub| sub.due_date)
        .min()
        .map(|date| EffectiveDueDate {
            date,
            source: DueSource::Inherited,
        })
}

/// Bucket of the effective due date, if any.
#[must_use]
pub fn effective_bucket(item: &WorkItem, today: NaiveDate) -> Option<DueBucket> {
    effective_due_date(item).map(|due| classify(due.date, today))
}

/// Return `true` if the effective due date is in the past.
#[must_use]
pub fn item_has_overdue(item: &WorkItem, today: NaiveDate) -> bool {
    effective_bucket(item, today) == Some(DueBucket::PastDue)
}

/// Whether `bucket` satisfies the status-category filter `filter_key`.
///
/// Exact key match, plus [`DUE_THIS_WEEK`] which spans tomorrow through day 7.
#[must_use]
pub fn bucket_matches_filter(bucket: DueBucket, filter_key: &str) -> bool {
    if filter_key == DUE_THIS_WEEK {
        return bucket.is_this_week();
    }
    bucket.key() == filter_key
}
