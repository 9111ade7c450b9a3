//! Queue orderings.
//!
//! Each ordering is a comparator chain evaluated left to right; the first
//! non-`Equal` stage wins and remaining ties keep input order.
//!
//! Priority mode:
//! 1. open before closed (in the completed view: most recently closed first)
//! 2. priority rank
//! 3. [`blocker_first`]
//! 4. has an effective due date before has none
//! 5. earlier effective due date
//!
//! Due-date mode keeps stages 1 and 3, then orders by has-date, date, and
//! only then priority.
//!
//! Subitems inside an expanded parent: completed last (most recent first),
//! [`blocker_first`], ascending due date with undated last, priority rank.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use super::StatusFilter;
use crate::due::effective_due_date;
use crate::graph::blocking::blocker_first;
use crate::model::item::{ParseEnumError, Status, SubItem, WorkItem};

/// Which total order the queue uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    Priority,
    DueDate,
}

impl SortMode {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Priority => "priority",
            Self::DueDate => "due_date",
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "priority" => Ok(Self::Priority),
            "due_date" | "due" | "date" => Ok(Self::DueDate),
            _ => Err(ParseEnumError {
                expected: "sort mode",
                got: s.to_string(),
            }),
        }
    }
}

/// An item with its effective due date resolved once for sorting.
#[derive(Debug, Clone, Copy)]
pub struct SortKey<'a> {
    pub item: &'a WorkItem,
    pub effective_due: Option<NaiveDate>,
}

impl<'a> SortKey<'a> {
    #[must_use]
    pub fn new(item: &'a WorkItem) -> Self {
        Self {
            item,
            effective_due: effective_due_date(item).map(|d| d.date),
        }
    }
}

fn closed_stage(a: &SortKey<'_>, b: &SortKey<'_>, completed_view: bool) -> Ordering {
    if completed_view {
        b.item.closed_at().cmp(&a.item.closed_at())
    } else {
        a.item
            .status
            .is_closed()
            .cmp(&b.item.status.is_closed())
    }
}

fn has_date_stage(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    b.is_some().cmp(&a.is_some())
}

fn date_stage(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => Ordering::Equal,
    }
}

fn priority_stage(a: &WorkItem, b: &WorkItem) -> Ordering {
    a.priority.rank().cmp(&b.priority.rank())
}

/// Priority-mode comparator.
#[must_use]
pub fn compare_priority_mode(a: &SortKey<'_>, b: &SortKey<'_>, completed_view: bool) -> Ordering {
    closed_stage(a, b, completed_view)
        .then_with(|| priority_stage(a.item, b.item))
        .then_with(|| blocker_first(a.item, b.item))
        .then_with(|| has_date_stage(a.effective_due, b.effective_due))
        .then_with(|| date_stage(a.effective_due, b.effective_due))
}

/// Due-date-mode comparator: the date dominates, priority breaks the last tie.
#[must_use]
pub fn compare_due_date_mode(a: &SortKey<'_>, b: &SortKey<'_>, completed_view: bool) -> Ordering {
    closed_stage(a, b, completed_view)
        .then_with(|| blocker_first(a.item, b.item))
        .then_with(|| has_date_stage(a.effective_due, b.effective_due))
        .then_with(|| date_stage(a.effective_due, b.effective_due))
        .then_with(|| priority_stage(a.item, b.item))
}

/// Order items for the queue. Stable: full ties keep input order.
#[must_use]
pub fn sort_items<'a>(
    items: Vec<&'a WorkItem>,
    mode: SortMode,
    status_filter: &StatusFilter,
) -> Vec<&'a WorkItem> {
    let completed_view = *status_filter == StatusFilter::Completed;
    let mut keys: Vec<SortKey<'a>> = items.into_iter().map(SortKey::new).collect();
    match mode {
        SortMode::Priority => {
            stable_sort_by(&mut keys, &mut |a, b| compare_priority_mode(a, b, completed_view));
        }
        SortMode::DueDate => {
            stable_sort_by(&mut keys, &mut |a, b| compare_due_date_mode(a, b, completed_view));
        }
    }
    keys.into_iter().map(|key| key.item).collect()
}

/// Subitem-local comparator.
#[must_use]
pub fn compare_subitems(a: &SubItem, b: &SubItem) -> Ordering {
    let a_done = a.status == Status::Completed;
    let b_done = b.status == Status::Completed;
    a_done
        .cmp(&b_done)
        .then_with(|| {
            if a_done && b_done {
                b.completed_at.cmp(&a.completed_at)
            } else {
                Ordering::Equal
            }
        })
        .then_with(|| blocker_first(a, b))
        .then_with(|| {
            // Undated sorts as +infinity.
            let a_key = (a.due_date.is_none(), a.due_date);
            let b_key = (b.due_date.is_none(), b.due_date);
            a_key.cmp(&b_key)
        })
        .then_with(|| a.priority.rank().cmp(&b.priority.rank()))
}

/// Subitems in display order. Stable.
#[must_use]
pub fn sort_subitems(subitems: &[SubItem]) -> Vec<&SubItem> {
    let mut ordered: Vec<&SubItem> = subitems.iter().collect();
    stable_sort_by(&mut ordered, &mut |a, b| compare_subitems(a, b));
    ordered
}

/// Top-down merge sort that only moves an element ahead of an earlier one
/// when the comparator says strictly `Less`.
///
/// The comparator chains include [`blocker_first`], which is not transitive,
/// so they are not total orders; `slice::sort_by` may panic on those.
fn stable_sort_by<T: Copy>(items: &mut Vec<T>, cmp: &mut impl FnMut(&T, &T) -> Ordering) {
    if items.len() < 2 {
        return;
    }
    let right = items.split_off(items.len() / 2);
    let mut left = std::mem::take(items);
    let mut right = right;
    stable_sort_by(&mut left, cmp);
    stable_sort_by(&mut right, cmp);

    items.reserve(left.len() + right.len());
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        if cmp(&right[j], &left[i]) == Ordering::Less {
            items.push(right[j]);
            j += 1;
        } else {
            items.push(left[i]);
            i += 1;
        }
    }
    items.extend_from_slice(&left[i..]);
    items.extend_from_slice(&right[j..]);
}
