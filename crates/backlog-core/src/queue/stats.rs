//! Per-category counts for filter badges.

use chrono::NaiveDate;
use serde::Serialize;

use super::StatusFilter;
use super::filter::matches_status;
use crate::due::DUE_THIS_WEEK;
use crate::model::item::WorkItem;

/// How many items each status-category filter would show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CategoryCounts {
    pub all: usize,
    pub in_progress: usize,
    pub paused: usize,
    pub blocked: usize,
    pub completed: usize,
    pub past_due: usize,
    pub due_today: usize,
    pub due_this_week: usize,
}

/// Count items per status category, ignoring every other filter stage.
#[must_use]
pub fn category_counts(items: &[WorkItem], today: NaiveDate) -> CategoryCounts {
    let count = |filter: &StatusFilter| {
        items
            .iter()
            .filter(|item| matches_status(item, filter, today))
            .count()
    };

    CategoryCounts {
        all: count(&StatusFilter::All),
        in_progress: count(&StatusFilter::InProgress),
        paused: count(&StatusFilter::Paused),
        blocked: count(&StatusFilter::Blocked),
        completed: count(&StatusFilter::Completed),
        past_due: count(&StatusFilter::Due("past_due".to_string())),
        due_today: count(&StatusFilter::Due("due_today".to_string())),
        due_this_week: count(&StatusFilter::Due(DUE_THIS_WEEK.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::item::Status;

    #[test]
    fn counts_each_category() {
        let today = NaiveDate::from_ymd_opt(2026, 2, 10).expect("valid date");
        let items = vec![
            WorkItem {
                status: Status::InProgress,
                due_date: NaiveDate::from_ymd_opt(2026, 2, 9),
                ..WorkItem::default()
            },
            WorkItem {
                blocked_by: vec!["X".to_string()],
                due_date: Some(today),
                paused_reason: Some("waiting".to_string()),
                ..WorkItem::default()
            },
            WorkItem {
                due_date: NaiveDate::from_ymd_opt(2026, 2, 12),
                ..WorkItem::default()
            },
            WorkItem {
                status: Status::Cancelled,
                due_date: NaiveDate::from_ymd_opt(2026, 2, 1),
                ..WorkItem::default()
            },
        ];
        let counts = category_counts(&items, today);
        assert_eq!(
            counts,
            CategoryCounts {
                all: 3,
                in_progress: 1,
                paused: 1,
                blocked: 1,
                completed: 1,
                past_due: 1,
                due_today: 1,
                due_this_week: 1,
            }
        );
    }
}
