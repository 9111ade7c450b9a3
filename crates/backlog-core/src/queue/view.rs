//! Annotated view list: the pure `snapshot + config → Vec<ItemView>` core.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use super::QueueConfig;
use super::filter::{apply_filters, display_tags, platform_tag};
use super::sort::{sort_items, sort_subitems};
use crate::date::{DueBucket, classify, format_due};
use crate::due::{EffectiveDueDate, effective_due_date};
use crate::graph::blocking::is_blocked;
use crate::model::item::{Priority, Status, SubItem, WorkItem};
use crate::snapshot::Snapshot;
use crate::worktime::{format_duration, rollup_work_time};

/// One queue row, with everything a renderer needs precomputed.
///
/// The flags are wire fields of the JSON output.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemView {
    pub id: String,
    pub title: String,
    pub status: Status,
    pub priority: Priority,
    pub blocked: bool,
    pub blocked_by: Vec<String>,
    pub paused: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_due: Option<EffectiveDueDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_bucket: Option<DueBucket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_label: Option<String>,
    pub overdue: bool,
    pub work_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_time_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epic_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_id: Option<String>,
    pub actively_working: bool,
    pub collapsed: bool,
    pub subitems: Vec<SubItemView>,
}

/// One subitem row inside an expanded parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubItemView {
    pub id: String,
    pub title: String,
    pub status: Status,
    pub priority: Priority,
    pub blocked: bool,
    pub paused: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_bucket: Option<DueBucket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_worked_ms: Option<u64>,
    pub actively_working: bool,
}

impl SubItemView {
    fn build(sub: &SubItem, today: NaiveDate) -> Self {
        let completed = sub.status == Status::Completed;
        Self {
            id: sub.id.clone(),
            title: sub.title.clone(),
            status: sub.status,
            priority: sub.priority,
            blocked: is_blocked(sub),
            paused: sub.paused_reason.is_some(),
            due_date: sub.due_date,
            due_bucket: sub.due_date.map(|d| classify(d, today)),
            due_label: sub.due_date.map(|d| format_due(d, today, completed)),
            time_worked_ms: sub.time_worked_ms,
            actively_working: sub.actively_working,
        }
    }
}

impl ItemView {
    /// Annotate one item. Rollups are recomputed from the subitems every time.
    #[must_use]
    pub fn build(item: &WorkItem, config: &QueueConfig, today: NaiveDate) -> Self {
        let effective_due = effective_due_date(item);
        let due_bucket = effective_due.map(|due| classify(due.date, today));
        let work_time_ms = rollup_work_time(item);

        Self {
            id: item.id.clone(),
            title: item.title.clone(),
            status: item.status,
            priority: item.priority,
            blocked: is_blocked(item),
            blocked_by: item.blocked_by.clone(),
            paused: item.paused_reason.is_some(),
            paused_reason: item.paused_reason.clone(),
            effective_due,
            due_bucket,
            due_label: effective_due
                .map(|due| format_due(due.date, today, item.status == Status::Completed)),
            overdue: due_bucket == Some(DueBucket::PastDue),
            work_time_ms,
            work_time_label: (work_time_ms > 0).then(|| format_duration(work_time_ms)),
            platform: platform_tag(&item.tags, &config.platform_tags).map(str::to_string),
            tags: display_tags(&item.tags, &config.platform_tags)
                .into_iter()
                .map(str::to_string)
                .collect(),
            category: item.category.clone(),
            epic_id: item.epic_id.clone(),
            release_id: item
                .release_assignment
                .as_ref()
                .map(|r| r.release_id.clone()),
            actively_working: item.actively_working,
            collapsed: item.collapsed,
            subitems: sort_subitems(&item.subitems)
                .into_iter()
                .map(|sub| SubItemView::build(sub, today))
                .collect(),
        }
    }
}

/// Filter, order and annotate the snapshot for one rendering of the queue.
#[must_use]
pub fn build_queue(snapshot: &Snapshot, config: &QueueConfig, today: NaiveDate) -> Vec<ItemView> {
    let filtered = apply_filters(&snapshot.items, config, today);
    let matched = filtered.len();
    let ordered = sort_items(filtered, config.sort, &config.status);

    debug!(
        total = snapshot.items.len(),
        matched,
        sort = %config.sort,
        status = %config.status,
        "queue built"
    );

    ordered
        .into_iter()
        .map(|item| ItemView::build(item, config, today))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::StatusFilter;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 10).expect("valid date")
    }

    #[test]
    fn view_annotates_rollups_and_tags() {
        let item = WorkItem {
            id: "XACA-0001".to_string(),
            title: "Login".to_string(),
            tags: vec!["ios".to_string(), "auth".to_string()],
            subitems: vec![
                SubItem {
                    id: "XACA-0001-001".to_string(),
                    status: Status::Completed,
                    time_worked_ms: Some(90 * 60_000),
                    due_date: NaiveDate::from_ymd_opt(2026, 2, 1),
                    ..SubItem::default()
                },
                SubItem {
                    id: "XACA-0001-002".to_string(),
                    due_date: NaiveDate::from_ymd_opt(2026, 2, 8),
                    ..SubItem::default()
                },
            ],
            ..WorkItem::default()
        };
        let view = ItemView::build(&item, &QueueConfig::default(), today());

        assert_eq!(view.platform.as_deref(), Some("ios"));
        assert_eq!(view.tags, vec!["auth".to_string()]);
        assert_eq!(view.work_time_ms, 90 * 60_000);
        assert_eq!(view.work_time_label.as_deref(), Some("1h 30m"));
        assert_eq!(
            view.effective_due.map(|d| d.date),
            NaiveDate::from_ymd_opt(2026, 2, 8)
        );
        assert!(view.overdue);
        assert_eq!(view.due_label.as_deref(), Some("2 days overdue"));
        // Open subitem first, completed one last with an absolute label.
        assert_eq!(view.subitems[0].id, "XACA-0001-002");
        assert_eq!(view.subitems[1].due_label.as_deref(), Some("Feb 1"));
    }

    #[test]
    fn build_queue_filters_then_sorts() {
        let snapshot = Snapshot {
            items: vec![
                WorkItem {
                    id: "A".to_string(),
                    priority: Priority::Low,
                    ..WorkItem::default()
                },
                WorkItem {
                    id: "B".to_string(),
                    status: Status::Completed,
                    ..WorkItem::default()
                },
                WorkItem {
                    id: "C".to_string(),
                    priority: Priority::High,
                    ..WorkItem::default()
                },
            ],
        };
        let views = build_queue(&snapshot, &QueueConfig::default(), today());
        let ids: Vec<&str> = views.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["C", "A"]);

        let completed = QueueConfig {
            status: StatusFilter::Completed,
            ..QueueConfig::default()
        };
        let views = build_queue(&snapshot, &completed, today());
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].id, "B");
    }
}
