//! Work-time rollup from subitems to their parent.
//!
//! `timeWorkedMs` is written by the external session tracker; the engine
//! stores it verbatim. Only completed subitems count toward the parent, even
//! when an open subitem already carries banked time from an earlier session.

use crate::model::item::{Status, WorkItem};

const MINUTE_MS: u64 = 60_000;
const HOUR_MINUTES: u64 = 60;
const DAY_HOURS: u64 = 24;

/// Sum of `time_worked_ms` over completed subitems.
#[must_use]
pub fn rollup_work_time(item: &WorkItem) -> u64 {
    item.subitems
        .iter()
        .filter(|sub| sub.status == Status::Completed)
        .filter_map(|sub| sub.time_worked_ms)
        .fold(0_u64, u64::saturating_add)
}

/// Compact duration: `< 1m`, `42m`, `3h 5m`, `2d 4h`.
///
/// At most two units; the smaller unit is floored, never rounded.
#[must_use]
pub fn format_duration(ms: u64) -> String {
    let total_minutes = ms / MINUTE_MS;
    if total_minutes == 0 {
        return "< 1m".to_string();
    }
    if total_minutes < HOUR_MINUTES {
        return format!("{total_minutes}m");
    }
    let total_hours = total_minutes / HOUR_MINUTES;
    if total_hours < DAY_HOURS {
        return format!("{total_hours}h {}m", total_minutes % HOUR_MINUTES);
    }
    format!("{}d {}h", total_hours / DAY_HOURS, total_hours % DAY_HOURS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::item::SubItem;

    fn sub(status: Status, ms: Option<u64>) -> SubItem {
        SubItem {
            status,
            time_worked_ms: ms,
            ..SubItem::default()
        }
    }

    #[test]
    fn only_completed_subitems_count() {
        let item = WorkItem {
            subitems: vec![
                sub(Status::InProgress, Some(500)),
                sub(Status::Completed, Some(500)),
                sub(Status::Completed, None),
                sub(Status::Cancelled, Some(9_000)),
            ],
            ..WorkItem::default()
        };
        assert_eq!(rollup_work_time(&item), 500);
    }

    #[test]
    fn no_subitems_rolls_up_to_zero() {
        assert_eq!(rollup_work_time(&WorkItem::default()), 0);
    }

    #[test]
    fn duration_units() {
        assert_eq!(format_duration(0), "< 1m");
        assert_eq!(format_duration(59_999), "< 1m");
        assert_eq!(format_duration(60_000), "1m");
        assert_eq!(format_duration(59 * 60_000 + 59_999), "59m");
        assert_eq!(format_duration(60 * 60_000), "1h 0m");
        assert_eq!(format_duration((3 * 60 + 5) * 60_000 + 59_000), "3h 5m");
        assert_eq!(format_duration(24 * 60 * 60_000), "1d 0h");
        assert_eq!(format_duration((2 * 24 + 4) * 60 * 60_000 + 59 * 60_000), "2d 4h");
    }
}
