//! Status transitions and the pause overlay.
//!
//! The transition graph is free: every status is reachable from every other,
//! so a mistaken completion can always be undone. What the machine owns are
//! the side effects on timestamps:
//!
//! - every real transition stamps `updatedAt`;
//! - entering `completed` stamps `completedAt`, leaving it clears the field;
//! - on items, entering `cancelled` stamps `cancelledAt`, leaving it clears it.
//!
//! Pausing is metadata about a work session, not a status. It records the
//! reason and the status at pause time and leaves `status` alone.
//!
//! Each operation has a pure `*_patch` form that computes the [`FieldPatch`]
//! without touching the entity (used when the change must first be confirmed
//! by the gateway) and an applying form for local use.
//!
//! Rollups on a parent (effective due date, work time) are not invalidated
//! here; callers recompute them after a subitem transition.

use crate::model::item::{Entity, Status, Timestamp};
use crate::model::patch::{Change, Field, FieldPatch, Patchable};

/// Compute the patch for moving `entity` to `new_status` at `now`.
///
/// Returns `None` when `new_status` equals the current status.
pub fn transition_patch<E: Entity + ?Sized>(
    entity: &E,
    new_status: Status,
    now: Timestamp,
) -> Option<FieldPatch> {
    let current = entity.status();
    if current == new_status {
        return None;
    }

    let mut patch = FieldPatch::new()
        .set(Change::Status(new_status))
        .set(Change::UpdatedAt(now));

    patch = if new_status == Status::Completed {
        patch.set(Change::CompletedAt(now))
    } else {
        patch.clear(Field::CompletedAt)
    };

    if entity.tracks_cancellation() {
        if new_status == Status::Cancelled {
            patch = patch.set(Change::CancelledAt(now));
        } else if current == Status::Cancelled {
            patch = patch.clear(Field::CancelledAt);
        }
    }

    Some(patch)
}

/// Move `entity` to `new_status`, returning the applied patch.
///
/// A same-status call is a no-op and returns `None`.
pub fn change_status<E: Patchable + ?Sized>(
    entity: &mut E,
    new_status: Status,
    now: Timestamp,
) -> Option<FieldPatch> {
    let patch = transition_patch(&*entity, new_status, now)?;
    entity.apply_patch(&patch);
    Some(patch)
}

/// Patch recording a pause with `reason`; `status` is not touched.
pub fn pause_patch<E: Entity + ?Sized>(entity: &E, reason: &str, now: Timestamp) -> FieldPatch {
    FieldPatch::new()
        .set(Change::PausedReason(reason.to_string()))
        .set(Change::PausedPreviousStatus(entity.status()))
        .set(Change::UpdatedAt(now))
}

pub fn pause<E: Patchable + ?Sized>(entity: &mut E, reason: &str, now: Timestamp) -> FieldPatch {
    let patch = pause_patch(&*entity, reason, now);
    entity.apply_patch(&patch);
    patch
}

/// Patch clearing the pause overlay.
#[must_use]
pub fn resume_patch(now: Timestamp) -> FieldPatch {
    FieldPatch::new()
        .clear(Field::PausedReason)
        .clear(Field::PausedPreviousStatus)
        .set(Change::UpdatedAt(now))
}

pub fn resume<E: Patchable + ?Sized>(entity: &mut E, now: Timestamp) -> FieldPatch {
    let patch = resume_patch(now);
    entity.apply_patch(&patch);
    patch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::item::{SubItem, WorkItem};

    fn ts(s: &str) -> Timestamp {
        s.parse().expect("valid timestamp")
    }

    fn item() -> WorkItem {
        WorkItem {
            id: "XACA-0001".to_string(),
            title: "Ship".to_string(),
            ..WorkItem::default()
        }
    }

    #[test]
    fn same_status_is_a_noop() {
        let mut it = item();
        assert!(change_status(&mut it, Status::Todo, ts("2026-01-01T00:00:00Z")).is_none());
        assert!(it.updated_at.is_none());
    }

    #[test]
    fn complete_then_reopen_clears_completed_at() {
        let t0 = ts("2026-01-01T09:00:00Z");
        let t1 = ts("2026-01-02T09:00:00Z");
        let mut it = item();

        change_status(&mut it, Status::Completed, t0);
        assert_eq!(it.status, Status::Completed);
        assert_eq!(it.completed_at, Some(t0));
        assert_eq!(it.updated_at, Some(t0));

        let patch = change_status(&mut it, Status::Todo, t1).expect("transition");
        assert_eq!(it.status, Status::Todo);
        assert!(it.completed_at.is_none());
        assert_eq!(it.updated_at, Some(t1));
        assert!(patch.clear_fields.contains(&Field::CompletedAt));
    }

    #[test]
    fn any_status_reaches_any_other() {
        let all = [
            Status::Todo,
            Status::InProgress,
            Status::Completed,
            Status::Cancelled,
        ];
        let now = ts("2026-01-01T00:00:00Z");
        for from in all {
            for to in all {
                let mut it = WorkItem {
                    status: from,
                    ..item()
                };
                let patch = change_status(&mut it, to, now);
                assert_eq!(patch.is_some(), from != to);
                assert_eq!(it.status, to);
            }
        }
    }

    #[test]
    fn non_completion_transitions_leave_completed_at_cleared_only() {
        let now = ts("2026-01-01T00:00:00Z");
        let patch = transition_patch(&item(), Status::InProgress, now).unwrap();
        assert!(!patch.fields().any(|f| f == Field::CancelledAt));
        assert_eq!(patch.clear_fields, vec![Field::CompletedAt]);
    }

    #[test]
    fn cancellation_is_stamped_on_items_only() {
        let now = ts("2026-01-03T00:00:00Z");
        let mut it = item();
        change_status(&mut it, Status::Cancelled, now);
        assert_eq!(it.cancelled_at, Some(now));
        change_status(&mut it, Status::Todo, now);
        assert!(it.cancelled_at.is_none());

        let sub = SubItem::default();
        let patch = transition_patch(&sub, Status::Cancelled, now).unwrap();
        assert!(!patch.fields().any(|f| f == Field::CancelledAt));
    }

    #[test]
    fn pause_keeps_status_and_records_previous() {
        let now = ts("2026-01-04T00:00:00Z");
        let mut it = WorkItem {
            status: Status::InProgress,
            ..item()
        };
        pause(&mut it, "waiting on review", now);
        assert_eq!(it.status, Status::InProgress);
        assert_eq!(it.paused_reason.as_deref(), Some("waiting on review"));
        assert_eq!(it.paused_previous_status, Some(Status::InProgress));

        resume(&mut it, now);
        assert!(it.paused_reason.is_none());
        assert!(it.paused_previous_status.is_none());
        assert_eq!(it.status, Status::InProgress);
    }

    #[test]
    fn completed_entity_may_still_be_paused() {
        let now = ts("2026-01-04T00:00:00Z");
        let mut sub = SubItem {
            status: Status::Completed,
            ..SubItem::default()
        };
        pause(&mut sub, "handoff", now);
        assert_eq!(sub.status, Status::Completed);
        assert_eq!(sub.paused_previous_status, Some(Status::Completed));
    }
}
