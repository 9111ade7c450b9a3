//! The engine's working copy of one team's backlog.
//!
//! [`Backlog`] owns the current [`Snapshot`], the id index over it, and the
//! per-item rollups (effective due date, completed work time). Every write
//! goes through a [`MutationGateway`] first; the local copy changes only
//! after the gateway reports success. A failed call leaves the backlog
//! exactly as it was.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::due::{EffectiveDueDate, effective_due_date};
use crate::model::item::{Priority, ReleaseAssignment, Status, SubItem, Timestamp, WorkItem};
use crate::model::patch::{Change, Field, FieldPatch, Patchable};
use crate::mutation::{MutationError, MutationGateway, MutationRequest};
use crate::queue::{ItemView, QueueConfig, build_queue};
use crate::snapshot::{IdIndex, Location, ReconcileReport, Snapshot, reconcile_snapshots};
use crate::status::{pause_patch, resume_patch, transition_patch};
use crate::worktime::rollup_work_time;

/// Cached per-item aggregates, recomputed whenever the item or one of its
/// subitems changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ItemRollup {
    pub effective_due: Option<EffectiveDueDate>,
    pub work_time_ms: u64,
}

impl ItemRollup {
    fn compute(item: &WorkItem) -> Self {
        Self {
            effective_due: effective_due_date(item),
            work_time_ms: rollup_work_time(item),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Backlog {
    team: String,
    snapshot: Snapshot,
    index: IdIndex,
    rollups: HashMap<String, ItemRollup>,
}

impl Backlog {
    #[must_use]
    pub fn new(team: impl Into<String>, snapshot: Snapshot) -> Self {
        let mut backlog = Self {
            team: team.into(),
            index: IdIndex::build(&snapshot),
            snapshot,
            rollups: HashMap::new(),
        };
        backlog.refresh_all_rollups();
        backlog
    }

    #[must_use]
    pub fn team(&self) -> &str {
        &self.team
    }

    #[must_use]
    pub const fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    #[must_use]
    pub fn items(&self) -> &[WorkItem] {
        &self.snapshot.items
    }

    /// Replace the working copy with a freshly loaded snapshot.
    ///
    /// Collapsed flags are carried over by title before the swap; the id
    /// index and rollups are rebuilt afterwards.
    pub fn reconcile(&mut self, mut incoming: Snapshot) -> ReconcileReport {
        let report = reconcile_snapshots(&self.snapshot, &mut incoming);
        self.snapshot = incoming;
        self.index = IdIndex::build(&self.snapshot);
        self.refresh_all_rollups();
        info!(
            team = %self.team,
            added = report.added.len(),
            removed = report.removed.len(),
            changed = report.changed.len(),
            collapsed_restored = report.collapsed_restored,
            "backlog reconciled"
        );
        report
    }

    #[must_use]
    pub fn locate(&self, id: &str) -> Option<Location> {
        self.index.get(id)
    }

    #[must_use]
    pub fn item(&self, id: &str) -> Option<&WorkItem> {
        match self.locate(id)? {
            Location::Item(i) => self.snapshot.items.get(i),
            Location::Subitem { .. } => None,
        }
    }

    /// A subitem together with its parent.
    #[must_use]
    pub fn subitem(&self, id: &str) -> Option<(&WorkItem, &SubItem)> {
        match self.locate(id)? {
            Location::Subitem { item, subitem } => {
                let parent = self.snapshot.items.get(item)?;
                Some((parent, parent.subitems.get(subitem)?))
            }
            Location::Item(_) => None,
        }
    }

    #[must_use]
    pub fn rollup(&self, item_id: &str) -> Option<&ItemRollup> {
        self.rollups.get(item_id)
    }

    /// The ordered, annotated queue for the current working copy.
    #[must_use]
    pub fn queue(&self, config: &QueueConfig, today: NaiveDate) -> Vec<ItemView> {
        build_queue(&self.snapshot, config, today)
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Move an item or subitem to `status`.
    ///
    /// Returns `Ok(None)` without contacting the gateway when the entity
    /// already has that status.
    ///
    /// # Errors
    ///
    /// [`MutationError::NotFound`] for unknown ids, [`MutationError::Gateway`]
    /// if the gateway call fails.
    pub fn change_status<G: MutationGateway + ?Sized>(
        &mut self,
        gateway: &mut G,
        id: &str,
        status: Status,
        now: Timestamp,
    ) -> Result<Option<FieldPatch>, MutationError> {
        let location = self.require(id)?;
        let Some(patch) = transition_patch(self.entity(location)?, status, now) else {
            return Ok(None);
        };
        self.commit(gateway, location, patch).map(Some)
    }

    /// Record a pause with a reason. The status is left as it is.
    ///
    /// # Errors
    ///
    /// [`MutationError::Validation`] when `reason` is blank, otherwise as for
    /// [`Self::change_status`].
    pub fn pause<G: MutationGateway + ?Sized>(
        &mut self,
        gateway: &mut G,
        id: &str,
        reason: &str,
        now: Timestamp,
    ) -> Result<FieldPatch, MutationError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(MutationError::Validation(
                "a pause reason is required".to_string(),
            ));
        }
        let location = self.require(id)?;
        let patch = pause_patch(self.entity(location)?, reason, now);
        self.commit(gateway, location, patch)
    }

    /// Clear the pause overlay.
    ///
    /// # Errors
    ///
    /// As for [`Self::change_status`].
    pub fn resume<G: MutationGateway + ?Sized>(
        &mut self,
        gateway: &mut G,
        id: &str,
        now: Timestamp,
    ) -> Result<FieldPatch, MutationError> {
        let location = self.require(id)?;
        self.commit(gateway, location, resume_patch(now))
    }

    /// # Errors
    ///
    /// As for [`Self::change_status`].
    pub fn set_due_date<G: MutationGateway + ?Sized>(
        &mut self,
        gateway: &mut G,
        id: &str,
        date: NaiveDate,
        now: Timestamp,
    ) -> Result<FieldPatch, MutationError> {
        let patch = FieldPatch::new()
            .set(Change::DueDate(date))
            .set(Change::UpdatedAt(now));
        self.update(gateway, id, patch)
    }

    /// Remove the due date entirely (sent as `clearFields: ["dueDate"]`).
    ///
    /// # Errors
    ///
    /// As for [`Self::change_status`].
    pub fn clear_due_date<G: MutationGateway + ?Sized>(
        &mut self,
        gateway: &mut G,
        id: &str,
        now: Timestamp,
    ) -> Result<FieldPatch, MutationError> {
        let patch = FieldPatch::new()
            .clear(Field::DueDate)
            .set(Change::UpdatedAt(now));
        self.update(gateway, id, patch)
    }

    /// # Errors
    ///
    /// As for [`Self::change_status`].
    pub fn set_priority<G: MutationGateway + ?Sized>(
        &mut self,
        gateway: &mut G,
        id: &str,
        priority: Priority,
        now: Timestamp,
    ) -> Result<FieldPatch, MutationError> {
        let patch = FieldPatch::new()
            .set(Change::Priority(priority))
            .set(Change::UpdatedAt(now));
        self.update(gateway, id, patch)
    }

    /// Assign an item to a release, optionally pinned to a platform.
    ///
    /// # Errors
    ///
    /// [`MutationError::Validation`] when `release_id` is blank or `id` names
    /// a subitem, otherwise as for [`Self::change_status`].
    pub fn assign_release<G: MutationGateway + ?Sized>(
        &mut self,
        gateway: &mut G,
        id: &str,
        release_id: &str,
        platform: Option<&str>,
        now: Timestamp,
    ) -> Result<FieldPatch, MutationError> {
        let release_id = release_id.trim();
        if release_id.is_empty() {
            return Err(MutationError::Validation(
                "select a release before assigning".to_string(),
            ));
        }
        let assignment = ReleaseAssignment {
            release_id: release_id.to_string(),
            platform: platform
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
        };
        let patch = FieldPatch::new()
            .set(Change::ReleaseAssignment(assignment))
            .set(Change::UpdatedAt(now));
        self.update(gateway, id, patch)
    }

    /// # Errors
    ///
    /// As for [`Self::assign_release`].
    pub fn unassign_release<G: MutationGateway + ?Sized>(
        &mut self,
        gateway: &mut G,
        id: &str,
        now: Timestamp,
    ) -> Result<FieldPatch, MutationError> {
        let patch = FieldPatch::new()
            .clear(Field::ReleaseAssignment)
            .set(Change::UpdatedAt(now));
        self.update(gateway, id, patch)
    }

    /// # Errors
    ///
    /// [`MutationError::Validation`] when `epic_id` is blank or `id` names a
    /// subitem, otherwise as for [`Self::change_status`].
    pub fn assign_epic<G: MutationGateway + ?Sized>(
        &mut self,
        gateway: &mut G,
        id: &str,
        epic_id: &str,
        now: Timestamp,
    ) -> Result<FieldPatch, MutationError> {
        let epic_id = epic_id.trim();
        if epic_id.is_empty() {
            return Err(MutationError::Validation(
                "select an epic before assigning".to_string(),
            ));
        }
        let patch = FieldPatch::new()
            .set(Change::EpicId(epic_id.to_string()))
            .set(Change::UpdatedAt(now));
        self.update(gateway, id, patch)
    }

    /// # Errors
    ///
    /// As for [`Self::assign_epic`].
    pub fn unassign_epic<G: MutationGateway + ?Sized>(
        &mut self,
        gateway: &mut G,
        id: &str,
        now: Timestamp,
    ) -> Result<FieldPatch, MutationError> {
        let patch = FieldPatch::new()
            .clear(Field::EpicId)
            .set(Change::UpdatedAt(now));
        self.update(gateway, id, patch)
    }

    /// Flip an item's expand/collapse flag and return the new value.
    ///
    /// # Errors
    ///
    /// [`MutationError::Validation`] for subitem ids, otherwise as for
    /// [`Self::change_status`].
    pub fn toggle_collapsed<G: MutationGateway + ?Sized>(
        &mut self,
        gateway: &mut G,
        id: &str,
    ) -> Result<bool, MutationError> {
        let Location::Item(i) = self.require(id)? else {
            return Err(MutationError::Validation(
                "only items can be collapsed".to_string(),
            ));
        };
        let item = self.item_at(i)?;
        let collapsed = !item.collapsed;
        let request = MutationRequest::ToggleCollapsed {
            team: self.team.clone(),
            id: item.id.clone(),
            collapsed,
        };
        self.send(gateway, &request)?;
        if let Some(item) = self.snapshot.items.get_mut(i) {
            item.collapsed = collapsed;
        }
        info!(team = %self.team, id, collapsed, "collapsed state saved");
        Ok(collapsed)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn require(&self, id: &str) -> Result<Location, MutationError> {
        self.locate(id).ok_or_else(|| MutationError::NotFound {
            id: id.to_string(),
        })
    }

    fn item_at(&self, i: usize) -> Result<&WorkItem, MutationError> {
        self.snapshot.items.get(i).ok_or_else(stale_index)
    }

    fn entity(&self, location: Location) -> Result<&dyn Patchable, MutationError> {
        match location {
            Location::Item(i) => Ok(self.item_at(i)? as &dyn Patchable),
            Location::Subitem { item, subitem } => {
                let sub = self
                    .item_at(item)?
                    .subitems
                    .get(subitem)
                    .ok_or_else(stale_index)?;
                Ok(sub as &dyn Patchable)
            }
        }
    }

    fn entity_mut(&mut self, location: Location) -> Option<&mut dyn Patchable> {
        match location {
            Location::Item(i) => Some(self.snapshot.items.get_mut(i)? as &mut dyn Patchable),
            Location::Subitem { item, subitem } => {
                let sub = self.snapshot.items.get_mut(item)?.subitems.get_mut(subitem)?;
                Some(sub as &mut dyn Patchable)
            }
        }
    }

    fn update<G: MutationGateway + ?Sized>(
        &mut self,
        gateway: &mut G,
        id: &str,
        patch: FieldPatch,
    ) -> Result<FieldPatch, MutationError> {
        let location = self.require(id)?;
        self.commit(gateway, location, patch)
    }

    /// Validate, send, and on success apply `patch` to the entity at `location`.
    fn commit<G: MutationGateway + ?Sized>(
        &mut self,
        gateway: &mut G,
        location: Location,
        patch: FieldPatch,
    ) -> Result<FieldPatch, MutationError> {
        let entity = self.entity(location)?;
        if let Some(field) = patch.fields().find(|f| !entity.accepts(*f)) {
            return Err(MutationError::Validation(format!(
                "{field:?} can only be set on items, not subitems"
            )));
        }
        let id = entity.id().to_string();
        let request = self.request_for(location, &id, patch.clone())?;
        self.send(gateway, &request)?;

        if let Some(target) = self.entity_mut(location) {
            target.apply_patch(&patch);
        }
        let parent = match location {
            Location::Item(i) | Location::Subitem { item: i, .. } => i,
        };
        self.refresh_rollup(parent);

        info!(
            team = %self.team,
            op = request.op(),
            id = %id,
            updates = patch.updates.len(),
            cleared = patch.clear_fields.len(),
            "mutation applied"
        );
        Ok(patch)
    }

    fn request_for(
        &self,
        location: Location,
        id: &str,
        patch: FieldPatch,
    ) -> Result<MutationRequest, MutationError> {
        let team = self.team.clone();
        Ok(match location {
            Location::Item(_) => MutationRequest::UpdateItem {
                team,
                id: id.to_string(),
                patch,
            },
            Location::Subitem { item, .. } => MutationRequest::UpdateSubitem {
                team,
                parent_id: self.item_at(item)?.id.clone(),
                subitem_id: id.to_string(),
                patch,
            },
        })
    }

    fn send<G: MutationGateway + ?Sized>(
        &self,
        gateway: &mut G,
        request: &MutationRequest,
    ) -> Result<(), MutationError> {
        gateway.send(request).map_err(|err| {
            warn!(
                team = %self.team,
                op = request.op(),
                id = request.target_id(),
                error = %err,
                "mutation failed; local state unchanged"
            );
            MutationError::Gateway(err)
        })
    }

    fn refresh_all_rollups(&mut self) {
        self.rollups.clear();
        for item in &self.snapshot.items {
            self.rollups
                .entry(item.id.clone())
                .or_insert_with(|| ItemRollup::compute(item));
        }
    }

    fn refresh_rollup(&mut self, i: usize) {
        if let Some(item) = self.snapshot.items.get(i) {
            self.rollups.insert(item.id.clone(), ItemRollup::compute(item));
        }
    }
}

fn stale_index() -> MutationError {
    MutationError::Validation("id index is out of date; reload the backlog".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::due::DueSource;
    use crate::mutation::GatewayError;
    use chrono::{DateTime, Utc};

    fn ts(s: &str) -> Timestamp {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[derive(Default)]
    struct Recording {
        sent: Vec<MutationRequest>,
        fail: bool,
    }

    impl MutationGateway for Recording {
        fn send(&mut self, request: &MutationRequest) -> Result<(), GatewayError> {
            if self.fail {
                return Err(GatewayError::Rejected("offline".to_string()));
            }
            self.sent.push(request.clone());
            Ok(())
        }
    }

    fn backlog() -> Backlog {
        let sub = |id: &str, due: NaiveDate| SubItem {
            id: id.to_string(),
            title: id.to_string(),
            due_date: Some(due),
            time_worked_ms: Some(60_000),
            ..SubItem::default()
        };
        Backlog::new(
            "core",
            Snapshot {
                items: vec![
                    WorkItem {
                        id: "XACA-0001".to_string(),
                        title: "Parent".to_string(),
                        subitems: vec![
                            sub("XACA-0001-001", d(2026, 2, 10)),
                            sub("XACA-0001-002", d(2026, 2, 20)),
                        ],
                        ..WorkItem::default()
                    },
                    WorkItem {
                        id: "XACA-0002".to_string(),
                        title: "Solo".to_string(),
                        ..WorkItem::default()
                    },
                ],
            },
        )
    }

    #[test]
    fn lookups_by_id() {
        let b = backlog();
        assert_eq!(b.item("XACA-0002").unwrap().title, "Solo");
        let (parent, sub) = b.subitem("XACA-0001-002").unwrap();
        assert_eq!(parent.id, "XACA-0001");
        assert_eq!(sub.due_date, Some(d(2026, 2, 20)));
        assert!(b.item("XACA-0001-002").is_none());
        assert!(b.subitem("XACA-0002").is_none());
    }

    #[test]
    fn subitem_completion_updates_parent_rollup() {
        let mut b = backlog();
        let mut gw = Recording::default();
        let rollup = *b.rollup("XACA-0001").unwrap();
        assert_eq!(rollup.effective_due.unwrap().date, d(2026, 2, 10));
        assert_eq!(rollup.work_time_ms, 0);

        b.change_status(&mut gw, "XACA-0001-001", Status::Completed, ts("2026-02-01T09:00:00Z"))
            .unwrap()
            .unwrap();

        let rollup = b.rollup("XACA-0001").unwrap();
        let due = rollup.effective_due.unwrap();
        assert_eq!(due.date, d(2026, 2, 20));
        assert_eq!(due.source, DueSource::Inherited);
        assert_eq!(rollup.work_time_ms, 60_000);
        assert!(matches!(
            &gw.sent[0],
            MutationRequest::UpdateSubitem { parent_id, subitem_id, .. }
                if parent_id == "XACA-0001" && subitem_id == "XACA-0001-001"
        ));
    }

    #[test]
    fn same_status_sends_nothing() {
        let mut b = backlog();
        let mut gw = Recording::default();
        let result = b
            .change_status(&mut gw, "XACA-0002", Status::Todo, ts("2026-02-01T09:00:00Z"))
            .unwrap();
        assert!(result.is_none());
        assert!(gw.sent.is_empty());
    }

    #[test]
    fn failed_gateway_leaves_state_untouched() {
        let mut b = backlog();
        let before = b.clone();
        let mut gw = Recording {
            fail: true,
            ..Recording::default()
        };
        let err = b
            .change_status(&mut gw, "XACA-0002", Status::Completed, ts("2026-02-01T09:00:00Z"))
            .unwrap_err();
        assert!(matches!(err, MutationError::Gateway(_)));
        assert!(b.toggle_collapsed(&mut gw, "XACA-0001").is_err());
        assert_eq!(b, before);
    }

    #[test]
    fn validation_failures_never_reach_the_gateway() {
        let mut b = backlog();
        let mut gw = Recording::default();
        let now = ts("2026-02-01T09:00:00Z");
        assert!(matches!(
            b.pause(&mut gw, "XACA-0002", "   ", now),
            Err(MutationError::Validation(_))
        ));
        assert!(matches!(
            b.assign_release(&mut gw, "XACA-0002", "", None, now),
            Err(MutationError::Validation(_))
        ));
        assert!(matches!(
            b.assign_epic(&mut gw, "XACA-0001-001", "EPIC-1", now),
            Err(MutationError::Validation(_))
        ));
        assert!(matches!(
            b.toggle_collapsed(&mut gw, "XACA-0001-001"),
            Err(MutationError::Validation(_))
        ));
        assert!(matches!(
            b.set_priority(&mut gw, "MISSING", Priority::High, now),
            Err(MutationError::NotFound { .. })
        ));
        assert!(gw.sent.is_empty());
    }

    #[test]
    fn clear_due_date_is_sent_as_clear_field() {
        let mut b = backlog();
        let mut gw = Recording::default();
        let now = ts("2026-02-01T09:00:00Z");
        b.set_due_date(&mut gw, "XACA-0002", d(2026, 3, 1), now).unwrap();
        assert_eq!(b.item("XACA-0002").unwrap().due_date, Some(d(2026, 3, 1)));

        let patch = b.clear_due_date(&mut gw, "XACA-0002", now).unwrap();
        assert_eq!(patch.clear_fields, vec![Field::DueDate]);
        assert_eq!(b.item("XACA-0002").unwrap().due_date, None);
        assert!(b.rollup("XACA-0002").unwrap().effective_due.is_none());
    }

    #[test]
    fn pause_resume_and_assignments_apply_after_success() {
        let mut b = backlog();
        let mut gw = Recording::default();
        let now = ts("2026-02-01T09:00:00Z");

        b.pause(&mut gw, "XACA-0002", "waiting on review", now).unwrap();
        let item = b.item("XACA-0002").unwrap();
        assert_eq!(item.paused_reason.as_deref(), Some("waiting on review"));
        assert_eq!(item.paused_previous_status, Some(Status::Todo));

        b.resume(&mut gw, "XACA-0002", now).unwrap();
        assert!(b.item("XACA-0002").unwrap().paused_reason.is_none());

        b.assign_release(&mut gw, "XACA-0002", "REL-3", Some("ios"), now)
            .unwrap();
        b.assign_epic(&mut gw, "XACA-0002", "EPIC-9", now).unwrap();
        let item = b.item("XACA-0002").unwrap();
        assert_eq!(
            item.release_assignment.as_ref().map(|r| r.release_id.as_str()),
            Some("REL-3")
        );
        assert_eq!(item.epic_id.as_deref(), Some("EPIC-9"));

        b.unassign_release(&mut gw, "XACA-0002", now).unwrap();
        b.unassign_epic(&mut gw, "XACA-0002", now).unwrap();
        let item = b.item("XACA-0002").unwrap();
        assert!(item.release_assignment.is_none() && item.epic_id.is_none());
        assert_eq!(gw.sent.len(), 6);
    }

    #[test]
    fn toggle_collapsed_flips_and_reports() {
        let mut b = backlog();
        let mut gw = Recording::default();
        assert!(b.toggle_collapsed(&mut gw, "XACA-0001").unwrap());
        assert!(b.item("XACA-0001").unwrap().collapsed);
        assert!(!b.toggle_collapsed(&mut gw, "XACA-0001").unwrap());
        assert!(matches!(
            &gw.sent[0],
            MutationRequest::ToggleCollapsed { collapsed: true, .. }
        ));
    }

    #[test]
    fn reconcile_keeps_collapsed_and_reindexes() {
        let mut b = backlog();
        let mut gw = Recording::default();
        b.toggle_collapsed(&mut gw, "XACA-0001").unwrap();

        let report = b.reconcile(Snapshot {
            items: vec![WorkItem {
                id: "XACA-0100".to_string(),
                title: "Parent".to_string(),
                ..WorkItem::default()
            }],
        });
        assert_eq!(report.added, vec!["XACA-0100".to_string()]);
        assert_eq!(report.removed.len(), 2);
        assert!(b.item("XACA-0100").unwrap().collapsed);
        assert!(b.item("XACA-0001").is_none());
        assert!(b.rollup("XACA-0001").is_none());
        assert!(b.rollup("XACA-0100").is_some());
    }
}
