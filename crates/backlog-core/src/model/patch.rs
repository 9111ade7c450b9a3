//! Field-level change sets.
//!
//! A [`FieldPatch`] is the single description of a mutation: it is sent to
//! the gateway as `updates` + `clearFields`, and the very same value is
//! applied to local state once the gateway confirms. Clearing a field
//! (removing it) is distinct from setting it, so absent values never travel
//! as `null`.

use chrono::NaiveDate;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use super::item::{Entity, Priority, ReleaseAssignment, Status, SubItem, Timestamp, WorkItem};

/// Names of fields a patch can set or clear, in wire (camelCase) form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Status,
    Priority,
    DueDate,
    UpdatedAt,
    CompletedAt,
    CancelledAt,
    PausedReason,
    PausedPreviousStatus,
    EpicId,
    ReleaseAssignment,
}

/// A single field assignment. Serializes as a one-key object (`{"status":"todo"}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Change {
    Status(Status),
    Priority(Priority),
    DueDate(NaiveDate),
    UpdatedAt(Timestamp),
    CompletedAt(Timestamp),
    CancelledAt(Timestamp),
    PausedReason(String),
    PausedPreviousStatus(Status),
    EpicId(String),
    ReleaseAssignment(ReleaseAssignment),
}

impl Change {
    /// The field this change writes.
    #[must_use]
    pub const fn field(&self) -> Field {
        match self {
            Self::Status(_) => Field::Status,
            Self::Priority(_) => Field::Priority,
            Self::DueDate(_) => Field::DueDate,
            Self::UpdatedAt(_) => Field::UpdatedAt,
            Self::CompletedAt(_) => Field::CompletedAt,
            Self::CancelledAt(_) => Field::CancelledAt,
            Self::PausedReason(_) => Field::PausedReason,
            Self::PausedPreviousStatus(_) => Field::PausedPreviousStatus,
            Self::EpicId(_) => Field::EpicId,
            Self::ReleaseAssignment(_) => Field::ReleaseAssignment,
        }
    }
}

/// Fields to set plus fields to remove. A field appears in at most one list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldPatch {
    pub updates: Vec<Change>,
    pub clear_fields: Vec<Field>,
}

impl FieldPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any earlier set or clear of the same field.
    #[must_use]
    pub fn set(mut self, change: Change) -> Self {
        let field = change.field();
        self.clear_fields.retain(|f| *f != field);
        self.updates.retain(|c| c.field() != field);
        self.updates.push(change);
        self
    }

    /// Remove a field, replacing any earlier set of the same field.
    #[must_use]
    pub fn clear(mut self, field: Field) -> Self {
        self.updates.retain(|c| c.field() != field);
        if !self.clear_fields.contains(&field) {
            self.clear_fields.push(field);
        }
        self
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.clear_fields.is_empty()
    }

    /// Every field this patch touches, sets first.
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.updates
            .iter()
            .map(Change::field)
            .chain(self.clear_fields.iter().copied())
    }

    /// The `updates` object as sent over the wire.
    #[must_use]
    pub fn updates_map(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut map = serde_json::Map::new();
        for change in &self.updates {
            if let Ok(serde_json::Value::Object(entry)) = serde_json::to_value(change) {
                map.extend(entry);
            }
        }
        map
    }
}

impl Serialize for FieldPatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("FieldPatch", 2)?;
        state.serialize_field("updates", &self.updates_map())?;
        state.serialize_field("clearFields", &self.clear_fields)?;
        state.end()
    }
}

/// Write access used to apply a confirmed [`FieldPatch`].
pub trait Patchable: Entity {
    /// Whether this entity kind stores `field` at all.
    fn accepts(&self, field: Field) -> bool;

    fn apply_change(&mut self, change: &Change);

    fn clear_field(&mut self, field: Field);

    fn apply_patch(&mut self, patch: &FieldPatch) {
        for change in &patch.updates {
            self.apply_change(change);
        }
        for field in &patch.clear_fields {
            self.clear_field(*field);
        }
    }
}

impl Patchable for WorkItem {
    fn accepts(&self, _field: Field) -> bool {
        true
    }

    fn apply_change(&mut self, change: &Change) {
        match change {
            Change::Status(s) => self.status = *s,
            Change::Priority(p) => self.priority = *p,
            Change::DueDate(d) => self.due_date = Some(*d),
            Change::UpdatedAt(t) => self.updated_at = Some(*t),
            Change::CompletedAt(t) => self.completed_at = Some(*t),
            Change::CancelledAt(t) => self.cancelled_at = Some(*t),
            Change::PausedReason(r) => self.paused_reason = Some(r.clone()),
            Change::PausedPreviousStatus(s) => self.paused_previous_status = Some(*s),
            Change::EpicId(e) => self.epic_id = Some(e.clone()),
            Change::ReleaseAssignment(r) => self.release_assignment = Some(r.clone()),
        }
    }

    fn clear_field(&mut self, field: Field) {
        match field {
            // Status and priority always hold a value; clearing restores the default.
            Field::Status => self.status = Status::default(),
            Field::Priority => self.priority = Priority::default(),
            Field::DueDate => self.due_date = None,
            Field::UpdatedAt => self.updated_at = None,
            Field::CompletedAt => self.completed_at = None,
            Field::CancelledAt => self.cancelled_at = None,
            Field::PausedReason => self.paused_reason = None,
            Field::PausedPreviousStatus => self.paused_previous_status = None,
            Field::EpicId => self.epic_id = None,
            Field::ReleaseAssignment => self.release_assignment = None,
        }
    }
}

impl Patchable for SubItem {
    fn accepts(&self, field: Field) -> bool {
        !matches!(
            field,
            Field::CancelledAt | Field::EpicId | Field::ReleaseAssignment
        )
    }

    fn apply_change(&mut self, change: &Change) {
        match change {
            Change::Status(s) => self.status = *s,
            Change::Priority(p) => self.priority = *p,
            Change::DueDate(d) => self.due_date = Some(*d),
            Change::UpdatedAt(t) => self.updated_at = Some(*t),
            Change::CompletedAt(t) => self.completed_at = Some(*t),
            Change::PausedReason(r) => self.paused_reason = Some(r.clone()),
            Change::PausedPreviousStatus(s) => self.paused_previous_status = Some(*s),
            Change::CancelledAt(_) | Change::EpicId(_) | Change::ReleaseAssignment(_) => {}
        }
    }

    fn clear_field(&mut self, field: Field) {
        match field {
            Field::Status => self.status = Status::default(),
            Field::Priority => self.priority = Priority::default(),
            Field::DueDate => self.due_date = None,
            Field::UpdatedAt => self.updated_at = None,
            Field::CompletedAt => self.completed_at = None,
            Field::PausedReason => self.paused_reason = None,
            Field::PausedPreviousStatus => self.paused_previous_status = None,
            Field::CancelledAt | Field::EpicId | Field::ReleaseAssignment => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        s.parse().expect("valid timestamp")
    }

    #[test]
    fn set_then_clear_keeps_fields_disjoint() {
        let patch = FieldPatch::new()
            .set(Change::DueDate(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()))
            .clear(Field::DueDate);
        assert!(patch.updates.is_empty());
        assert_eq!(patch.clear_fields, vec![Field::DueDate]);

        let patch = patch.set(Change::DueDate(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()));
        assert!(patch.clear_fields.is_empty());
        assert_eq!(patch.updates.len(), 1);
    }

    #[test]
    fn serializes_updates_and_clear_fields_separately() {
        let patch = FieldPatch::new()
            .set(Change::Status(Status::Todo))
            .set(Change::UpdatedAt(ts("2026-01-05T10:00:00Z")))
            .clear(Field::CompletedAt);
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json["updates"]["status"], "todo");
        assert_eq!(json["updates"]["updatedAt"], "2026-01-05T10:00:00Z");
        assert_eq!(json["clearFields"], serde_json::json!(["completedAt"]));
        assert!(json["updates"].get("completedAt").is_none());
    }

    #[test]
    fn apply_patch_removes_cleared_fields() {
        let mut item = WorkItem {
            completed_at: Some(ts("2026-01-01T00:00:00Z")),
            status: Status::Completed,
            ..WorkItem::default()
        };
        let patch = FieldPatch::new()
            .set(Change::Status(Status::Todo))
            .clear(Field::CompletedAt);
        item.apply_patch(&patch);
        assert_eq!(item.status, Status::Todo);
        assert!(item.completed_at.is_none());
    }

    #[test]
    fn subitems_reject_item_only_fields() {
        let sub = SubItem::default();
        assert!(!sub.accepts(Field::EpicId));
        assert!(!sub.accepts(Field::ReleaseAssignment));
        assert!(sub.accepts(Field::DueDate));
    }
}
