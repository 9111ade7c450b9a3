//! Blocking dependencies between items and subitems.
//!
//! # Overview
//!
//! Every item and subitem carries a `blocked_by` list of ids. The list is
//! opaque: ids are not validated against the snapshot and cycles are not
//! detected. Only membership is ever asked of it.
//!
//! # Scheduling Semantics
//!
//! An entity is **blocked** when its `blocked_by` list is non-empty. This is a
//! presence check, not a satisfaction check: a blocker that is itself
//! completed still marks its dependents as blocked. UI copy and the
//! non-transitive [`blocker_first`] comparator both assume this shallow model.
//!
//! # Spotlight
//!
//! A spotlight set is a source id plus its direct blockers, used to narrow the
//! queue to one dependency chain. It is one level deep; there is no
//! transitive closure.

#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::model::item::{Entity, WorkItem};

// ---------------------------------------------------------------------------
// Entity-level queries
// ---------------------------------------------------------------------------

/// Return `true` if the entity lists at least one blocker.
pub fn is_blocked<E: Entity + ?Sized>(entity: &E) -> bool {
    !entity.blocked_by().is_empty()
}

/// Return `true` if `b` lists `a` as a blocker.
pub fn directly_blocks<A, B>(a: &A, b: &B) -> bool
where
    A: Entity + ?Sized,
    B: Entity + ?Sized,
{
    b.blocked_by().iter().any(|id| id == a.id())
}

/// The source id plus each of its direct blocker ids.
pub fn spotlight_set(source_id: &str, blocker_ids: &[String]) -> HashSet<String> {
    std::iter::once(source_id.to_string())
        .chain(blocker_ids.iter().cloned())
        .collect()
}

/// Tie-break placing a blocker before the entity it blocks.
///
/// Returns `Less` if `a` blocks `b`, `Greater` if `b` blocks `a`, and `Equal`
/// otherwise (defer to the next comparator). Mutual blocking compares `Less`.
/// Not transitive: it only relates direct pairs.
pub fn blocker_first<A, B>(a: &A, b: &B) -> Ordering
where
    A: Entity + ?Sized,
    B: Entity + ?Sized,
{
    if directly_blocks(a, b) {
        Ordering::Less
    } else if directly_blocks(b, a) {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

// ---------------------------------------------------------------------------
// BlockingIndex
// ---------------------------------------------------------------------------

/// Blocker and dependent lookups materialized from a snapshot.
///
/// Covers items and subitems alike; ids in `blocked_by` that name nothing in
/// the snapshot are kept as-is. The index is immutable once built; build it
/// again after the snapshot changes.
#[derive(Debug, Clone, Default)]
pub struct BlockingIndex {
    /// entity id → ids that block it.
    blocked_by: HashMap<String, HashSet<String>>,
    /// blocker id → ids of the entities it blocks.
    blocks: HashMap<String, HashSet<String>>,
    /// Every item and subitem id in the snapshot.
    all_ids: HashSet<String>,
}

impl BlockingIndex {
    /// Build the index from top-level items and their subitems.
    ///
    /// # Complexity
    ///
    /// O(N * L) where N is the number of entities and L the average number of
    /// blockers per entity.
    pub fn from_items(items: &[WorkItem]) -> Self {
        let mut index = Self::default();
        for item in items {
            index.insert(item);
            for sub in &item.subitems {
                index.insert(sub);
            }
        }
        index
    }

    fn insert<E: Entity>(&mut self, entity: &E) {
        let id = entity.id().to_string();
        self.all_ids.insert(id.clone());
        if entity.blocked_by().is_empty() {
            return;
        }
        let blockers: HashSet<String> = entity.blocked_by().iter().cloned().collect();
        for blocker in &blockers {
            self.blocks
                .entry(blocker.clone())
                .or_default()
                .insert(id.clone());
        }
        self.blocked_by.entry(id).or_default().extend(blockers);
    }

    /// Return `true` if the entity has at least one blocker.
    pub fn is_blocked(&self, id: &str) -> bool {
        self.blocked_by
            .get(id)
            .is_some_and(|blockers| !blockers.is_empty())
    }

    /// Ids that block `id`. Empty if none or unknown.
    pub fn get_blockers(&self, id: &str) -> HashSet<&str> {
        self.blocked_by
            .get(id)
            .map(|blockers| blockers.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Ids that list `id` as a blocker. Empty if none.
    pub fn get_dependents(&self, id: &str) -> HashSet<&str> {
        self.blocks
            .get(id)
            .map(|deps| deps.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Spotlight set for `id`: itself plus its direct blockers.
    pub fn spotlight(&self, id: &str) -> HashSet<String> {
        let blockers: Vec<String> = self
            .get_blockers(id)
            .into_iter()
            .map(str::to_string)
            .collect();
        spotlight_set(id, &blockers)
    }

    pub fn len(&self) -> usize {
        self.all_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all_ids.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
