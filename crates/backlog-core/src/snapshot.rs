//! Snapshots, the id index, and reconcile-on-reload.
//!
//! A [`Snapshot`] is the full `{ items: [...] }` document fetched from the
//! server. The [`IdIndex`] maps every item and subitem id to its position and
//! is rebuilt whenever the snapshot is replaced, so mutations are addressed by
//! id and never by a position that may have gone stale.
//!
//! # Collapsed state
//!
//! Expand/collapse is a local UI preference carried across reloads by item
//! **title**, not id. Items sharing a title share their collapsed flag (the
//! last one seen wins). This mirrors how the state has always been persisted
//! and is kept as-is.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::item::{WorkItem, is_subitem_of};
use crate::model::lenient;

/// The full backlog as delivered by the load layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub items: Vec<WorkItem>,
}

impl Snapshot {
    /// Parse a snapshot from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid snapshot document.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Failed to parse backlog snapshot")
    }

    /// Read a snapshot file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

/// Where an id lives in the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Item(usize),
    Subitem { item: usize, subitem: usize },
}

/// Id → location lookup over one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdIndex {
    locations: HashMap<String, Location>,
}

impl IdIndex {
    /// Index every item and subitem. On duplicate ids the first one wins.
    ///
    /// Subitems whose id does not extend their parent's id are still indexed.
    #[must_use]
    pub fn build(snapshot: &Snapshot) -> Self {
        let mut locations = HashMap::new();
        for (i, item) in snapshot.items.iter().enumerate() {
            insert_first(&mut locations, &item.id, Location::Item(i));
            for (j, sub) in item.subitems.iter().enumerate() {
                if !is_subitem_of(&sub.id, &item.id) {
                    warn!(
                        parent = %item.id,
                        id = %sub.id,
                        "subitem id does not extend its parent id"
                    );
                }
                insert_first(
                    &mut locations,
                    &sub.id,
                    Location::Subitem {
                        item: i,
                        subitem: j,
                    },
                );
            }
        }
        Self { locations }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<Location> {
        self.locations.get(id).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

fn insert_first(locations: &mut HashMap<String, Location>, id: &str, location: Location) {
    if locations.contains_key(id) {
        warn!(id, "duplicate id in snapshot; keeping first occurrence");
        return;
    }
    locations.insert(id.to_string(), location);
}

/// What changed between two snapshots, keyed by item id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub changed: Vec<String>,
    /// Items whose collapsed flag was carried over from the previous snapshot.
    pub collapsed_restored: usize,
}

impl ReconcileReport {
    #[must_use]
    pub const fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// Carry collapsed flags from `previous` into `incoming` (by title) and
/// describe the difference.
pub fn reconcile_snapshots(previous: &Snapshot, incoming: &mut Snapshot) -> ReconcileReport {
    let collapsed_by_title: HashMap<&str, bool> = previous
        .items
        .iter()
        .map(|item| (item.title.as_str(), item.collapsed))
        .collect();

    let mut report = ReconcileReport::default();
    for item in &mut incoming.items {
        if let Some(&collapsed) = collapsed_by_title.get(item.title.as_str()) {
            item.collapsed = collapsed;
            report.collapsed_restored += 1;
        }
    }

    let previous_by_id: HashMap<&str, &WorkItem> = previous
        .items
        .iter()
        .map(|item| (item.id.as_str(), item))
        .collect();
    let incoming_ids: HashSet<&str> = incoming.items.iter().map(|i| i.id.as_str()).collect();

    for item in &incoming.items {
        match previous_by_id.get(item.id.as_str()) {
            None => report.added.push(item.id.clone()),
            Some(old) if *old != item => report.changed.push(item.id.clone()),
            Some(_) => {}
        }
    }
    report.removed = previous
        .items
        .iter()
        .filter(|item| !incoming_ids.contains(item.id.as_str()))
        .map(|item| item.id.clone())
        .collect();

    report
}
