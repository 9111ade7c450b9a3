//! Mutation requests and the gateway that persists them.
//!
//! The engine never writes local state first. It builds a
//! [`MutationRequest`], hands it to a [`MutationGateway`], and applies the
//! embedded [`FieldPatch`] locally only once the gateway returns `Ok`.
//!
//! Requests are independent "set these fields / clear these fields"
//! operations addressed by id, so two requests against the same entity may
//! arrive in either order.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::error::ErrorCode;
use crate::model::patch::{FieldPatch, Patchable};
use crate::snapshot::Snapshot;

/// One change request, as sent to the persistence layer.
///
/// JSON form: `{"op":"update_item","team":"…","id":"…","updates":{…},"clearFields":[…]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum MutationRequest {
    UpdateItem {
        team: String,
        id: String,
        #[serde(flatten)]
        patch: FieldPatch,
    },
    UpdateSubitem {
        team: String,
        #[serde(rename = "parentId")]
        parent_id: String,
        #[serde(rename = "subitemId")]
        subitem_id: String,
        #[serde(flatten)]
        patch: FieldPatch,
    },
    ToggleCollapsed {
        team: String,
        id: String,
        collapsed: bool,
    },
}

impl MutationRequest {
    /// Wire name of the operation.
    #[must_use]
    pub const fn op(&self) -> &'static str {
        match self {
            Self::UpdateItem { .. } => "update_item",
            Self::UpdateSubitem { .. } => "update_subitem",
            Self::ToggleCollapsed { .. } => "toggle_collapsed",
        }
    }

    /// Id of the entity the request writes.
    #[must_use]
    pub fn target_id(&self) -> &str {
        match self {
            Self::UpdateItem { id, .. } | Self::ToggleCollapsed { id, .. } => id,
            Self::UpdateSubitem { subitem_id, .. } => subitem_id,
        }
    }
}

/// Failure reported by a gateway. Local state is never touched when one is returned.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("gateway I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored snapshot is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("no item or subitem with id '{id}' in the store")]
    NotFound { id: String },

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("failed to replace snapshot file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Errors from a [`crate::backlog::Backlog`] mutation.
#[derive(Debug, thiserror::Error)]
pub enum MutationError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("no item or subitem with id '{id}'")]
    NotFound { id: String },

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl MutationError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) => ErrorCode::ValidationFailed,
            Self::NotFound { .. } => ErrorCode::ItemNotFound,
            Self::Gateway(_) => ErrorCode::GatewayFailed,
        }
    }
}

/// Persistence seam. Implementations perform the remote (or file) write and
/// report success or failure only.
pub trait MutationGateway {
    /// Send one request.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the request could not be persisted.
    fn send(&mut self, request: &MutationRequest) -> Result<(), GatewayError>;
}

/// Gateway over a snapshot JSON file on disk.
///
/// Each request re-reads the file, applies the change by id, and atomically
/// replaces the file.
#[derive(Debug, Clone)]
pub struct FileGateway {
    path: PathBuf,
}

impl FileGateway {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_snapshot(&self, snapshot: &Snapshot) -> Result<(), GatewayError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, snapshot)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)?;
        Ok(())
    }
}

impl MutationGateway for FileGateway {
    fn send(&mut self, request: &MutationRequest) -> Result<(), GatewayError> {
        let content = std::fs::read_to_string(&self.path)?;
        let mut snapshot: Snapshot = serde_json::from_str(&content)?;
        apply_request(&mut snapshot, request)?;
        self.write_snapshot(&snapshot)?;
        debug!(op = request.op(), id = request.target_id(), path = %self.path.display(), "snapshot file updated");
        Ok(())
    }
}

/// Apply `request` to a snapshot held by the store.
fn apply_request(snapshot: &mut Snapshot, request: &MutationRequest) -> Result<(), GatewayError> {
    let not_found = |id: &str| GatewayError::NotFound { id: id.to_string() };
    match request {
        MutationRequest::UpdateItem { id, patch, .. } => {
            let item = snapshot
                .items
                .iter_mut()
                .find(|item| item.id == *id)
                .ok_or_else(|| not_found(id))?;
            item.apply_patch(patch);
        }
        MutationRequest::UpdateSubitem {
            parent_id,
            subitem_id,
            patch,
            ..
        } => {
            let sub = snapshot
                .items
                .iter_mut()
                .find(|item| item.id == *parent_id)
                .ok_or_else(|| not_found(parent_id))?
                .subitems
                .iter_mut()
                .find(|sub| sub.id == *subitem_id)
                .ok_or_else(|| not_found(subitem_id))?;
            sub.apply_patch(patch);
        }
        MutationRequest::ToggleCollapsed { id, collapsed, .. } => {
            let item = snapshot
                .items
                .iter_mut()
                .find(|item| item.id == *id)
                .ok_or_else(|| not_found(id))?;
            item.collapsed = *collapsed;
        }
    }
    Ok(())
}
