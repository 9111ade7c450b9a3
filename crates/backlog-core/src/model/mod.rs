//! Work-item data model.
//!
//! - [`item`]: [`WorkItem`](item::WorkItem), [`SubItem`](item::SubItem) and
//!   their enums, plus the [`Entity`](item::Entity) accessor trait shared by both.
//! - [`patch`]: field-level change sets used both for gateway requests and
//!   for applying a confirmed change to local state.

pub mod item;
pub(crate) mod lenient;
pub mod patch;
