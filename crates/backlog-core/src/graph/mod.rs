//! Relationships between work items.
//!
//! ## Submodules
//!
//! - [`blocking`]: `blockedBy` membership queries, spotlight sets, and the
//!   blocker-first tie-break used by the queue comparators.

pub mod blocking;
