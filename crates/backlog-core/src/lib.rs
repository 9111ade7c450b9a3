#![forbid(unsafe_code)]
//! backlog-core library.
//!
//! The work-item model and the queue engine that orders and filters a
//! backlog snapshot. Everything here is pure over an explicit snapshot and
//! [`queue::QueueConfig`]; the only side-effecting seam is the
//! [`mutation::MutationGateway`] trait.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums at module seams, `anyhow::Result` for config loading.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).
//! - **Dates**: due dates are local calendar dates ([`chrono::NaiveDate`]);
//!   functions that need "today" take it as a parameter.

pub mod backlog;
pub mod config;
pub mod date;
pub mod due;
pub mod error;
pub mod graph;
pub mod model;
pub mod mutation;
pub mod queue;
pub mod snapshot;
pub mod status;
pub mod worktime;
