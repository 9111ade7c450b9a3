//! Command handlers and the shared plumbing they run on.

pub mod assign;
pub mod collapse;
pub mod completions;
pub mod due;
pub mod pause;
pub mod priority;
pub mod queue;
pub mod resume;
pub mod show;
pub mod stats;
pub mod status;

use std::path::PathBuf;

use anyhow::Context;
use backlog_core::backlog::Backlog;
use backlog_core::config::{ProjectConfig, load_project_config};
use backlog_core::error::ErrorCode;
use backlog_core::model::item::Timestamp;
use backlog_core::model::patch::FieldPatch;
use backlog_core::mutation::{FileGateway, MutationError};
use backlog_core::snapshot::Snapshot;
use chrono::NaiveDate;
use serde::Serialize;

use crate::output::{CliError, OutputMode, print_done, print_error};

/// Settings shared by every command, resolved once in `main`.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub output: OutputMode,
    pub project_root: PathBuf,
    /// `--snapshot` or `BACKLOG_SNAPSHOT`; falls back to the project config.
    pub snapshot: Option<PathBuf>,
    /// Local date used for due-date buckets and labels.
    pub today: NaiveDate,
}

impl RunContext {
    /// Report `error` in the active output mode and turn it into a failure.
    pub fn fail(&self, error: &CliError) -> anyhow::Error {
        if let Err(render_err) = print_error(self.output, error) {
            return render_err;
        }
        anyhow::anyhow!("{}", error.message)
    }
}

/// A loaded project: config, the snapshot file it points at, and the backlog.
pub struct Workspace {
    pub config: ProjectConfig,
    pub snapshot_path: PathBuf,
    pub backlog: Backlog,
}

impl Workspace {
    /// Load project config and the snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error (already rendered) if the config is malformed or the
    /// snapshot is missing or unreadable.
    pub fn open(ctx: &RunContext) -> anyhow::Result<Self> {
        let config = load_project_config(&ctx.project_root).map_err(|err| {
            ctx.fail(&CliError::from_code(
                ErrorCode::ConfigParseError,
                format!("{err:#}"),
            ))
        })?;
        let snapshot_path = ctx
            .snapshot
            .clone()
            .unwrap_or_else(|| config.snapshot_path(&ctx.project_root));

        if !snapshot_path.exists() {
            return Err(ctx.fail(&CliError::from_code(
                ErrorCode::SnapshotMissing,
                format!("no snapshot at {}", snapshot_path.display()),
            )));
        }
        let snapshot = Snapshot::load(&snapshot_path).map_err(|err| {
            ctx.fail(&CliError::from_code(
                ErrorCode::SnapshotParseError,
                format!("{err:#}"),
            ))
        })?;

        let backlog = Backlog::new(config.team.clone(), snapshot);
        Ok(Self {
            config,
            snapshot_path,
            backlog,
        })
    }

    pub fn gateway(&self) -> FileGateway {
        FileGateway::new(&self.snapshot_path)
    }
}

/// JSON payload reported after a successful mutation.
#[derive(Debug, Serialize)]
pub struct MutationOutcome {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<FieldPatch>,
}

/// Open the workspace, run one mutation through the file gateway, and report it.
///
/// `op` receives the backlog, the gateway, and the current time, and returns
/// the applied patch (`None` for a no-op) plus a success message.
pub fn run_mutation<F>(ctx: &RunContext, id: &str, op: F) -> anyhow::Result<()>
where
    F: FnOnce(
        &mut Backlog,
        &mut FileGateway,
        Timestamp,
    ) -> Result<(Option<FieldPatch>, String), MutationError>,
{
    let mut workspace = Workspace::open(ctx)?;
    let mut gateway = workspace.gateway();
    let now = chrono::Utc::now();

    match op(&mut workspace.backlog, &mut gateway, now) {
        Ok((patch, message)) => print_done(
            ctx.output,
            &message,
            &MutationOutcome {
                id: id.to_string(),
                patch,
            },
        ),
        Err(err) => Err(ctx.fail(&CliError::from(&err))),
    }
}

/// Parse a `YYYY-MM-DD` argument, rendering a coded error on failure.
pub fn parse_date_arg(ctx: &RunContext, raw: &str) -> anyhow::Result<NaiveDate> {
    backlog_core::date::parse_local_date(raw)
        .map_err(|err| ctx.fail(&CliError::from_code(ErrorCode::InvalidDate, err.to_string())))
}

/// Resolve `--today`, defaulting to the local calendar date.
pub fn resolve_today(raw: Option<&str>) -> anyhow::Result<NaiveDate> {
    raw.map_or_else(
        || Ok(backlog_core::date::today()),
        |s| backlog_core::date::parse_local_date(s).context("Invalid --today value"),
    )
}

pub fn snapshot_from_env(flag: Option<PathBuf>) -> Option<PathBuf> {
    flag.or_else(|| std::env::var_os("BACKLOG_SNAPSHOT").map(PathBuf::from))
}

