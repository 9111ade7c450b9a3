//! `bq queue`: the filtered, ordered backlog.

use std::io::{self, Write};

use backlog_core::error::ErrorCode;
use backlog_core::graph::blocking::BlockingIndex;
use backlog_core::model::item::Status;
use backlog_core::queue::{
    AssignmentFilter, CategoryFilter, ItemView, OsFilter, SortMode, StatusFilter, SubItemView,
};
use clap::Args;
use serde::Serialize;

use super::{RunContext, Workspace};
use crate::output::{CliError, Row, print_rows};

#[derive(Args, Debug, Default)]
pub struct QueueArgs {
    /// Text search, or `worktree:<path>`, `branch:<name>`, `working`, `active`.
    #[arg(short, long)]
    pub search: Option<String>,

    /// Platform filter: `all`, `none`, or a platform tag.
    #[arg(long)]
    pub os: Option<OsFilter>,

    /// Release filter: `all`, `assigned`, `unassigned`, or a release id.
    #[arg(long)]
    pub release: Option<AssignmentFilter>,

    /// Epic filter: `all`, `assigned`, `unassigned`, or an epic id.
    #[arg(long)]
    pub epic: Option<AssignmentFilter>,

    /// Category filter: `all`, `none`, or a category name.
    #[arg(long)]
    pub category: Option<CategoryFilter>,

    /// Status category: `all`, `completed`, `in_progress`, `paused`,
    /// `blocked`, `past_due`, `due_today`, `due_tomorrow`, `due_2`..`due_7`,
    /// `due_this_week`, `due_weeks`, `due_distant`.
    #[arg(long)]
    pub status: Option<StatusFilter>,

    /// Sort mode: `priority` or `due_date`.
    #[arg(long)]
    pub sort: Option<SortMode>,

    /// Show only this item and the items blocking it.
    #[arg(long, value_name = "ID")]
    pub spotlight: Option<String>,
}

pub fn run_queue(args: &QueueArgs, ctx: &RunContext) -> anyhow::Result<()> {
    let workspace = Workspace::open(ctx)?;
    let mut config = workspace.config.to_queue_config().map_err(|err| {
        ctx.fail(&CliError::from_code(
            ErrorCode::ConfigParseError,
            format!("{err:#}"),
        ))
    })?;

    if let Some(search) = &args.search {
        config.search.clone_from(search);
    }
    if let Some(os) = &args.os {
        config.os = os.clone();
    }
    if let Some(release) = &args.release {
        config.release = release.clone();
    }
    if let Some(epic) = &args.epic {
        config.epic = epic.clone();
    }
    if let Some(category) = &args.category {
        config.category = category.clone();
    }
    if let Some(status) = &args.status {
        config.status = status.clone();
    }
    if let Some(sort) = args.sort {
        config.sort = sort;
    }
    if let Some(id) = &args.spotlight {
        let index = BlockingIndex::from_items(workspace.backlog.items());
        config.spotlight = Some(index.spotlight(id));
    }

    let views = workspace.backlog.queue(&config, ctx.today);
    let rows: Vec<QueueRow> = views.into_iter().map(QueueRow).collect();
    print_rows(&rows, ctx.output)
}

#[derive(Serialize)]
#[serde(transparent)]
struct QueueRow(ItemView);

fn flags(view: &ItemView) -> String {
    let mut flags = Vec::new();
    if view.actively_working {
        flags.push("working");
    }
    if view.blocked {
        flags.push("blocked");
    }
    if view.paused {
        flags.push("paused");
    }
    if view.overdue {
        flags.push("overdue");
    }
    flags.join(",")
}

fn subitem_marker(sub: &SubItemView) -> &'static str {
    match sub.status {
        Status::Completed => "[x]",
        Status::Cancelled => "[-]",
        Status::InProgress => "[~]",
        Status::Todo => "[ ]",
    }
}

impl Row for QueueRow {
    const HEADERS: &'static [&'static str] = &["id", "status", "priority", "due", "flags", "title"];

    fn cells(&self) -> Vec<String> {
        let view = &self.0;
        vec![
            view.id.clone(),
            view.status.to_string(),
            view.priority.to_string(),
            view.effective_due
                .map(|due| due.date.to_string())
                .unwrap_or_default(),
            flags(view),
            view.title.clone(),
        ]
    }

    fn write_pretty(&self, w: &mut dyn Write) -> io::Result<()> {
        let view = &self.0;
        write!(
            w,
            "{:<9} {:<14} {}",
            view.priority.to_string(),
            view.id,
            view.title
        )?;
        if let Some(label) = &view.due_label {
            write!(w, "  ({label})")?;
        }
        let flags = flags(view);
        if !flags.is_empty() {
            write!(w, "  [{flags}]")?;
        }
        if let Some(platform) = &view.platform {
            write!(w, "  @{platform}")?;
        }
        writeln!(w)?;

        if view.collapsed {
            if !view.subitems.is_empty() {
                writeln!(w, "          ... {} subitems hidden", view.subitems.len())?;
            }
            return Ok(());
        }
        for sub in &view.subitems {
            write!(w, "          {} {:<14} {}", subitem_marker(sub), sub.id, sub.title)?;
            if let Some(label) = &sub.due_label {
                write!(w, "  ({label})")?;
            }
            if sub.blocked {
                write!(w, "  [blocked]")?;
            }
            writeln!(w)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: QueueArgs,
    }

    #[test]
    fn queue_args_parse_filters() {
        let w = Wrapper::parse_from([
            "test",
            "--os",
            "none",
            "--status",
            "due-this-week",
            "--sort",
            "due",
            "--release",
            "REL-2",
            "-s",
            "installer",
        ]);
        assert_eq!(w.args.os, Some(OsFilter::None));
        assert_eq!(w.args.status.map(|s| s.to_string()).as_deref(), Some("due_this_week"));
        assert_eq!(w.args.sort, Some(SortMode::DueDate));
        assert_eq!(w.args.release, Some(AssignmentFilter::Id("REL-2".to_string())));
        assert_eq!(w.args.search.as_deref(), Some("installer"));
    }

    #[test]
    fn queue_args_reject_unknown_status() {
        assert!(Wrapper::try_parse_from(["test", "--status", "someday"]).is_err());
    }

    #[test]
    fn queue_args_default_to_no_overrides() {
        let w = Wrapper::parse_from(["test"]);
        assert!(w.args.os.is_none() && w.args.sort.is_none() && w.args.spotlight.is_none());
    }
}
