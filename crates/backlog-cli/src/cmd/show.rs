//! `bq show`: full detail for one item or subitem.

use std::io::Write;

use backlog_core::backlog::ItemRollup;
use backlog_core::date::format_due;
use backlog_core::due::DueSource;
use backlog_core::error::ErrorCode;
use backlog_core::graph::blocking::{BlockingIndex, is_blocked};
use backlog_core::model::item::{Status, SubItem, WorkItem};
use backlog_core::queue::filter::{display_tags, platform_tag};
use backlog_core::worktime::format_duration;
use clap::Args;
use serde::Serialize;

use super::{RunContext, Workspace};
use crate::output::{CliError, field, heading, print_value};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Item or subitem id.
    pub id: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ShowPayload<'a> {
    Item {
        item: &'a WorkItem,
        rollup: Option<ItemRollup>,
        #[serde(skip_serializing_if = "Option::is_none")]
        platform: Option<&'a str>,
        /// `item.tags` minus the platform marker.
        #[serde(skip)]
        shown_tags: Vec<&'a str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        due_label: Option<String>,
        blocked: bool,
        dependents: Vec<String>,
    },
    Subitem {
        parent_id: &'a str,
        subitem: &'a SubItem,
        #[serde(skip_serializing_if = "Option::is_none")]
        due_label: Option<String>,
        blocked: bool,
        dependents: Vec<String>,
    },
}

fn sorted(ids: std::collections::HashSet<&str>) -> Vec<String> {
    let mut ids: Vec<String> = ids.into_iter().map(str::to_string).collect();
    ids.sort();
    ids
}

pub fn run_show(args: &ShowArgs, ctx: &RunContext) -> anyhow::Result<()> {
    let workspace = Workspace::open(ctx)?;
    let backlog = &workspace.backlog;
    let platform_tags = &workspace.config.queue.platform_tags;
    let index = BlockingIndex::from_items(backlog.items());
    let dependents = sorted(index.get_dependents(&args.id));

    let payload = if let Some(item) = backlog.item(&args.id) {
        let rollup = backlog.rollup(&item.id).copied();
        ShowPayload::Item {
            item,
            platform: platform_tag(&item.tags, platform_tags),
            shown_tags: display_tags(&item.tags, platform_tags),
            due_label: rollup
                .and_then(|r| r.effective_due)
                .map(|due| format_due(due.date, ctx.today, item.status == Status::Completed)),
            rollup,
            blocked: is_blocked(item),
            dependents,
        }
    } else if let Some((parent, sub)) = backlog.subitem(&args.id) {
        ShowPayload::Subitem {
            parent_id: &parent.id,
            subitem: sub,
            due_label: sub
                .due_date
                .map(|d| format_due(d, ctx.today, sub.status == Status::Completed)),
            blocked: is_blocked(sub),
            dependents,
        }
    } else {
        return Err(ctx.fail(&CliError::from_code(
            ErrorCode::ItemNotFound,
            format!("no item or subitem with id '{}'", args.id),
        )));
    };

    print_value(ctx.output, &payload, render_show_human, render_show_human)
}

fn write_common(
    w: &mut dyn Write,
    status: Status,
    priority: impl ToString,
    blocked_by: &[String],
    dependents: &[String],
    paused_reason: Option<&str>,
) -> std::io::Result<()> {
    field(w, "Status", status.to_string())?;
    field(w, "Priority", priority.to_string())?;
    if let Some(reason) = paused_reason {
        field(w, "Paused", reason)?;
    }
    if !blocked_by.is_empty() {
        field(w, "Blocked by", blocked_by.join(", "))?;
    }
    if !dependents.is_empty() {
        field(w, "Blocks", dependents.join(", "))?;
    }
    Ok(())
}

fn render_show_human(payload: &ShowPayload<'_>, w: &mut dyn Write) -> std::io::Result<()> {
    match payload {
        ShowPayload::Item {
            item,
            rollup,
            platform,
            shown_tags,
            due_label,
            dependents,
            ..
        } => {
            heading(w, &format!("{}  {}", item.id, item.title))?;
            write_common(
                w,
                item.status,
                item.priority,
                &item.blocked_by,
                dependents,
                item.paused_reason.as_deref(),
            )?;
            if let (Some(label), Some(due)) = (due_label, rollup.and_then(|r| r.effective_due)) {
                let source = match due.source {
                    DueSource::Direct => "own date",
                    DueSource::Inherited => "from subitems",
                };
                field(w, "Due", format!("{label} ({}, {source})", due.date))?;
            }
            if let Some(rollup) = rollup.filter(|r| r.work_time_ms > 0) {
                field(w, "Worked", format_duration(rollup.work_time_ms))?;
            }
            if let Some(category) = &item.category {
                field(w, "Category", category)?;
            }
            if let Some(platform) = platform {
                field(w, "Platform", platform)?;
            }
            if !shown_tags.is_empty() {
                field(w, "Tags", shown_tags.join(", "))?;
            }
            if let Some(release) = &item.release_assignment {
                field(w, "Release", &release.release_id)?;
            }
            if let Some(epic) = &item.epic_id {
                field(w, "Epic", epic)?;
            }
            if let Some(description) = item.description.as_deref().filter(|d| !d.is_empty()) {
                writeln!(w)?;
                writeln!(w, "{description}")?;
            }
            if !item.subitems.is_empty() {
                writeln!(w)?;
                writeln!(w, "Subitems:")?;
                for sub in &item.subitems {
                    writeln!(w, "  {:<14} {:<12} {}", sub.id, sub.status.to_string(), sub.title)?;
                }
            }
        }
        ShowPayload::Subitem {
            parent_id,
            subitem,
            due_label,
            dependents,
            ..
        } => {
            heading(w, &format!("{}  {}", subitem.id, subitem.title))?;
            field(w, "Parent", parent_id)?;
            write_common(
                w,
                subitem.status,
                subitem.priority,
                &subitem.blocked_by,
                dependents,
                subitem.paused_reason.as_deref(),
            )?;
            if let Some(label) = due_label {
                field(w, "Due", label)?;
            }
            if let Some(ms) = subitem.time_worked_ms.filter(|ms| *ms > 0) {
                field(w, "Worked", format_duration(ms))?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_args_parses_id() {
        use clap::Parser;

        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            args: ShowArgs,
        }
        let w = Wrapper::parse_from(["test", "XACA-0001-002"]);
        assert_eq!(w.args.id, "XACA-0001-002");
    }

    #[test]
    fn platform_tag_is_shown_apart_from_tags() {
        let item = WorkItem {
            id: "XACA-0001".to_string(),
            title: "Login".to_string(),
            tags: vec!["iOS".to_string(), "backend".to_string()],
            ..WorkItem::default()
        };
        let platform_tags = vec!["ios".to_string(), "android".to_string()];
        let payload = ShowPayload::Item {
            item: &item,
            rollup: None,
            platform: platform_tag(&item.tags, &platform_tags),
            shown_tags: display_tags(&item.tags, &platform_tags),
            due_label: None,
            blocked: false,
            dependents: vec![],
        };

        let mut buf = Vec::new();
        render_show_human(&payload, &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("Platform:    iOS\n"), "{text}");
        assert!(text.contains("Tags:        backend\n"), "{text}");
        assert!(!text.contains("iOS, backend"));

        let json = serde_json::to_value(&payload).expect("serialize");
        assert_eq!(json["platform"], "iOS");
        assert!(json.get("shown_tags").is_none());
    }

    #[test]
    fn subitem_payload_is_tagged() {
        let sub = SubItem {
            id: "P-001".to_string(),
            ..SubItem::default()
        };
        let payload = ShowPayload::Subitem {
            parent_id: "P",
            subitem: &sub,
            due_label: None,
            blocked: false,
            dependents: vec![],
        };
        let json = serde_json::to_value(&payload).expect("serialize");
        assert_eq!(json["kind"], "subitem");
        assert_eq!(json["parent_id"], "P");
        assert_eq!(json["subitem"]["id"], "P-001");
    }
}
