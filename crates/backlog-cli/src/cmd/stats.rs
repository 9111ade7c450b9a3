//! `bq stats`: how many items each status category holds.

use std::io::Write;

use backlog_core::queue::stats::{CategoryCounts, category_counts};
use clap::Args;
use serde::Serialize;

use super::{RunContext, Workspace};
use crate::output::{field, heading, print_value};

/// Arguments for `bq stats`.
#[derive(Args, Debug, Default)]
pub struct StatsArgs {}

#[derive(Debug, Serialize)]
struct StatsPayload {
    team: String,
    today: chrono::NaiveDate,
    counts: CategoryCounts,
}

pub fn run_stats(_args: &StatsArgs, ctx: &RunContext) -> anyhow::Result<()> {
    let workspace = Workspace::open(ctx)?;
    let payload = StatsPayload {
        team: workspace.backlog.team().to_string(),
        today: ctx.today,
        counts: category_counts(workspace.backlog.items(), ctx.today),
    };
    print_value(ctx.output, &payload, render_stats_text, render_stats_pretty)
}

fn rows(counts: &CategoryCounts) -> [(&'static str, usize); 8] {
    [
        ("all", counts.all),
        ("in_progress", counts.in_progress),
        ("paused", counts.paused),
        ("blocked", counts.blocked),
        ("completed", counts.completed),
        ("past_due", counts.past_due),
        ("due_today", counts.due_today),
        ("due_this_week", counts.due_this_week),
    ]
}

fn render_stats_text(payload: &StatsPayload, w: &mut dyn Write) -> std::io::Result<()> {
    for (key, count) in rows(&payload.counts) {
        writeln!(w, "{key}\t{count}")?;
    }
    Ok(())
}

fn render_stats_pretty(payload: &StatsPayload, w: &mut dyn Write) -> std::io::Result<()> {
    heading(w, &format!("Backlog for {} on {}", payload.team, payload.today))?;
    for (key, count) in rows(&payload.counts) {
        field(w, key, count.to_string())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_stats_list_every_category() {
        let payload = StatsPayload {
            team: "core".to_string(),
            today: chrono::NaiveDate::from_ymd_opt(2026, 2, 10).expect("valid date"),
            counts: CategoryCounts {
                all: 4,
                blocked: 1,
                ..CategoryCounts::default()
            },
        };
        let mut buf = Vec::new();
        render_stats_text(&payload, &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert_eq!(text.lines().count(), 8);
        assert!(text.starts_with("all\t4\n"));
        assert!(text.contains("blocked\t1\n"));
    }
}
