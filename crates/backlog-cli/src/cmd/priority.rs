//! `bq priority`: change priority.

use backlog_core::model::item::Priority;
use clap::Args;

use super::{RunContext, run_mutation};

#[derive(Args, Debug)]
pub struct PriorityArgs {
    /// Item or subitem id.
    pub id: String,

    /// `critical`, `high`, `medium`, or `low`.
    pub priority: Priority,
}

pub fn run_priority(args: &PriorityArgs, ctx: &RunContext) -> anyhow::Result<()> {
    let priority = args.priority;
    run_mutation(ctx, &args.id, |backlog, gateway, now| {
        let patch = backlog.set_priority(gateway, &args.id, priority, now)?;
        Ok((Some(patch), format!("{} priority is now {priority}", args.id)))
    })
}
