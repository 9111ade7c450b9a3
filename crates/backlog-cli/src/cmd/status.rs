//! `bq status`: move an item or subitem to another status.

use backlog_core::model::item::Status;
use clap::Args;

use super::{RunContext, run_mutation};

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Item or subitem id.
    pub id: String,

    /// New status: `todo`, `in_progress`, `completed`, or `cancelled`.
    pub status: Status,
}

pub fn run_status(args: &StatusArgs, ctx: &RunContext) -> anyhow::Result<()> {
    let status = args.status;
    run_mutation(ctx, &args.id, |backlog, gateway, now| {
        let patch = backlog.change_status(gateway, &args.id, status, now)?;
        let message = if patch.is_some() {
            format!("{} is now {status}", args.id)
        } else {
            format!("{} is already {status}", args.id)
        };
        Ok((patch, message))
    })
}
