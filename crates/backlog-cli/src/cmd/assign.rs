//! `bq assign`: release and epic assignment.

use clap::{ArgGroup, Args};

use super::{RunContext, run_mutation};

#[derive(Args, Debug)]
#[command(group(
    ArgGroup::new("action")
        .required(true)
        .multiple(false)
        .args(["release", "epic", "clear_release", "clear_epic"])
))]
pub struct AssignArgs {
    /// Item id (subitems cannot be assigned).
    pub id: String,

    /// Assign to this release.
    #[arg(long, value_name = "RELEASE_ID")]
    pub release: Option<String>,

    /// Pin the release assignment to a platform.
    #[arg(long, requires = "release")]
    pub platform: Option<String>,

    /// Assign to this epic.
    #[arg(long, value_name = "EPIC_ID")]
    pub epic: Option<String>,

    /// Remove the release assignment.
    #[arg(long)]
    pub clear_release: bool,

    /// Remove the epic assignment.
    #[arg(long)]
    pub clear_epic: bool,
}

pub fn run_assign(args: &AssignArgs, ctx: &RunContext) -> anyhow::Result<()> {
    run_mutation(ctx, &args.id, |backlog, gateway, now| {
        let id = args.id.as_str();
        if let Some(release) = &args.release {
            let patch =
                backlog.assign_release(gateway, id, release, args.platform.as_deref(), now)?;
            return Ok((Some(patch), format!("{id} assigned to release {}", release.trim())));
        }
        if let Some(epic) = &args.epic {
            let patch = backlog.assign_epic(gateway, id, epic, now)?;
            return Ok((Some(patch), format!("{id} assigned to epic {}", epic.trim())));
        }
        if args.clear_release {
            let patch = backlog.unassign_release(gateway, id, now)?;
            return Ok((Some(patch), format!("{id} removed from its release")));
        }
        let patch = backlog.unassign_epic(gateway, id, now)?;
        Ok((Some(patch), format!("{id} removed from its epic")))
    })
}
