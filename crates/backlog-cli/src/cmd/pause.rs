//! `bq pause`: record why work on an entity stopped.

use clap::Args;

use super::{RunContext, run_mutation};

#[derive(Args, Debug)]
pub struct PauseArgs {
    /// Item or subitem id.
    pub id: String,

    /// Reason for pausing (remaining words are joined).
    #[arg(required = true, num_args = 1..)]
    pub reason: Vec<String>,
}

pub fn run_pause(args: &PauseArgs, ctx: &RunContext) -> anyhow::Result<()> {
    let reason = args.reason.join(" ");
    run_mutation(ctx, &args.id, |backlog, gateway, now| {
        let patch = backlog.pause(gateway, &args.id, &reason, now)?;
        Ok((Some(patch), format!("Paused {}: {}", args.id, reason.trim())))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pause_args_join_reason_words() {
        use clap::Parser;

        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            args: PauseArgs,
        }
        let w = Wrapper::parse_from(["test", "XACA-0001", "waiting", "on", "review"]);
        assert_eq!(w.args.reason.join(" "), "waiting on review");
        assert!(Wrapper::try_parse_from(["test", "XACA-0001"]).is_err());
    }
}
