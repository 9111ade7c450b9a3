use clap::Args;

use super::{RunContext, run_mutation};

#[derive(Args, Debug)]
pub struct ResumeArgs {
    /// Item or subitem id.
    pub id: String,
}

pub fn run_resume(args: &ResumeArgs, ctx: &RunContext) -> anyhow::Result<()> {
    run_mutation(ctx, &args.id, |backlog, gateway, now| {
        let patch = backlog.resume(gateway, &args.id, now)?;
        Ok((Some(patch), format!("Resumed {}", args.id)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resume_args_parses_id() {
        use clap::Parser;

        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            args: ResumeArgs,
        }
        let w = Wrapper::parse_from(["test", "XACA-0001-003"]);
        assert_eq!(w.args.id, "XACA-0001-003");
    }
}
