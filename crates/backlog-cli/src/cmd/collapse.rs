use clap::Args;

use super::{RunContext, run_mutation};

#[derive(Args, Debug)]
pub struct CollapseArgs {
    /// Item id.
    pub id: String,
}

/// Flip an item's expand/collapse state.
pub fn run_collapse(args: &CollapseArgs, ctx: &RunContext) -> anyhow::Result<()> {
    run_mutation(ctx, &args.id, |backlog, gateway, _now| {
        let collapsed = backlog.toggle_collapsed(gateway, &args.id)?;
        let state = if collapsed { "collapsed" } else { "expanded" };
        Ok((None, format!("{} {state}", args.id)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapse_args_parses_id() {
        use clap::Parser;

        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            args: CollapseArgs,
        }
        let w = Wrapper::parse_from(["test", "XACA-0001"]);
        assert_eq!(w.args.id, "XACA-0001");
    }
}
