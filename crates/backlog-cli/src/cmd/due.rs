//! `bq due`: set or clear a due date.

use clap::Args;

use super::{RunContext, parse_date_arg, run_mutation};

#[derive(Args, Debug)]
pub struct DueArgs {
    /// Item or subitem id.
    pub id: String,

    /// Due date as `YYYY-MM-DD`.
    #[arg(required_unless_present = "clear", conflicts_with = "clear")]
    pub date: Option<String>,

    /// Remove the due date.
    #[arg(long)]
    pub clear: bool,
}

pub fn run_due(args: &DueArgs, ctx: &RunContext) -> anyhow::Result<()> {
    let date = match args.date.as_deref() {
        Some(raw) if !args.clear => Some(parse_date_arg(ctx, raw)?),
        _ => None,
    };

    run_mutation(ctx, &args.id, |backlog, gateway, now| match date {
        Some(date) => {
            let patch = backlog.set_due_date(gateway, &args.id, date, now)?;
            Ok((Some(patch), format!("{} is due {date}", args.id)))
        }
        None => {
            let patch = backlog.clear_due_date(gateway, &args.id, now)?;
            Ok((Some(patch), format!("{} has no due date", args.id)))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: DueArgs,
    }

    #[test]
    fn due_args_take_a_date_or_clear() {
        let w = Wrapper::parse_from(["test", "XACA-0001", "2026-03-01"]);
        assert_eq!(w.args.date.as_deref(), Some("2026-03-01"));
        assert!(!w.args.clear);

        let w = Wrapper::parse_from(["test", "XACA-0001", "--clear"]);
        assert!(w.args.clear);
        assert!(w.args.date.is_none());
    }

    #[test]
    fn due_args_require_exactly_one_of_date_and_clear() {
        assert!(Wrapper::try_parse_from(["test", "XACA-0001"]).is_err());
        assert!(Wrapper::try_parse_from(["test", "XACA-0001", "2026-03-01", "--clear"]).is_err());
    }
}
