#![forbid(unsafe_code)]

mod cmd;
mod output;

use backlog_core::config::resolve_config;
use clap::{CommandFactory, Parser, Subcommand};
use cmd::RunContext;
use output::OutputMode;
use std::env;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "bq",
    author,
    version,
    about = "bq: work-item queue for a team backlog",
    long_about = None
)]
struct Cli {
    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Snapshot file (default: `BACKLOG_SNAPSHOT`, then the project config).
    #[arg(long, global = true, value_name = "PATH")]
    snapshot: Option<PathBuf>,

    /// Evaluate due dates as of this local date (`YYYY-MM-DD`).
    #[arg(long, global = true, value_name = "DATE")]
    today: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Read",
        about = "Show the ordered backlog",
        long_about = "Filter and order the backlog, with effective due dates, blocking and rolled-up work time.",
        after_help = "EXAMPLES:\n    # Everything open, priority order\n    bq queue\n\n    # Due this week, earliest first\n    bq queue --status due_this_week --sort due_date\n\n    # Items without a platform tag\n    bq queue --os none --json"
    )]
    Queue(cmd::queue::QueueArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show one item or subitem",
        after_help = "EXAMPLES:\n    # Show an item\n    bq show XACA-0001\n\n    # Show a subitem\n    bq show XACA-0001-002 --json"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Read",
        about = "Count items per status category"
    )]
    Stats(cmd::stats::StatsArgs),

    #[command(
        next_help_heading = "Update",
        about = "Change status",
        long_about = "Move an item or subitem to any status. Completion and cancellation timestamps follow the status.",
        after_help = "EXAMPLES:\n    # Start work\n    bq status XACA-0001 in_progress\n\n    # Undo an accidental completion\n    bq status XACA-0001 todo"
    )]
    Status(cmd::status::StatusArgs),

    #[command(
        next_help_heading = "Update",
        about = "Set or clear a due date",
        after_help = "EXAMPLES:\n    # Set a date\n    bq due XACA-0001 2026-03-01\n\n    # Remove it\n    bq due XACA-0001 --clear"
    )]
    Due(cmd::due::DueArgs),

    #[command(next_help_heading = "Update", about = "Change priority")]
    Priority(cmd::priority::PriorityArgs),

    #[command(
        next_help_heading = "Update",
        about = "Pause work with a reason",
        after_help = "EXAMPLES:\n    bq pause XACA-0001 waiting on design review"
    )]
    Pause(cmd::pause::PauseArgs),

    #[command(next_help_heading = "Update", about = "Resume paused work")]
    Resume(cmd::resume::ResumeArgs),

    #[command(
        next_help_heading = "Update",
        about = "Assign or unassign a release or epic",
        after_help = "EXAMPLES:\n    bq assign XACA-0001 --release REL-4 --platform ios\n    bq assign XACA-0001 --clear-epic"
    )]
    Assign(cmd::assign::AssignArgs),

    #[command(next_help_heading = "Update", about = "Toggle an item's collapsed state")]
    Collapse(cmd::collapse::CollapseArgs),

    #[command(
        next_help_heading = "Project Maintenance",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    bq completions bash\n\n    # Generate zsh completions\n    bq completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("BACKLOG_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "backlog=debug,info"
        } else {
            "backlog=info,warn"
        })
    });

    let format = env::var("BACKLOG_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let project_root = env::current_dir()?;

    if let Commands::Completions(args) = &cli.command {
        let mut command = Cli::command();
        return cmd::completions::run_completions(args.shell, &mut command);
    }

    let output = match cli.format {
        Some(mode) => mode,
        None => OutputMode::from_resolved(
            &resolve_config(&project_root, cli.json)?.resolved_output,
        ),
    };
    let ctx = RunContext {
        output,
        project_root,
        snapshot: cmd::snapshot_from_env(cli.snapshot.clone()),
        today: cmd::resolve_today(cli.today.as_deref())?,
    };
    debug!(?ctx, "resolved run context");

    match &cli.command {
        Commands::Queue(args) => cmd::queue::run_queue(args, &ctx),
        Commands::Show(args) => cmd::show::run_show(args, &ctx),
        Commands::Stats(args) => cmd::stats::run_stats(args, &ctx),
        Commands::Status(args) => cmd::status::run_status(args, &ctx),
        Commands::Due(args) => cmd::due::run_due(args, &ctx),
        Commands::Priority(args) => cmd::priority::run_priority(args, &ctx),
        Commands::Pause(args) => cmd::pause::run_pause(args, &ctx),
        Commands::Resume(args) => cmd::resume::run_resume(args, &ctx),
        Commands::Assign(args) => cmd::assign::run_assign(args, &ctx),
        Commands::Collapse(args) => cmd::collapse::run_collapse(args, &ctx),
        Commands::Completions(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_flag_parses_before_and_after_subcommand() {
        let cli = Cli::parse_from(["bq", "--json", "queue"]);
        assert!(cli.json);
        let cli = Cli::parse_from(["bq", "queue", "--json"]);
        assert!(cli.json);
    }

    #[test]
    fn format_flag_is_global() {
        let cli = Cli::parse_from(["bq", "stats", "--format", "text"]);
        assert_eq!(cli.format, Some(OutputMode::Text));
    }

    #[test]
    fn snapshot_and_today_flags_parse() {
        let cli = Cli::parse_from([
            "bq",
            "--snapshot",
            "data/snap.json",
            "queue",
            "--today",
            "2026-02-10",
        ]);
        assert_eq!(cli.snapshot, Some(PathBuf::from("data/snap.json")));
        assert_eq!(cli.today.as_deref(), Some("2026-02-10"));
    }

    #[test]
    fn completions_subcommand_parses() {
        let cli = Cli::parse_from(["bq", "completions", "bash"]);
        assert!(matches!(
            cli.command,
            Commands::Completions(cmd::completions::CompletionsArgs {
                shell: clap_complete::Shell::Bash,
            })
        ));
    }

    #[test]
    fn all_subcommands_listed() {
        let subcommands = [
            vec!["bq", "queue"],
            vec!["bq", "show", "x"],
            vec!["bq", "stats"],
            vec!["bq", "status", "x", "completed"],
            vec!["bq", "due", "x", "2026-03-01"],
            vec!["bq", "due", "x", "--clear"],
            vec!["bq", "priority", "x", "low"],
            vec!["bq", "pause", "x", "lunch"],
            vec!["bq", "resume", "x"],
            vec!["bq", "assign", "x", "--epic", "E-1"],
            vec!["bq", "collapse", "x"],
            vec!["bq", "completions", "zsh"],
        ];
        for args in &subcommands {
            let result = Cli::try_parse_from(args.iter());
            assert!(result.is_ok(), "failed to parse {args:?}: {:?}", result.err());
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
