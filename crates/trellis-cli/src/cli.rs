//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Command-line arguments for `trellis`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "trellis",
    version,
    about = "Check task dependencies and status transitions of a workflow file.",
    long_about = None
)]
pub struct CliArgs {
    /// Coordinator config (TOML). Built-in defaults when omitted.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TRELLIS_LOG` or `info` is used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Load the workflow and print the resulting project graph as JSON.
    Check(WorkflowArg),

    /// Print the tasks in an order that respects every dependency.
    Plan(WorkflowArg),

    /// Try to move one task to a new status.
    Transition {
        #[command(flatten)]
        workflow: WorkflowArg,

        /// Key of the task (`[task.<key>]`).
        #[arg(long, value_name = "KEY")]
        task: String,

        /// Target status: pending, in_progress or completed.
        #[arg(long, value_name = "STATUS")]
        status: String,

        /// Acting user. Must be one of the task's `members`.
        #[arg(long, value_name = "NAME")]
        user: String,
    },
}

#[derive(Debug, Clone, Args)]
pub struct WorkflowArg {
    /// Workflow file (TOML).
    #[arg(long, value_name = "PATH")]
    pub workflow: PathBuf,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_arguments_are_parsed() {
        let args = CliArgs::try_parse_from([
            "trellis",
            "transition",
            "--workflow",
            "wf.toml",
            "--task",
            "build",
            "--status",
            "in_progress",
            "--user",
            "ana",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
        match args.command {
            Command::Transition { workflow, task, status, user } => {
                assert_eq!(workflow.workflow, PathBuf::from("wf.toml"));
                assert_eq!(task, "build");
                assert_eq!(status, "in_progress");
                assert_eq!(user, "ana");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn transition_needs_a_user() {
        let parsed = CliArgs::try_parse_from([
            "trellis", "transition", "--workflow", "wf.toml", "--task", "a", "--status", "completed",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn workflow_path_is_required() {
        assert!(CliArgs::try_parse_from(["trellis", "plan"]).is_err());
    }
}
