mod cli;
mod commands;
mod logging;
mod workflow_file;

use std::io;

use anyhow::Context;
use trellis_core::WorkflowCoordinator;
use trellis_core::app::{CoordinatorConfig, load_from_path};

use crate::cli::Command;

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("trellis error: {err:#}");
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;

    let config = match &args.config {
        Some(path) => load_from_path(path).with_context(|| format!("loading config {:?}", path))?,
        None => CoordinatorConfig::default(),
    };
    let coordinator = WorkflowCoordinator::new(config);
    let mut out = io::stdout().lock();

    match &args.command {
        Command::Check(wf) => commands::check(&coordinator, &wf.workflow, &mut out).await,
        Command::Plan(wf) => commands::plan(&coordinator, &wf.workflow, &mut out).await,
        Command::Transition {
            workflow,
            task,
            status,
            user,
        } => {
            commands::transition(&coordinator, &workflow.workflow, task, status, user, &mut out)
                .await
        }
    }
}
