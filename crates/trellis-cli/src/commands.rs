//! Subcommand implementations. Results go to stdout, logs to stderr.

use std::io::Write;

use anyhow::{Context, Result, anyhow};
use serde_json::json;
use tracing::info;

use trellis_core::WorkflowCoordinator;
use trellis_core::domain::{Actor, RequestContext, TaskStatus};

use crate::workflow_file::{self, LoadedWorkflow};

async fn load(coordinator: &WorkflowCoordinator, path: &std::path::Path) -> Result<LoadedWorkflow> {
    let file = workflow_file::load_from_path(path)?;
    workflow_file::build(coordinator, &file).await
}

/// Print the project graph as JSON, plus the key -> id mapping.
pub async fn check(
    coordinator: &WorkflowCoordinator,
    path: &std::path::Path,
    out: &mut impl Write,
) -> Result<()> {
    let loaded = load(coordinator, path).await?;
    let graph = coordinator.project_graph(&loaded.ctx).await?;
    let counts = coordinator.counts(&loaded.ctx).await?;

    let report = json!({
        "tasks": loaded.ids(),
        "graph": graph,
        "counts": counts,
    });
    writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    info!(tasks = counts.total(), dependencies = counts.dependencies, "workflow is consistent");
    Ok(())
}

/// One line per task, dependencies first: `key<TAB>status[<TAB>blocked]`.
pub async fn plan(
    coordinator: &WorkflowCoordinator,
    path: &std::path::Path,
    out: &mut impl Write,
) -> Result<()> {
    let loaded = load(coordinator, path).await?;
    for id in coordinator.execution_order(&loaded.ctx).await? {
        let view = coordinator.get_task(&loaded.ctx, id).await?;
        let key = loaded.key(id);
        if view.blocked {
            writeln!(out, "{key}\t{}\tblocked", view.task.status)?;
        } else {
            writeln!(out, "{key}\t{}", view.task.status)?;
        }
    }
    Ok(())
}

/// Apply one status change and print the updated task as JSON.
pub async fn transition(
    coordinator: &WorkflowCoordinator,
    path: &std::path::Path,
    key: &str,
    status: &str,
    user: &str,
    out: &mut impl Write,
) -> Result<()> {
    let status: TaskStatus = status.parse().map_err(|e: String| anyhow!(e))?;
    let loaded = load(coordinator, path).await?;
    let id = loaded.id(key)?;
    let ctx = RequestContext::new(loaded.ctx.project_id, Actor::member(user));

    coordinator
        .apply_transition(&ctx, id, status)
        .await
        .with_context(|| format!("moving task '{key}' to {status}"))?;

    let view = coordinator.get_task(&ctx, id).await?;
    writeln!(out, "{}", serde_json::to_string_pretty(&view)?)?;
    Ok(())
}
