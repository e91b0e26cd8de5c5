//! Workflow files: a TOML description of one project's tasks.
//!
//! ```toml
//! [task.design]
//! title = "Design the schema"
//! members = ["ana"]
//! status = "completed"
//!
//! [task.build]
//! title = "Build it"
//! members = ["ana", "ivan"]
//! depends_on = ["design"]
//! ```
//!
//! `title` defaults to the key, `status` to `pending`. A task that starts in
//! any other status needs at least one member; the first one sets it.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use tracing::debug;

use trellis_core::WorkflowCoordinator;
use trellis_core::domain::{Actor, RequestContext, TaskId, TaskStatus};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkflowFile {
    #[serde(default)]
    pub task: BTreeMap<String, TaskEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TaskEntry {
    pub title: Option<String>,
    pub description: String,
    pub status: Option<String>,
    pub members: Vec<String>,
    pub depends_on: Vec<String>,
}

impl TaskEntry {
    fn status(&self, key: &str) -> Result<TaskStatus> {
        match &self.status {
            None => Ok(TaskStatus::Pending),
            Some(raw) => raw
                .parse()
                .map_err(|e: String| anyhow!("task '{key}': {e}")),
        }
    }
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<WorkflowFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading workflow file at {:?}", path))?;
    let file: WorkflowFile = toml::from_str(&contents)
        .with_context(|| format!("parsing TOML workflow from {:?}", path))?;
    Ok(file)
}

/// A workflow file loaded into a coordinator project.
#[derive(Debug, Clone)]
pub struct LoadedWorkflow {
    pub ctx: RequestContext,
    ids: BTreeMap<String, TaskId>,
    keys: HashMap<TaskId, String>,
}

impl LoadedWorkflow {
    pub fn id(&self, key: &str) -> Result<TaskId> {
        self.ids
            .get(key)
            .copied()
            .ok_or_else(|| anyhow!("unknown task key '{key}'"))
    }

    pub fn key(&self, id: TaskId) -> &str {
        self.keys.get(&id).map(String::as_str).unwrap_or("?")
    }

    /// Key -> id, sorted by key.
    pub fn ids(&self) -> &BTreeMap<String, TaskId> {
        &self.ids
    }
}

/// Replay `file` into a fresh project: tasks and their members first, then
/// dependencies, then statuses in execution order so every dependency is
/// settled before its dependents move.
pub async fn build(coordinator: &WorkflowCoordinator, file: &WorkflowFile) -> Result<LoadedWorkflow> {
    let project = coordinator.create_project().await;
    let ctx = RequestContext::new(project, Actor::manager("trellis"));

    let mut ids = BTreeMap::new();
    let mut keys = HashMap::new();
    for (key, entry) in &file.task {
        let title = entry.title.as_deref().unwrap_or(key);
        let task = coordinator
            .create_task(&ctx, title, &entry.description)
            .await
            .with_context(|| format!("creating task '{key}'"))?;
        if !entry.members.is_empty() {
            let members: Vec<&str> = entry.members.iter().map(String::as_str).collect();
            coordinator
                .add_task_members(&ctx, task.id, &members)
                .await
                .with_context(|| format!("assigning members of task '{key}'"))?;
        }
        ids.insert(key.clone(), task.id);
        keys.insert(task.id, key.clone());
    }

    for (key, entry) in &file.task {
        let to = ids[key];
        for dep in &entry.depends_on {
            let Some(&from) = ids.get(dep) else {
                bail!("task '{key}' depends on unknown task '{dep}'");
            };
            coordinator
                .add_dependency(&ctx, from, to)
                .await
                .with_context(|| format!("adding dependency '{dep}' -> '{key}'"))?;
        }
    }

    for id in coordinator.execution_order(&ctx).await? {
        let key = &keys[&id];
        let entry = &file.task[key];
        let status = entry.status(key)?;
        if status.is_pending() {
            continue;
        }
        let Some(member) = entry.members.first() else {
            bail!("task '{key}' has status {status} but no members to set it");
        };
        let as_member = RequestContext::new(project, Actor::member(member.as_str()));
        coordinator
            .apply_transition(&as_member, id, status)
            .await
            .with_context(|| format!("setting task '{key}' to {status}"))?;
    }

    debug!(project = %project, tasks = ids.len(), "workflow file loaded");
    Ok(LoadedWorkflow { ctx, ids, keys })
}
