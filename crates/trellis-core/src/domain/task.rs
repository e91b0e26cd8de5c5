//! Task record, dependency edge and read models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ProjectId, TaskId};
use super::status::TaskStatus;

/// A unit of work inside a project.
///
/// State changes go through methods so `updated_at` stays honest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub project_id: ProjectId,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    /// Usernames allowed to change the status, in assignment order.
    #[serde(default)]
    pub members: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// New tasks always start out `Pending`.
    pub fn new(
        id: TaskId,
        project_id: ProjectId,
        title: impl Into<String>,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            project_id,
            title: title.into(),
            description: description.into(),
            status: TaskStatus::Pending,
            members: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the status. Callers are expected to have consulted the guard.
    pub fn set_status(&mut self, status: TaskStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
    }

    pub fn is_member(&self, username: &str) -> bool {
        self.members.iter().any(|m| m == username)
    }

    /// Returns false if `username` was already a member.
    pub fn add_member(&mut self, username: &str, now: DateTime<Utc>) -> bool {
        if self.is_member(username) {
            return false;
        }
        self.members.push(username.to_string());
        self.updated_at = now;
        true
    }

    /// Returns false if `username` was not a member.
    pub fn remove_member(&mut self, username: &str, now: DateTime<Utc>) -> bool {
        let Some(pos) = self.members.iter().position(|m| m == username) else {
            return false;
        };
        self.members.remove(pos);
        self.updated_at = now;
        true
    }
}

/// Directed dependency: `to` depends on `from`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyEdge {
    #[serde(rename = "fromTaskId")]
    pub from: TaskId,
    #[serde(rename = "toTaskId")]
    pub to: TaskId,
}

impl DependencyEdge {
    pub fn new(from: TaskId, to: TaskId) -> Self {
        Self { from, to }
    }
}

/// Read model of a task: the record plus its dependencies and derived
/// blocked flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub depends_on: Vec<TaskId>,
    /// True while the guard would refuse moving this task out of `Pending`.
    pub blocked: bool,
}

/// Display record for one dependency (or dependent) of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyRecord {
    pub id: TaskId,
    pub title: String,
    pub status: TaskStatus,
    pub blocked: bool,
}

/// Whole-project view: nodes in creation order plus every edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectGraphView {
    pub nodes: Vec<TaskView>,
    pub dependencies: Vec<DependencyEdge>,
}
