//! Domain events, emitted to the `EventSink` port after a write commits.

use serde::Serialize;

use super::ids::{ProjectId, TaskId};
use super::status::TaskStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    TaskCreated {
        project: ProjectId,
        task: TaskId,
        title: String,
    },
    DependencyAdded {
        project: ProjectId,
        from: TaskId,
        to: TaskId,
    },
    DependencyRemoved {
        project: ProjectId,
        from: TaskId,
        to: TaskId,
    },
    StatusChanged {
        project: ProjectId,
        task: TaskId,
        from: TaskStatus,
        to: TaskStatus,
        changed_by: String,
    },
    MembersAdded {
        project: ProjectId,
        task: TaskId,
        usernames: Vec<String>,
    },
    MemberRemoved {
        project: ProjectId,
        task: TaskId,
        username: String,
    },
}

impl DomainEvent {
    pub fn project(&self) -> ProjectId {
        match self {
            DomainEvent::TaskCreated { project, .. }
            | DomainEvent::DependencyAdded { project, .. }
            | DomainEvent::DependencyRemoved { project, .. }
            | DomainEvent::StatusChanged { project, .. }
            | DomainEvent::MembersAdded { project, .. }
            | DomainEvent::MemberRemoved { project, .. } => *project,
        }
    }

    /// Short name, used as a log field.
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::TaskCreated { .. } => "task_created",
            DomainEvent::DependencyAdded { .. } => "dependency_added",
            DomainEvent::DependencyRemoved { .. } => "dependency_removed",
            DomainEvent::StatusChanged { .. } => "status_changed",
            DomainEvent::MembersAdded { .. } => "members_added",
            DomainEvent::MemberRemoved { .. } => "member_removed",
        }
    }
}
