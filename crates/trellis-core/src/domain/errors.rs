//! Errors returned by workflow operations.
//!
//! Every variant is recoverable and user-facing. Callers translate them to a
//! transport response with [`WorkflowError::code`] and
//! [`WorkflowError::http_status`].
//!
//! Existing clients match on message text: `CycleDetected` must contain
//! "cycle" and `DuplicateEdge` must contain "dependency already exists".

use thiserror::Error;

use super::ids::{ProjectId, TaskId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("task {task} cannot depend on itself")]
    SelfDependency { task: TaskId },

    #[error("cannot add dependency: cycle detected ({to} depending on {from} would close a cycle)")]
    CycleDetected { from: TaskId, to: TaskId },

    #[error("dependency already exists: {to} already depends on {from}")]
    DuplicateEdge { from: TaskId, to: TaskId },

    #[error("dependency not found: {to} does not depend on {from}")]
    DependencyNotFound { from: TaskId, to: TaskId },

    #[error("cannot change status: dependent task '{dependency_title}' ({dependency}) blocks {task}")]
    DependencyBlocked {
        task: TaskId,
        dependency: TaskId,
        dependency_title: String,
    },

    #[error("cannot change status: dependency {dependency} of {task} could not be resolved")]
    UnresolvedDependency { task: TaskId, dependency: TaskId },

    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),

    #[error("invalid task: {0}")]
    InvalidTask(String),

    #[error("member '{username}' not found in task {task}")]
    MemberNotFound { task: TaskId, username: String },

    #[error("cannot remove member from a completed task ({task})")]
    TaskCompleted { task: TaskId },

    #[error("user '{username}' is not allowed to {action}")]
    Forbidden {
        username: String,
        action: &'static str,
    },
}

impl WorkflowError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            WorkflowError::SelfDependency { .. } => "self_dependency",
            WorkflowError::CycleDetected { .. } => "cycle_detected",
            WorkflowError::DuplicateEdge { .. } => "duplicate_edge",
            WorkflowError::DependencyNotFound { .. } => "dependency_not_found",
            WorkflowError::DependencyBlocked { .. } => "dependency_blocked",
            WorkflowError::UnresolvedDependency { .. } => "unresolved_dependency",
            WorkflowError::TaskNotFound(_) => "task_not_found",
            WorkflowError::ProjectNotFound(_) => "project_not_found",
            WorkflowError::InvalidTask(_) => "invalid_task",
            WorkflowError::MemberNotFound { .. } => "member_not_found",
            WorkflowError::TaskCompleted { .. } => "task_completed",
            WorkflowError::Forbidden { .. } => "forbidden",
        }
    }

    /// HTTP status a request-serving caller should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            WorkflowError::CycleDetected { .. }
            | WorkflowError::DuplicateEdge { .. }
            | WorkflowError::TaskCompleted { .. } => 409,
            WorkflowError::DependencyBlocked { .. }
            | WorkflowError::UnresolvedDependency { .. } => 422,
            WorkflowError::SelfDependency { .. } | WorkflowError::InvalidTask(_) => 400,
            WorkflowError::DependencyNotFound { .. }
            | WorkflowError::TaskNotFound(_)
            | WorkflowError::ProjectNotFound(_)
            | WorkflowError::MemberNotFound { .. } => 404,
            WorkflowError::Forbidden { .. } => 403,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    fn ids() -> (TaskId, TaskId) {
        (TaskId::from_ulid(Ulid::new()), TaskId::from_ulid(Ulid::new()))
    }

    #[test]
    fn cycle_message_keeps_client_substring() {
        let (from, to) = ids();
        let err = WorkflowError::CycleDetected { from, to };
        assert!(err.to_string().contains("cycle"));
        assert_eq!(err.http_status(), 409);
        assert_eq!(err.code(), "cycle_detected");
    }

    #[test]
    fn duplicate_message_keeps_client_substring() {
        let (from, to) = ids();
        let err = WorkflowError::DuplicateEdge { from, to };
        assert!(err.to_string().contains("dependency already exists"));
        assert_eq!(err.http_status(), 409);
    }

    #[test]
    fn blocked_message_names_the_dependency() {
        let (task, dependency) = ids();
        let err = WorkflowError::DependencyBlocked {
            task,
            dependency,
            dependency_title: "design schema".into(),
        };
        assert!(err.to_string().contains("'design schema'"));
        assert_eq!(err.http_status(), 422);
    }
}
