//! Status transition guard.
//!
//! A task may leave `Pending` only when every direct dependency satisfies
//! the configured [`TransitionRule`]. Moving back to `Pending` is always
//! allowed, so is re-asserting the current status, and a task without
//! dependencies moves freely.
//!
//! The guard is storage-agnostic: it resolves dependency ids through a
//! [`TaskLookup`], so it works against the project store as well as against
//! a plain map of tasks held by a client.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

use crate::domain::{Task, TaskId, TaskStatus, WorkflowError};

/// When does a dependency stop blocking?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionRule {
    /// Blocks while the dependency is `Pending`.
    #[default]
    DependencyNotPending,

    /// Blocks until the dependency is `Completed`.
    DependencyCompleted,
}

impl TransitionRule {
    pub fn is_satisfied_by(self, dependency: TaskStatus) -> bool {
        match self {
            TransitionRule::DependencyNotPending => !dependency.is_pending(),
            TransitionRule::DependencyCompleted => dependency.is_completed(),
        }
    }
}

/// What to do with a dependency id that does not resolve to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedPolicy {
    /// Refuse the transition.
    #[default]
    Block,

    /// Log a warning and ignore the missing dependency.
    Warn,
}

/// Outcome of evaluating a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionDecision {
    Allowed,
    Blocked {
        dependency: TaskId,
        dependency_title: String,
    },
    Unresolved {
        dependency: TaskId,
    },
}

impl TransitionDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, TransitionDecision::Allowed)
    }

    /// Turn a refusal into the matching `WorkflowError` for `task`.
    pub fn into_result(self, task: TaskId) -> Result<(), WorkflowError> {
        match self {
            TransitionDecision::Allowed => Ok(()),
            TransitionDecision::Blocked {
                dependency,
                dependency_title,
            } => Err(WorkflowError::DependencyBlocked {
                task,
                dependency,
                dependency_title,
            }),
            TransitionDecision::Unresolved { dependency } => {
                Err(WorkflowError::UnresolvedDependency { task, dependency })
            }
        }
    }
}

/// Resolves dependency ids to task records.
pub trait TaskLookup {
    fn lookup(&self, id: TaskId) -> Option<&Task>;
}

impl TaskLookup for HashMap<TaskId, Task> {
    fn lookup(&self, id: TaskId) -> Option<&Task> {
        self.get(&id)
    }
}

impl TaskLookup for super::store::TaskStore {
    fn lookup(&self, id: TaskId) -> Option<&Task> {
        self.get(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct TransitionGuard {
    pub rule: TransitionRule,
    pub unresolved: UnresolvedPolicy,
}

impl TransitionGuard {
    pub fn new(rule: TransitionRule, unresolved: UnresolvedPolicy) -> Self {
        Self { rule, unresolved }
    }

    /// Decide whether `task` may move to `new_status`.
    ///
    /// The first refusing dependency (in iteration order) is reported.
    pub fn can_transition<L: TaskLookup + ?Sized>(
        &self,
        task: &Task,
        new_status: TaskStatus,
        dependencies: impl IntoIterator<Item = TaskId>,
        lookup: &L,
    ) -> TransitionDecision {
        if new_status.is_pending() || new_status == task.status {
            return TransitionDecision::Allowed;
        }

        for dependency in dependencies {
            match lookup.lookup(dependency) {
                None => match self.unresolved {
                    UnresolvedPolicy::Block => {
                        return TransitionDecision::Unresolved { dependency };
                    }
                    UnresolvedPolicy::Warn => {
                        warn!(
                            task = %task.id,
                            %dependency,
                            "dependency could not be resolved; ignoring it"
                        );
                    }
                },
                Some(dep) if !self.rule.is_satisfied_by(dep.status) => {
                    return TransitionDecision::Blocked {
                        dependency: dep.id,
                        dependency_title: dep.title.clone(),
                    };
                }
                Some(_) => {}
            }
        }
        TransitionDecision::Allowed
    }

    /// Evaluate and, if allowed, commit the new status on `task`.
    ///
    /// On refusal `task` is left untouched.
    pub fn apply_transition<L: TaskLookup + ?Sized>(
        &self,
        task: &mut Task,
        new_status: TaskStatus,
        dependencies: impl IntoIterator<Item = TaskId>,
        lookup: &L,
        now: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        self.can_transition(task, new_status, dependencies, lookup)
            .into_result(task.id)?;
        if task.status != new_status {
            task.set_status(new_status, now);
        }
        Ok(())
    }

    /// True while `task` could not leave `Pending`.
    pub fn is_blocked<L: TaskLookup + ?Sized>(
        &self,
        task: &Task,
        dependencies: impl IntoIterator<Item = TaskId>,
        lookup: &L,
    ) -> bool {
        task.status.is_pending()
            && !self
                .can_transition(task, TaskStatus::InProgress, dependencies, lookup)
                .is_allowed()
    }
}
