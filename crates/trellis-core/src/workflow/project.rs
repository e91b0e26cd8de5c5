//! One project's workflow: task store + dependency graph + guard.
//!
//! Everything here is synchronous and single-owner. The coordinator wraps a
//! `ProjectWorkflow` in an `Arc` and mutates it copy-on-write, so a cloned
//! `Arc` is a consistent snapshot.

use chrono::{DateTime, Utc};

use super::dependency::{DependencyGraph, EdgeRejection};
use super::guard::{TransitionDecision, TransitionGuard};
use super::store::{NodeIndex, TaskStore};
use crate::domain::{
    DependencyEdge, ProjectGraphView, ProjectId, Task, TaskId, TaskStatus, TaskView,
    WorkflowError,
};

#[derive(Debug, Clone)]
pub struct ProjectWorkflow {
    id: ProjectId,
    store: TaskStore,
    graph: DependencyGraph,
    guard: TransitionGuard,
}

impl ProjectWorkflow {
    pub fn new(id: ProjectId, guard: TransitionGuard) -> Self {
        Self {
            id,
            store: TaskStore::new(),
            graph: DependencyGraph::new(),
            guard,
        }
    }

    pub fn id(&self) -> ProjectId {
        self.id
    }

    pub fn guard(&self) -> TransitionGuard {
        self.guard
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    fn index(&self, id: TaskId) -> Result<NodeIndex, WorkflowError> {
        self.store.index_of(id).ok_or(WorkflowError::TaskNotFound(id))
    }

    pub fn task(&self, id: TaskId) -> Result<&Task, WorkflowError> {
        self.store.get(id).ok_or(WorkflowError::TaskNotFound(id))
    }

    /// Insert a new task. The task must belong to this project and start
    /// out `Pending`.
    pub fn insert_task(&mut self, task: Task) -> Result<&Task, WorkflowError> {
        if task.project_id != self.id {
            return Err(WorkflowError::InvalidTask(format!(
                "task {} belongs to {}, not {}",
                task.id, task.project_id, self.id
            )));
        }
        if task.title.trim().is_empty() {
            return Err(WorkflowError::InvalidTask("title must not be empty".into()));
        }
        if !task.status.is_pending() {
            return Err(WorkflowError::InvalidTask(format!(
                "task {} must be created Pending, not {}",
                task.id, task.status
            )));
        }
        let idx = self
            .store
            .insert(task)
            .map_err(|e| WorkflowError::InvalidTask(e.to_string()))?;
        self.graph.add_node();
        debug_assert_eq!(self.graph.node_count(), self.store.len());
        Ok(self.store.at(idx))
    }

    /// Assign `usernames` to the task. Returns the ones that were not
    /// members yet, in the order given.
    pub fn add_members(
        &mut self,
        id: TaskId,
        usernames: &[&str],
        now: DateTime<Utc>,
    ) -> Result<Vec<String>, WorkflowError> {
        if usernames.iter().any(|u| u.trim().is_empty()) {
            return Err(WorkflowError::InvalidTask("member username must not be empty".into()));
        }
        let task = self.store.get_mut(id).ok_or(WorkflowError::TaskNotFound(id))?;
        Ok(usernames
            .iter()
            .filter(|u| task.add_member(u, now))
            .map(|u| u.to_string())
            .collect())
    }

    /// Unassign `username`. A completed task keeps its members.
    pub fn remove_member(
        &mut self,
        id: TaskId,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<&Task, WorkflowError> {
        let task = self.store.get_mut(id).ok_or(WorkflowError::TaskNotFound(id))?;
        if task.status.is_completed() {
            return Err(WorkflowError::TaskCompleted { task: id });
        }
        if !task.remove_member(username, now) {
            return Err(WorkflowError::MemberNotFound {
                task: id,
                username: username.to_string(),
            });
        }
        Ok(&*task)
    }

    /// Add `from -> to` ("`to` depends on `from`").
    pub fn add_dependency(
        &mut self,
        from: TaskId,
        to: TaskId,
    ) -> Result<DependencyEdge, WorkflowError> {
        let from_idx = self.index(from)?;
        let to_idx = self.index(to)?;

        match self.graph.add_edge(from_idx, to_idx) {
            Ok(()) => Ok(DependencyEdge::new(from, to)),
            Err(EdgeRejection::SelfLoop) => Err(WorkflowError::SelfDependency { task: from }),
            Err(EdgeRejection::Duplicate) => Err(WorkflowError::DuplicateEdge { from, to }),
            Err(EdgeRejection::Cycle) => Err(WorkflowError::CycleDetected { from, to }),
        }
    }

    pub fn remove_dependency(
        &mut self,
        from: TaskId,
        to: TaskId,
    ) -> Result<DependencyEdge, WorkflowError> {
        let from_idx = self.index(from)?;
        let to_idx = self.index(to)?;

        if self.graph.remove_edge(from_idx, to_idx) {
            Ok(DependencyEdge::new(from, to))
        } else {
            Err(WorkflowError::DependencyNotFound { from, to })
        }
    }

    /// Does `to` directly depend on `from`? Unknown ids answer false.
    pub fn has_dependency(&self, from: TaskId, to: TaskId) -> bool {
        match (self.store.index_of(from), self.store.index_of(to)) {
            (Some(f), Some(t)) => self.graph.contains_edge(f, t),
            _ => false,
        }
    }

    /// Ids of the tasks `id` directly depends on.
    pub fn dependency_ids(&self, id: TaskId) -> Result<Vec<TaskId>, WorkflowError> {
        let idx = self.index(id)?;
        Ok(self.ids(self.graph.dependencies_of(idx)))
    }

    /// Ids of the tasks that directly depend on `id`.
    pub fn dependent_ids(&self, id: TaskId) -> Result<Vec<TaskId>, WorkflowError> {
        let idx = self.index(id)?;
        Ok(self.ids(self.graph.dependents_of(idx)))
    }

    fn ids(&self, nodes: &[NodeIndex]) -> Vec<TaskId> {
        nodes.iter().map(|&n| self.store.at(n).id).collect()
    }

    pub(crate) fn is_blocked_at(&self, idx: NodeIndex) -> bool {
        let task = self.store.at(idx);
        let deps = self.graph.dependencies_of(idx).iter().map(|&n| self.store.at(n).id);
        self.guard.is_blocked(task, deps, &self.store)
    }

    pub fn can_transition(
        &self,
        id: TaskId,
        new_status: TaskStatus,
    ) -> Result<TransitionDecision, WorkflowError> {
        let idx = self.index(id)?;
        let task = self.store.at(idx);
        let deps = self.graph.dependencies_of(idx).iter().map(|&n| self.store.at(n).id);
        Ok(self.guard.can_transition(task, new_status, deps, &self.store))
    }

    /// Commit `new_status` if the guard allows it. Returns the previous
    /// status alongside the updated record.
    pub fn apply_transition(
        &mut self,
        id: TaskId,
        new_status: TaskStatus,
        now: DateTime<Utc>,
    ) -> Result<(TaskStatus, &Task), WorkflowError> {
        self.can_transition(id, new_status)?.into_result(id)?;

        let task = self.store.get_mut(id).ok_or(WorkflowError::TaskNotFound(id))?;
        let previous = task.status;
        if previous != new_status {
            task.set_status(new_status, now);
        }
        Ok((previous, &*task))
    }

    pub fn view(&self, id: TaskId) -> Result<TaskView, WorkflowError> {
        let idx = self.index(id)?;
        Ok(self.view_at(idx))
    }

    pub(crate) fn view_at(&self, idx: NodeIndex) -> TaskView {
        TaskView {
            task: self.store.at(idx).clone(),
            depends_on: self.ids(self.graph.dependencies_of(idx)),
            blocked: self.is_blocked_at(idx),
        }
    }

    pub fn edges(&self) -> Vec<DependencyEdge> {
        self.graph
            .edges()
            .map(|(from, to)| DependencyEdge::new(self.store.at(from).id, self.store.at(to).id))
            .collect()
    }

    pub fn graph_view(&self) -> ProjectGraphView {
        ProjectGraphView {
            nodes: NodeIndex::all(self.store.len()).map(|i| self.view_at(i)).collect(),
            dependencies: self.edges(),
        }
    }

    /// Topological order: every task comes after everything it depends on.
    pub fn execution_order(&self) -> Vec<TaskId> {
        // add_dependency never admits a cycle, so Kahn always drains the graph.
        self.graph
            .topological_order()
            .map(|order| self.ids(&order))
            .unwrap_or_default()
    }
}
