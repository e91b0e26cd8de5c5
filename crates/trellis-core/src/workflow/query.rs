//! Dependency query service.
//!
//! A `DependencyQuery` pins one project snapshot and a task. Iterating it
//! builds display records lazily; it can be iterated again with identical
//! results, and later writes to the project are never observed.

use std::sync::Arc;

use super::project::ProjectWorkflow;
use super::store::NodeIndex;
use crate::domain::{DependencyRecord, TaskId, WorkflowError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Tasks the queried task depends on.
    Dependencies,
    /// Tasks that depend on the queried task.
    Dependents,
}

#[derive(Debug, Clone)]
pub struct DependencyQuery {
    snapshot: Arc<ProjectWorkflow>,
    node: NodeIndex,
    direction: Direction,
}

impl DependencyQuery {
    pub fn new(
        snapshot: Arc<ProjectWorkflow>,
        task: TaskId,
        direction: Direction,
    ) -> Result<Self, WorkflowError> {
        let node = snapshot
            .store()
            .index_of(task)
            .ok_or(WorkflowError::TaskNotFound(task))?;
        Ok(Self {
            snapshot,
            node,
            direction,
        })
    }

    pub fn task_id(&self) -> TaskId {
        self.snapshot.store().at(self.node).id
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    fn neighbours(&self) -> &[NodeIndex] {
        let graph = self.snapshot.graph();
        match self.direction {
            Direction::Dependencies => graph.dependencies_of(self.node),
            Direction::Dependents => graph.dependents_of(self.node),
        }
    }

    pub fn len(&self) -> usize {
        self.neighbours().len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbours().is_empty()
    }

    /// Fresh iterator over the records, starting from the first one.
    pub fn iter(&self) -> impl Iterator<Item = DependencyRecord> + '_ {
        self.neighbours().iter().map(|&idx| {
            let task = self.snapshot.store().at(idx);
            DependencyRecord {
                id: task.id,
                title: task.title.clone(),
                status: task.status,
                blocked: self.snapshot.is_blocked_at(idx),
            }
        })
    }
}

impl<'a> IntoIterator for &'a DependencyQuery {
    type Item = DependencyRecord;
    type IntoIter = Box<dyn Iterator<Item = DependencyRecord> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
