//! Status - per-project counters.

use serde::{Deserialize, Serialize};

use crate::domain::TaskStatus;
use crate::workflow::ProjectWorkflow;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectCounts {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    /// Pending tasks the guard currently refuses to start.
    pub blocked: usize,
    pub dependencies: usize,
}

impl ProjectCounts {
    pub fn from_project(project: &ProjectWorkflow) -> Self {
        let mut counts = ProjectCounts {
            dependencies: project.graph().edge_count(),
            ..Default::default()
        };
        for (idx, task) in project.store().iter_indexed() {
            match task.status {
                TaskStatus::Pending => counts.pending += 1,
                TaskStatus::InProgress => counts.in_progress += 1,
                TaskStatus::Completed => counts.completed += 1,
            }
            if project.is_blocked_at(idx) {
                counts.blocked += 1;
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.pending + self.in_progress + self.completed
    }

    /// Any task not yet `Completed`?
    pub fn has_unfinished(&self) -> bool {
        self.pending + self.in_progress > 0
    }
}
