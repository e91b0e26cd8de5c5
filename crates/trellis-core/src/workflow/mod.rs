//! Workflow core: task store, dependency graph, transition guard and
//! dependency queries for a single project.

mod dependency;
mod guard;
mod project;
mod query;
mod store;

pub use dependency::{DependencyGraph, EdgeRejection};
pub use guard::{
    TaskLookup, TransitionDecision, TransitionGuard, TransitionRule, UnresolvedPolicy,
};
pub use project::ProjectWorkflow;
pub use query::{DependencyQuery, Direction};
pub use store::{InsertError, MAX_TASKS, NodeIndex, TaskStore};
