//! Task store: id-indexed arena of task records.
//!
//! Tasks are never removed, so an index handed out by the store stays valid
//! for the store's lifetime. The dependency graph is keyed by the same
//! indices.

use std::collections::HashMap;

use thiserror::Error;

use crate::domain::{Task, TaskId};

/// Largest number of tasks one store holds. Indices stay below `u32::MAX`.
pub const MAX_TASKS: usize = u32::MAX as usize;

/// Position of a task in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(u32);

impl NodeIndex {
    /// `None` if `index` does not fit in a `u32`.
    pub fn new(index: usize) -> Option<Self> {
        u32::try_from(index).ok().map(Self)
    }

    /// Indices `0..len`, for a `len` no larger than [`MAX_TASKS`].
    pub fn all(len: usize) -> impl Iterator<Item = NodeIndex> {
        (0u32..).take(len).map(Self)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InsertError {
    #[error("task {0} already exists")]
    Duplicate(TaskId),

    #[error("task store is full ({0} tasks)")]
    Full(usize),
}

#[derive(Debug, Clone)]
pub struct TaskStore {
    /// Records in creation order.
    tasks: Vec<Task>,

    /// Id -> arena index, O(1) lookup for title resolution.
    index: HashMap<TaskId, NodeIndex>,

    limit: usize,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::with_limit(MAX_TASKS)
    }
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store refusing inserts past `limit` tasks (capped at [`MAX_TASKS`]).
    pub fn with_limit(limit: usize) -> Self {
        Self {
            tasks: Vec::new(),
            index: HashMap::new(),
            limit: limit.min(MAX_TASKS),
        }
    }

    pub fn insert(&mut self, task: Task) -> Result<NodeIndex, InsertError> {
        if self.index.contains_key(&task.id) {
            return Err(InsertError::Duplicate(task.id));
        }
        let idx = Some(self.tasks.len())
            .filter(|&next| next < self.limit)
            .and_then(NodeIndex::new)
            .ok_or(InsertError::Full(self.tasks.len()))?;
        self.index.insert(task.id, idx);
        self.tasks.push(task);
        Ok(idx)
    }

    pub fn index_of(&self, id: TaskId) -> Option<NodeIndex> {
        self.index.get(&id).copied()
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.index_of(id).map(|idx| &self.tasks[idx.index()])
    }

    pub fn get_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        let idx = self.index_of(id)?;
        self.tasks.get_mut(idx.index())
    }

    /// Record at an index handed out by this store.
    pub fn at(&self, idx: NodeIndex) -> &Task {
        &self.tasks[idx.index()]
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// All tasks in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    /// All tasks in creation order, with their indices.
    pub fn iter_indexed(&self) -> impl Iterator<Item = (NodeIndex, &Task)> {
        NodeIndex::all(self.tasks.len()).zip(self.tasks.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProjectId;
    use chrono::Utc;
    use ulid::Ulid;

    fn task(title: &str) -> Task {
        Task::new(
            TaskId::from_ulid(Ulid::new()),
            ProjectId::from_ulid(Ulid::new()),
            title,
            "",
            Utc::now(),
        )
    }

    #[test]
    fn insert_assigns_sequential_indices() {
        let mut store = TaskStore::new();
        let a = store.insert(task("a")).unwrap();
        let b = store.insert(task("b")).unwrap();

        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn insert_rejects_duplicate_id() {
        let mut store = TaskStore::new();
        let t = task("a");
        let id = t.id;
        assert!(store.insert(t.clone()).is_ok());
        assert_eq!(store.insert(t), Err(InsertError::Duplicate(id)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn insert_stops_at_the_limit() {
        let mut store = TaskStore::with_limit(2);
        store.insert(task("a")).unwrap();
        store.insert(task("b")).unwrap();

        assert_eq!(store.insert(task("c")), Err(InsertError::Full(2)));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn index_past_u32_is_refused_instead_of_wrapping() {
        assert_eq!(NodeIndex::new(7).map(NodeIndex::index), Some(7));
        assert_eq!(NodeIndex::new(usize::MAX), None);
    }

    #[test]
    fn all_yields_every_index_in_order() {
        let indices: Vec<_> = NodeIndex::all(3).map(NodeIndex::index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn lookup_by_id_and_index_agree() {
        let mut store = TaskStore::new();
        let t = task("a");
        let id = t.id;
        let idx = store.insert(t).unwrap();

        assert_eq!(store.index_of(id), Some(idx));
        assert_eq!(store.get(id).unwrap().title, "a");
        assert_eq!(store.at(idx).id, id);
        assert!(store.get(TaskId::from_ulid(Ulid::new())).is_none());
    }
}
