//! Dependency graph over task arena indices.
//!
//! Design:
//! - Edge `from -> to` means "`to` depends on `from`".
//! - `dependencies[to]`: tasks `to` depends on (waits for)
//! - `dependents[from]`: tasks that depend on `from` (waiting tasks)
//! - Invariant: both adjacency lists are kept in sync, and the graph is acyclic.

use std::collections::VecDeque;

use super::store::NodeIndex;

/// Why an edge was refused. Index-level; the project maps it to a
/// `WorkflowError` carrying task ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeRejection {
    SelfLoop,
    Duplicate,
    Cycle,
}

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Per node: tasks it depends on, in insertion order.
    dependencies: Vec<Vec<NodeIndex>>,

    /// Per node: tasks waiting for it, in insertion order.
    dependents: Vec<Vec<NodeIndex>>,

    edge_count: usize,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the next node. Nodes mirror the task store one-to-one, so
    /// the new node takes the index the store just handed out.
    pub fn add_node(&mut self) {
        self.dependencies.push(Vec::new());
        self.dependents.push(Vec::new());
    }

    pub fn node_count(&self) -> usize {
        self.dependencies.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn contains_edge(&self, from: NodeIndex, to: NodeIndex) -> bool {
        self.dependencies[to.index()].contains(&from)
    }

    /// Add `from -> to` ("`to` depends on `from`").
    ///
    /// All checks run before anything is written, so a rejected call leaves
    /// the graph exactly as it was.
    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex) -> Result<(), EdgeRejection> {
        if from == to {
            return Err(EdgeRejection::SelfLoop);
        }
        if self.contains_edge(from, to) {
            return Err(EdgeRejection::Duplicate);
        }
        // If `from` is already reachable from `to`, the new edge closes a loop.
        if self.reaches(to, from) {
            return Err(EdgeRejection::Cycle);
        }

        self.dependencies[to.index()].push(from);
        self.dependents[from.index()].push(to);
        self.edge_count += 1;
        Ok(())
    }

    /// Remove `from -> to`. Returns false if the edge did not exist.
    pub fn remove_edge(&mut self, from: NodeIndex, to: NodeIndex) -> bool {
        let deps = &mut self.dependencies[to.index()];
        let Some(pos) = deps.iter().position(|&n| n == from) else {
            return false;
        };
        deps.remove(pos);

        let waiting = &mut self.dependents[from.index()];
        if let Some(pos) = waiting.iter().position(|&n| n == to) {
            waiting.remove(pos);
        }
        self.edge_count -= 1;
        true
    }

    /// Direct predecessors: what `node` depends on.
    pub fn dependencies_of(&self, node: NodeIndex) -> &[NodeIndex] {
        &self.dependencies[node.index()]
    }

    /// Direct successors: what depends on `node`.
    pub fn dependents_of(&self, node: NodeIndex) -> &[NodeIndex] {
        &self.dependents[node.index()]
    }

    /// Is `target` reachable from `start` following `from -> to` edges?
    pub fn reaches(&self, start: NodeIndex, target: NodeIndex) -> bool {
        if start == target {
            return true;
        }
        let mut visited = vec![false; self.node_count()];
        let mut queue = VecDeque::new();
        visited[start.index()] = true;
        queue.push_back(start);

        while let Some(node) = queue.pop_front() {
            for &next in self.dependents_of(node) {
                if next == target {
                    return true;
                }
                if !visited[next.index()] {
                    visited[next.index()] = true;
                    queue.push_back(next);
                }
            }
        }
        false
    }

    /// Every edge as `(from, to)`, grouped by `to` in index order.
    pub fn edges(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex)> + '_ {
        NodeIndex::all(self.node_count())
            .zip(self.dependencies.iter())
            .flat_map(|(to, deps)| deps.iter().map(move |&from| (from, to)))
    }

    /// Kahn's algorithm. Ties are broken by index (creation order), so the
    /// result is deterministic.
    ///
    /// Returns `None` only if the graph has a cycle, which `add_edge` never
    /// allows.
    pub fn topological_order(&self) -> Option<Vec<NodeIndex>> {
        let n = self.node_count();
        let mut in_degree: Vec<usize> = self.dependencies.iter().map(Vec::len).collect();
        let mut ready: std::collections::BinaryHeap<std::cmp::Reverse<NodeIndex>> =
            NodeIndex::all(n)
                .filter(|node| in_degree[node.index()] == 0)
                .map(std::cmp::Reverse)
                .collect();

        let mut order = Vec::with_capacity(n);
        while let Some(std::cmp::Reverse(node)) = ready.pop() {
            order.push(node);
            for &next in self.dependents_of(node) {
                let d = &mut in_degree[next.index()];
                *d -= 1;
                if *d == 0 {
                    ready.push(std::cmp::Reverse(next));
                }
            }
        }

        (order.len() == n).then_some(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with(n: usize) -> (DependencyGraph, Vec<NodeIndex>) {
        let mut graph = DependencyGraph::new();
        for _ in 0..n {
            graph.add_node();
        }
        (graph, NodeIndex::all(n).collect())
    }

    #[test]
    fn new_graph_is_empty() {
        let graph = DependencyGraph::new();
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn add_edge_creates_forward_and_reverse_entries() {
        let (mut graph, n) = graph_with(2);
        let (a, b) = (n[0], n[1]);

        graph.add_edge(a, b).unwrap(); // B depends on A

        assert_eq!(graph.dependencies_of(b), &[a]);
        assert_eq!(graph.dependents_of(a), &[b]);
        assert!(graph.dependencies_of(a).is_empty());
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn self_loop_is_rejected() {
        let (mut graph, n) = graph_with(1);
        assert_eq!(graph.add_edge(n[0], n[0]), Err(EdgeRejection::SelfLoop));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn duplicate_is_rejected() {
        let (mut graph, n) = graph_with(2);
        graph.add_edge(n[0], n[1]).unwrap();
        assert_eq!(graph.add_edge(n[0], n[1]), Err(EdgeRejection::Duplicate));
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn closing_a_chain_is_rejected() {
        let (mut graph, n) = graph_with(3);
        let (a, b, c) = (n[0], n[1], n[2]);
        graph.add_edge(a, b).unwrap();
        graph.add_edge(b, c).unwrap();

        assert_eq!(graph.add_edge(c, a), Err(EdgeRejection::Cycle));
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.dependencies_of(a).is_empty());
    }

    #[test]
    fn two_node_cycle_is_rejected() {
        let (mut graph, n) = graph_with(2);
        graph.add_edge(n[0], n[1]).unwrap();
        assert_eq!(graph.add_edge(n[1], n[0]), Err(EdgeRejection::Cycle));
    }

    #[test]
    fn diamond_is_not_a_cycle() {
        let (mut graph, n) = graph_with(4);
        let (a, b, c, d) = (n[0], n[1], n[2], n[3]);

        // A -> B -> D
        // A -> C -> D  (two paths converge at D)
        graph.add_edge(a, b).unwrap();
        graph.add_edge(a, c).unwrap();
        graph.add_edge(b, d).unwrap();
        graph.add_edge(c, d).unwrap();
        // Shortcut edge
        graph.add_edge(a, d).unwrap();

        assert_eq!(graph.edge_count(), 5);
        assert!(graph.topological_order().is_some());
    }

    #[test]
    fn remove_edge_clears_both_sides() {
        let (mut graph, n) = graph_with(2);
        graph.add_edge(n[0], n[1]).unwrap();

        assert!(graph.remove_edge(n[0], n[1]));
        assert!(graph.dependencies_of(n[1]).is_empty());
        assert!(graph.dependents_of(n[0]).is_empty());
        assert_eq!(graph.edge_count(), 0);
        assert!(!graph.remove_edge(n[0], n[1]));
    }

    #[test]
    fn removing_an_edge_allows_the_reverse() {
        let (mut graph, n) = graph_with(2);
        graph.add_edge(n[0], n[1]).unwrap();
        graph.remove_edge(n[0], n[1]);
        assert!(graph.add_edge(n[1], n[0]).is_ok());
    }

    #[test]
    fn reaches_follows_transitive_edges() {
        let (mut graph, n) = graph_with(4);
        graph.add_edge(n[0], n[1]).unwrap();
        graph.add_edge(n[1], n[2]).unwrap();

        assert!(graph.reaches(n[0], n[2]));
        assert!(!graph.reaches(n[2], n[0]));
        assert!(!graph.reaches(n[0], n[3]));
    }

    #[test]
    fn topological_order_respects_edges_and_creation_order() {
        let (mut graph, n) = graph_with(4);
        // 3 -> 0, 2 -> 1
        graph.add_edge(n[3], n[0]).unwrap();
        graph.add_edge(n[2], n[1]).unwrap();

        let order = graph.topological_order().unwrap();
        assert_eq!(order, vec![n[2], n[1], n[3], n[0]]);
    }

    #[test]
    fn edges_lists_every_pair() {
        let (mut graph, n) = graph_with(3);
        graph.add_edge(n[0], n[2]).unwrap();
        graph.add_edge(n[1], n[2]).unwrap();

        let edges: Vec<_> = graph.edges().collect();
        assert_eq!(edges, vec![(n[0], n[2]), (n[1], n[2])]);
    }
}
