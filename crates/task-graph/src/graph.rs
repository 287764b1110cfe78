//! Task graph builder using petgraph.
//!
//! This module builds directed graphs from task definitions. Edges point
//! from a dependency to its dependent, so "upstream" means incoming edges.

use crate::{Error, Result, TaskKey, TaskNodeData};
use petgraph::Direction;
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::IntoNodeReferences;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};
use tracing::debug;

/// A node in the task graph.
#[derive(Debug, Clone)]
pub struct GraphNode<T> {
    /// Identity of the task.
    pub key: TaskKey,
    /// The task data.
    pub task: T,
}

/// Task graph for dependency analysis.
///
/// This is a generic graph that can hold any task type implementing [`TaskNodeData`].
/// It provides methods for building the graph, breaking cycles and computing
/// per-task metrics.
pub struct TaskGraph<T: TaskNodeData> {
    /// The directed graph of tasks.
    pub(crate) graph: DiGraph<GraphNode<T>, ()>,
    /// Map from task keys to node indices, iterated in key order.
    pub(crate) key_to_node: BTreeMap<TaskKey, NodeIndex>,
}

impl<T: TaskNodeData> TaskGraph<T> {
    /// Create a new empty task graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            key_to_node: BTreeMap::new(),
        }
    }

    /// Add a single task to the graph.
    ///
    /// If a task with the same key already exists, returns the existing node index.
    ///
    /// # Errors
    ///
    /// Currently infallible, but returns `Result` for API consistency.
    pub fn add_task(&mut self, key: TaskKey, task: T) -> Result<NodeIndex> {
        if let Some(&node) = self.key_to_node.get(&key) {
            return Ok(node);
        }

        let node_index = self.graph.add_node(GraphNode { key, task });
        self.key_to_node.insert(key, node_index);
        debug!("Added task node {}", key);

        Ok(node_index)
    }

    /// Add dependency edges after all tasks have been added.
    ///
    /// Repeated dependencies collapse into a single edge.
    ///
    /// # Errors
    ///
    /// Returns an error if any task depends on a task that is not in the graph.
    pub fn add_dependency_edges(&mut self) -> Result<()> {
        let mut missing_deps = Vec::new();
        let mut edges_to_add = Vec::new();

        for (node_index, node) in self.graph.node_references() {
            for dep_key in node.task.dependency_keys() {
                if let Some(&dep_node_index) = self.key_to_node.get(&dep_key) {
                    edges_to_add.push((dep_node_index, node_index));
                } else {
                    missing_deps.push((node.key, dep_key));
                }
            }
        }

        if !missing_deps.is_empty() {
            return Err(Error::MissingDependencies {
                missing: missing_deps,
            });
        }

        for (from, to) in edges_to_add {
            self.graph.update_edge(from, to, ());
        }
        debug!(
            tasks = self.graph.node_count(),
            edges = self.graph.edge_count(),
            "Wired dependency edges"
        );

        Ok(())
    }

    /// Check if the graph has cycles.
    #[must_use]
    pub fn has_cycles(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Get topologically sorted list of tasks.
    ///
    /// Among tasks whose dependencies are all satisfied, the smallest key
    /// comes first, so the order is fully deterministic.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph contains cycles.
    pub fn topological_sort(&self) -> Result<Vec<GraphNode<T>>> {
        Ok(self
            .topological_indices()?
            .into_iter()
            .map(|idx| self.graph[idx].clone())
            .collect())
    }

    /// Kahn's algorithm over node indices with a min-heap on task keys.
    pub(crate) fn topological_indices(&self) -> Result<Vec<NodeIndex>> {
        let mut remaining: Vec<usize> = self
            .graph
            .node_indices()
            .map(|idx| self.graph.neighbors_directed(idx, Direction::Incoming).count())
            .collect();

        let mut ready: BinaryHeap<Reverse<(TaskKey, NodeIndex)>> = self
            .graph
            .node_references()
            .filter(|(idx, _)| remaining[idx.index()] == 0)
            .map(|(idx, node)| Reverse((node.key, idx)))
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(Reverse((_, idx))) = ready.pop() {
            order.push(idx);
            for dependent in self.graph.neighbors_directed(idx, Direction::Outgoing) {
                let count = &mut remaining[dependent.index()];
                *count -= 1;
                if *count == 0 {
                    ready.push(Reverse((self.graph[dependent].key, dependent)));
                }
            }
        }

        if order.len() == self.graph.node_count() {
            Ok(order)
        } else {
            Err(Error::CycleDetected {
                message: format!(
                    "{} of {} tasks are part of or behind a cycle",
                    self.graph.node_count() - order.len(),
                    self.graph.node_count()
                ),
            })
        }
    }

    /// Keys of the tasks `key` directly depends on, in ascending order.
    #[must_use]
    pub fn dependencies_of(&self, key: TaskKey) -> Vec<TaskKey> {
        self.neighbor_keys(key, Direction::Incoming)
    }

    /// Keys of the tasks that directly depend on `key`, in ascending order.
    #[must_use]
    pub fn dependents_of(&self, key: TaskKey) -> Vec<TaskKey> {
        self.neighbor_keys(key, Direction::Outgoing)
    }

    fn neighbor_keys(&self, key: TaskKey, direction: Direction) -> Vec<TaskKey> {
        let Some(&idx) = self.key_to_node.get(&key) else {
            return Vec::new();
        };
        let mut keys: Vec<TaskKey> = self
            .graph
            .neighbors_directed(idx, direction)
            .map(|n| self.graph[n].key)
            .collect();
        keys.sort_unstable();
        keys
    }

    /// Get the number of tasks in the graph.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get the number of dependency edges in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Check if a task exists in the graph.
    #[must_use]
    pub fn contains_task(&self, key: TaskKey) -> bool {
        self.key_to_node.contains_key(&key)
    }

    /// Iterate over all nodes in ascending key order.
    pub fn iter_nodes(&self) -> impl Iterator<Item = &GraphNode<T>> {
        self.key_to_node.values().map(|&idx| &self.graph[idx])
    }
}

impl<T: TaskNodeData> Default for TaskGraph<T> {
    fn default() -> Self {
        Self::new()
    }
}
