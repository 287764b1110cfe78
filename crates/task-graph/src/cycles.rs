//! Deterministic cycle breaking.
//!
//! A depth-first walk follows "depends on" links, starting from roots in
//! ascending key order and visiting each task's dependencies in ascending key
//! order. A link that reaches a task still on the walk would close a cycle;
//! it is removed from the dependent task. Removing every such back link
//! leaves the graph acyclic.

use crate::{TaskGraph, TaskKey, TaskNodeData};
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use tracing::debug;

/// A dependency removed because it would close a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrokenDependency {
    /// The task that lost the dependency.
    pub task: TaskKey,
    /// The dependency that was removed.
    pub dependency: TaskKey,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Unvisited,
    InProgress,
    Done,
}

struct Frame {
    node: NodeIndex,
    dependencies: Vec<NodeIndex>,
    cursor: usize,
}

impl<T: TaskNodeData> TaskGraph<T> {
    /// Remove every dependency edge that closes a cycle.
    ///
    /// Returns the removed dependencies in the order they were found. The
    /// task data itself is left untouched; callers that keep their own
    /// dependency lists should drop the returned links from them.
    pub fn break_cycles(&mut self) -> Vec<BrokenDependency> {
        let mut state = vec![VisitState::Unvisited; self.graph.node_count()];
        let mut back_links: Vec<(NodeIndex, NodeIndex)> = Vec::new();
        let roots: Vec<NodeIndex> = self.key_to_node.values().copied().collect();

        for root in roots {
            if state[root.index()] != VisitState::Unvisited {
                continue;
            }
            state[root.index()] = VisitState::InProgress;
            let mut stack = vec![self.frame(root)];

            while let Some(frame) = stack.last_mut() {
                let node = frame.node;
                let next = frame.dependencies.get(frame.cursor).copied();
                frame.cursor += 1;

                match next {
                    Some(dep) => match state[dep.index()] {
                        VisitState::Unvisited => {
                            state[dep.index()] = VisitState::InProgress;
                            stack.push(self.frame(dep));
                        }
                        VisitState::InProgress => back_links.push((dep, node)),
                        VisitState::Done => {}
                    },
                    None => {
                        state[node.index()] = VisitState::Done;
                        stack.pop();
                    }
                }
            }
        }

        let mut broken = Vec::with_capacity(back_links.len());
        for (dependency, dependent) in back_links {
            if let Some(edge) = self.graph.find_edge(dependency, dependent) {
                self.graph.remove_edge(edge);
            }
            let link = BrokenDependency {
                task: self.graph[dependent].key,
                dependency: self.graph[dependency].key,
            };
            debug!(
                "Removed dependency {} from task {} to break a cycle",
                link.dependency, link.task
            );
            broken.push(link);
        }

        broken
    }

    fn frame(&self, node: NodeIndex) -> Frame {
        let mut dependencies: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(node, Direction::Incoming)
            .collect();
        dependencies.sort_unstable_by_key(|&idx| self.graph[idx].key);
        Frame {
            node,
            dependencies,
            cursor: 0,
        }
    }
}
