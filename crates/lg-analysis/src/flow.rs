//! Bounded directional reachability over structural edges

use lg_core::{
    Direction, EdgeType, LineageEdge, LineageGraph, LineageNode, NodeType, Transformation,
    MAX_DEPTH,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// One step of a lineage path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathStep {
    pub node_id: String,
    pub node_name: String,
    pub node_type: NodeType,

    /// Edge used to reach this step (absent on the first step)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<EdgeType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformation: Option<Transformation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

impl PathStep {
    /// Step for a node, without edge annotations
    pub fn at(node: &LineageNode) -> Self {
        Self {
            node_id: node.id.clone(),
            node_name: node.name.clone(),
            node_type: node.node_type,
            edge_type: None,
            column_name: None,
            transformation: None,
            expression: None,
        }
    }

    /// Step for an id the graph may not know (falls back to the id itself)
    pub(crate) fn for_id(graph: &LineageGraph, id: &str) -> Self {
        match graph.node(id) {
            Some(node) => Self::at(node),
            None => Self {
                node_id: id.to_string(),
                node_name: id.to_string(),
                node_type: NodeType::External,
                edge_type: None,
                column_name: None,
                transformation: None,
                expression: None,
            },
        }
    }
}

/// Ordered steps from the queried node to a reached node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineagePath(pub Vec<PathStep>);

impl LineagePath {
    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    /// Number of edges walked
    pub fn hops(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    /// The reached (last) step
    pub fn end(&self) -> Option<&PathStep> {
        self.0.last()
    }

    pub fn node_ids(&self) -> Vec<&str> {
        self.0.iter().map(|s| s.node_id.as_str()).collect()
    }

    /// Strongest transformation along the path
    pub fn transformation(&self) -> Option<Transformation> {
        self.0
            .iter()
            .filter_map(|s| s.transformation)
            .filter(|t| *t != Transformation::Source)
            .reduce(Transformation::compose)
    }
}

/// What a traversal starts from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowTarget {
    /// A single node id
    Node(String),
    /// Every node defined in a file
    File(String),
}

/// Nodes reached by a traversal; `paths[i]` ends at `nodes[i]`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlowResult {
    pub nodes: Vec<LineageNode>,
    pub paths: Vec<LineagePath>,
}

impl FlowResult {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_ids(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    /// Hop distance at which `id` was first reached
    pub fn depth_of(&self, id: &str) -> Option<usize> {
        self.nodes
            .iter()
            .position(|n| n.id == id)
            .map(|i| self.paths[i].hops())
    }
}

struct Entry<'g> {
    id: &'g str,
    parent: Option<usize>,
    edge: Option<&'g LineageEdge>,
}

/// Breadth-first reachability over one snapshot
#[derive(Debug, Clone, Copy)]
pub struct FlowAnalyzer<'g> {
    graph: &'g LineageGraph,
}

impl<'g> FlowAnalyzer<'g> {
    pub fn new(graph: &'g LineageGraph) -> Self {
        Self { graph }
    }

    /// What feeds `target`, up to `max_depth` hops
    pub fn upstream(&self, target: &FlowTarget, max_depth: usize) -> FlowResult {
        self.traverse(target, Direction::Upstream, max_depth)
    }

    /// What consumes `target`, up to `max_depth` hops
    pub fn downstream(&self, target: &FlowTarget, max_depth: usize) -> FlowResult {
        self.traverse(target, Direction::Downstream, max_depth)
    }

    /// Seed ids for a target, in id order for files
    pub fn seeds(&self, target: &FlowTarget) -> Vec<&'g str> {
        match target {
            FlowTarget::Node(id) => self
                .graph
                .node(id)
                .map(|n| vec![n.id.as_str()])
                .unwrap_or_default(),
            FlowTarget::File(path) => self
                .graph
                .nodes_in_file(path)
                .into_iter()
                .map(|n| n.id.as_str())
                .collect(),
        }
    }

    /// BFS from the target's seeds.
    ///
    /// Each node is reported once, at its minimum depth, in discovery
    /// order. A seed reached again through a cycle is reported once and
    /// not expanded again.
    pub fn traverse(&self, target: &FlowTarget, direction: Direction, max_depth: usize) -> FlowResult {
        let max_depth = max_depth.clamp(1, MAX_DEPTH);
        let seeds = self.seeds(target);
        if seeds.is_empty() {
            return FlowResult::default();
        }

        let mut entries: Vec<Entry<'g>> = seeds
            .iter()
            .map(|&id| Entry {
                id,
                parent: None,
                edge: None,
            })
            .collect();
        let seed_set: HashSet<&str> = seeds.iter().copied().collect();
        let mut visited: HashSet<&str> = seed_set.clone();
        let mut seeds_reported: HashSet<&str> = HashSet::new();
        let mut reported: Vec<usize> = Vec::new();
        let mut queue: VecDeque<(usize, usize)> = (0..seeds.len()).map(|i| (i, 0)).collect();

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            for edge in self.graph.edges_directed(entries[current].id, direction) {
                let next = match direction {
                    Direction::Upstream => edge.source_id.as_str(),
                    Direction::Downstream => edge.target_id.as_str(),
                };
                if visited.insert(next) {
                    entries.push(Entry {
                        id: next,
                        parent: Some(current),
                        edge: Some(edge),
                    });
                    let idx = entries.len() - 1;
                    reported.push(idx);
                    queue.push_back((idx, depth + 1));
                } else if seed_set.contains(next) && seeds_reported.insert(next) {
                    entries.push(Entry {
                        id: next,
                        parent: Some(current),
                        edge: Some(edge),
                    });
                    reported.push(entries.len() - 1);
                }
            }
        }

        let mut result = FlowResult::default();
        for idx in reported {
            let Some(node) = self.graph.node(entries[idx].id) else {
                continue;
            };
            result.nodes.push(node.clone());
            result.paths.push(self.path_to(&entries, idx));
        }
        log::debug!(
            "{} traversal from {} seed(s) reached {} node(s)",
            direction,
            seeds.len(),
            result.nodes.len()
        );
        result
    }

    fn path_to(&self, entries: &[Entry<'g>], idx: usize) -> LineagePath {
        let mut steps = Vec::new();
        let mut cursor = Some(idx);
        while let Some(i) = cursor {
            let entry = &entries[i];
            let mut step = PathStep::for_id(self.graph, entry.id);
            step.edge_type = entry.edge.map(|e| e.edge_type);
            steps.push(step);
            cursor = entry.parent;
        }
        steps.reverse();
        LineagePath(steps)
    }
}

#[cfg(test)]
#[path = "flow_test.rs"]
mod tests;
