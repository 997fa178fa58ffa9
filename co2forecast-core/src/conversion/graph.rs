use std::collections::HashMap;

use pathfinding::prelude::bfs;

/// Directed graph over the unit identifiers of one fuel type
///
/// Edges are unweighted, so the shortest path is the one with the fewest hops.
/// Among equally short paths the one reached through earlier-inserted edges wins.
#[derive(Debug, Clone, Default)]
pub struct ConversionGraph {
    nodes: Vec<String>,
    node_index: HashMap<String, usize>,
    adjacency: Vec<Vec<usize>>,
    edge_count: usize,
}

impl ConversionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a unit node, returning its index
    pub fn add_node(&mut self, unit: &str) -> usize {
        if let Some(&index) = self.node_index.get(unit) {
            return index;
        }
        let index = self.nodes.len();
        self.nodes.push(unit.to_string());
        self.node_index.insert(unit.to_string(), index);
        self.adjacency.push(Vec::new());
        index
    }

    /// Add a directed edge; parallel edges collapse into one
    pub fn add_edge(&mut self, from: &str, to: &str) {
        let from = self.add_node(from);
        let to = self.add_node(to);
        if !self.adjacency[from].contains(&to) {
            self.adjacency[from].push(to);
            self.edge_count += 1;
        }
    }

    pub fn contains(&self, unit: &str) -> bool {
        self.node_index.contains_key(unit)
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        match (self.node_index.get(from), self.node_index.get(to)) {
            (Some(&from), Some(&to)) => self.adjacency[from].contains(&to),
            _ => false,
        }
    }

    /// Fewest-hop path from `from` to `to`, both ends included
    ///
    /// Returns `None` when either unit is unknown or nothing connects them.
    pub fn shortest_path(&self, from: &str, to: &str) -> Option<Vec<&str>> {
        let start = *self.node_index.get(from)?;
        let goal = *self.node_index.get(to)?;

        let path = bfs(
            &start,
            |&node| self.adjacency[node].iter().copied(),
            |&node| node == goal,
        )?;

        Some(path.into_iter().map(|i| self.nodes[i].as_str()).collect())
    }

    /// Units reachable in one hop from `unit`
    pub fn neighbours(&self, unit: &str) -> Vec<&str> {
        self.node_index
            .get(unit)
            .map(|&i| {
                self.adjacency[i]
                    .iter()
                    .map(|&j| self.nodes[j].as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }
}
