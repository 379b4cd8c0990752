//! # Dependency Graph
//!
//! Derived from a [`Registry`] snapshot. An edge points from a service to each dependency
//! it lists. [`DependencyGraph::sort`] produces a start order with
//! [Kahn's algorithm](https://en.wikipedia.org/wiki/Topological_sorting#Kahn's_algorithm):
//!
//! 1. The in-degree of a node is the number of services that depend on it.
//! 2. Nodes with in-degree 0 (nobody depends on them) seed the queue, in registry order.
//! 3. Each dequeued node is emitted and the in-degree of its own dependencies drops by one.
//! 4. The emission order is reversed, so dependencies come before their dependents.
//!
//! Any node left with a non-zero in-degree sits on a cycle; one concrete cycle is then
//! extracted by DFS for the error message.
//!
//! Time and space are O(V + E).

use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::{Error, Result};
use crate::registry::Registry;

/// Adjacency view of the registry.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Node names in registry insertion order.
    nodes: Vec<String>,
    /// `edges[A] = [B, C]` means A depends on B and C.
    edges: HashMap<String, Vec<String>>,
    /// `reverse[A] = [B, C]` means B and C depend on A.
    reverse: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Builds the graph, rejecting dependencies on unregistered services.
    pub fn from_registry(registry: &Registry) -> Result<Self> {
        let mut graph = Self::default();

        for name in registry.names() {
            graph.nodes.push(name.to_string());
            graph.reverse.entry(name.to_string()).or_default();
        }

        for name in registry.names() {
            let deps = registry.dependencies(name).unwrap_or_default();
            for dep in deps {
                if !registry.contains(dep) {
                    return Err(Error::UnknownDependency {
                        service: name.to_string(),
                        dependency: dep.clone(),
                    });
                }
                graph
                    .reverse
                    .entry(dep.clone())
                    .or_default()
                    .push(name.to_string());
            }
            graph.edges.insert(name.to_string(), deps.to_vec());
        }

        Ok(graph)
    }

    /// Direct dependencies of `node`.
    pub fn dependencies(&self, node: &str) -> &[String] {
        self.edges.get(node).map(Vec::as_slice).unwrap_or_default()
    }

    /// Services that list `node` as a dependency.
    pub fn dependents(&self, node: &str) -> &[String] {
        self.reverse.get(node).map(Vec::as_slice).unwrap_or_default()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Topological start order: every service appears after all of its dependencies.
    pub fn sort(&self) -> Result<Vec<String>> {
        let mut degree: HashMap<&str, usize> =
            self.nodes.iter().map(|n| (n.as_str(), 0)).collect();
        for deps in self.edges.values() {
            for dep in deps {
                *degree.entry(dep.as_str()).or_default() += 1;
            }
        }

        let mut queue: VecDeque<&str> = self
            .nodes
            .iter()
            .map(String::as_str)
            .filter(|n| degree[n] == 0)
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(node) = queue.pop_front() {
            order.push(node.to_string());
            for dep in self.dependencies(node) {
                if let Some(d) = degree.get_mut(dep.as_str()) {
                    *d -= 1;
                    if *d == 0 {
                        queue.push_back(dep.as_str());
                    }
                }
            }
        }

        if order.len() != self.nodes.len() {
            let stuck: HashSet<&str> = degree
                .iter()
                .filter(|&(_, &d)| d > 0)
                .map(|(n, _)| *n)
                .collect();
            return Err(Error::Cycle(self.find_cycle(&stuck)));
        }

        order.reverse();
        Ok(order)
    }

    /// Finds one cycle among `candidates`, returned as a closed path (`a -> b -> a`).
    fn find_cycle(&self, candidates: &HashSet<&str>) -> Vec<String> {
        let mut visited = HashSet::new();
        let mut on_stack = HashSet::new();
        let mut path = Vec::new();

        for node in self.nodes.iter().filter(|n| candidates.contains(n.as_str())) {
            if !visited.contains(node.as_str()) {
                if let Some(cycle) = self.cycle_dfs(node, &mut visited, &mut on_stack, &mut path) {
                    return cycle;
                }
            }
        }

        // Unreachable for a graph Kahn rejected; keep the leftovers as a best effort.
        self.nodes
            .iter()
            .filter(|n| candidates.contains(n.as_str()))
            .cloned()
            .collect()
    }

    fn cycle_dfs<'a>(
        &'a self,
        node: &'a str,
        visited: &mut HashSet<&'a str>,
        on_stack: &mut HashSet<&'a str>,
        path: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        visited.insert(node);
        on_stack.insert(node);
        path.push(node);

        for dep in self.dependencies(node) {
            let dep = dep.as_str();
            if on_stack.contains(dep) {
                let start = path.iter().position(|n| *n == dep).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..].iter().map(|n| n.to_string()).collect();
                cycle.push(dep.to_string());
                return Some(cycle);
            }
            if !visited.contains(dep) {
                if let Some(cycle) = self.cycle_dfs(dep, visited, on_stack, path) {
                    return Some(cycle);
                }
            }
        }

        on_stack.remove(node);
        path.pop();
        None
    }
}
