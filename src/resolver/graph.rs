//! Dependency graph seeded from lockfile data.
//!
//! Vertices are pod names carrying the Dependency that first introduced
//! them; edges point from a pod to the pods it requires. Top-level
//! `DEPENDENCIES` are inserted before `PODS`, so their payloads (with any
//! external source attached) win over the unconstrained ones recorded for
//! locked pods.

use std::collections::{BTreeMap, HashMap};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;

use crate::core::Dependency;
use crate::resolver::lockfile::Lockfile;

#[derive(Debug, Clone)]
struct Vertex {
    name: String,
    payload: Option<Dependency>,
}

/// The "requires" graph of locked pods.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<Vertex, ()>,
    name_to_node: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        DependencyGraph::default()
    }

    /// Build the graph from a lockfile.
    pub fn from_lockfile(lockfile: &Lockfile) -> Self {
        let mut graph = DependencyGraph::new();

        for dependency in lockfile.dependencies() {
            graph.add_vertex(dependency.name(), Some(dependency.clone()));
        }

        for pod in lockfile.internal_pods() {
            graph.add_vertex(&pod.name, Some(Dependency::new(pod.name.clone())));
            for child in &pod.dependencies {
                graph.add_vertex(child.name(), None);
                graph.add_edge(&pod.name, child.name());
            }
        }

        tracing::debug!(
            "built dependency graph with {} vertices",
            graph.graph.node_count()
        );
        graph
    }

    /// Add a vertex, keeping an existing payload.
    pub fn add_vertex(&mut self, name: &str, payload: Option<Dependency>) {
        if let Some(&node) = self.name_to_node.get(name) {
            let vertex = &mut self.graph[node];
            if vertex.payload.is_none() {
                vertex.payload = payload;
            }
            return;
        }

        let node = self.graph.add_node(Vertex {
            name: name.to_string(),
            payload,
        });
        self.name_to_node.insert(name.to_string(), node);
    }

    /// Add a "requires" edge between two existing vertices.
    pub fn add_edge(&mut self, from: &str, to: &str) {
        if let (Some(&from_node), Some(&to_node)) =
            (self.name_to_node.get(from), self.name_to_node.get(to))
        {
            if !self.graph.contains_edge(from_node, to_node) {
                self.graph.add_edge(from_node, to_node, ());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// The payload of a vertex.
    pub fn payload(&self, name: &str) -> Option<&Dependency> {
        self.name_to_node
            .get(name)
            .and_then(|&node| self.graph[node].payload.as_ref())
    }

    /// Payloads of every vertex reachable from `name`, excluding `name`
    /// itself unless it sits on a cycle.
    pub fn recursive_successors(&self, name: &str) -> Vec<&Dependency> {
        let Some(&start) = self.name_to_node.get(name) else {
            return Vec::new();
        };

        let mut successors = Vec::new();
        let mut on_cycle = false;
        for neighbor in self.graph.neighbors(start) {
            let mut dfs = Dfs::new(&self.graph, neighbor);
            while let Some(node) = dfs.next(&self.graph) {
                if node == start {
                    on_cycle = true;
                } else if !successors.contains(&node) {
                    successors.push(node);
                }
            }
        }
        if on_cycle {
            successors.push(start);
        }

        successors
            .into_iter()
            .filter_map(|node| self.graph[node].payload.as_ref())
            .collect()
    }

    /// For every vertex, its own payload plus its recursive successors'.
    pub fn transitive_dependencies_by_pod(&self) -> BTreeMap<String, Vec<Dependency>> {
        self.graph
            .node_indices()
            .map(|node| {
                let vertex = &self.graph[node];
                let mut dependencies: Vec<Dependency> = Vec::new();
                let own = vertex.payload.iter();
                for dependency in self.recursive_successors(&vertex.name).into_iter().chain(own) {
                    if !dependencies.contains(dependency) {
                        dependencies.push(dependency.clone());
                    }
                }
                (vertex.name.clone(), dependencies)
            })
            .collect()
    }
}
