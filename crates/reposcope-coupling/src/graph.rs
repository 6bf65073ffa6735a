//! The in-repository import graph and Tarjan's strongly-connected-components
//! algorithm.
//!
//! Nodes are integer IDs with a side table for the identifier<->ID
//! bijection; SCCs are computed iteratively to avoid stack overflow on deep
//! graphs.

use indexmap::IndexMap;

/// A directed graph over module identities, built once per scan.
pub struct ImportGraph {
    /// Module identities in deterministic (lexicographic) order; index is
    /// the node's integer ID.
    nodes: Vec<String>,
    node_id: IndexMap<String, usize>,
    /// Sorted, deduplicated adjacency lists, indexed by node ID.
    adjacency: Vec<Vec<usize>>,
}

impl ImportGraph {
    /// Builds a graph from `edges`: `(from_module, to_module)` pairs, both
    /// already resolved to known module identities. Modules absent from
    /// `edges` but present in `all_modules` still get a node (isolated).
    pub fn build(all_modules: impl IntoIterator<Item = String>, edges: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut nodes: Vec<String> = all_modules.into_iter().collect();
        nodes.sort();
        nodes.dedup();

        let node_id: IndexMap<String, usize> = nodes.iter().enumerate().map(|(i, n)| (n.clone(), i)).collect();

        let mut adjacency = vec![Vec::new(); nodes.len()];
        for (from, to) in edges {
            if let (Some(&f), Some(&t)) = (node_id.get(&from), node_id.get(&to))
                && f != t
            {
                adjacency[f].push(t);
            }
        }
        for list in &mut adjacency {
            list.sort_unstable();
            list.dedup();
        }

        Self { nodes, node_id, adjacency }
    }

    pub fn module_name(&self, id: usize) -> &str {
        &self.nodes[id]
    }

    pub fn fan_out(&self, id: usize) -> usize {
        self.adjacency[id].len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn module_id(&self, name: &str) -> Option<usize> {
        self.node_id.get(name).copied()
    }

    pub fn iter_ids(&self) -> impl Iterator<Item = usize> {
        0..self.nodes.len()
    }

    /// Every non-trivial strongly-connected component. SCCs of size 1,
    /// including pure self-loops, are discarded.
    ///
    /// Visits nodes in lexicographic (ID) order so that, for repositories
    /// with multiple independent cycles, the order SCCs are discovered in
    /// is stable across runs.
    pub fn non_trivial_sccs(&self) -> Vec<Vec<usize>> {
        TarjanState::new(self).run()
    }
}

/// Iterative Tarjan's algorithm (explicit stack, no recursion).
struct TarjanState<'g> {
    graph: &'g ImportGraph,
    index_counter: usize,
    index: Vec<Option<usize>>,
    lowlink: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<usize>,
    sccs: Vec<Vec<usize>>,
}

enum Frame {
    Enter(usize),
    /// Resume processing node `node` after having just returned from
    /// visiting `child` at adjacency position `next_edge`.
    Resume { node: usize, child: usize, next_edge: usize },
}

impl<'g> TarjanState<'g> {
    fn new(graph: &'g ImportGraph) -> Self {
        let n = graph.node_count();
        Self {
            graph,
            index_counter: 0,
            index: vec![None; n],
            lowlink: vec![0; n],
            on_stack: vec![false; n],
            stack: Vec::new(),
            sccs: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Vec<usize>> {
        for start in self.graph.iter_ids() {
            if self.index[start].is_none() {
                self.visit(start);
            }
        }
        self.sccs.sort_by(|a, b| a[0].cmp(&b[0]));
        self.sccs
    }

    fn visit(&mut self, root: usize) {
        let mut call_stack: Vec<Frame> = vec![Frame::Enter(root)];

        while let Some(frame) = call_stack.pop() {
            match frame {
                Frame::Enter(v) => {
                    self.index[v] = Some(self.index_counter);
                    self.lowlink[v] = self.index_counter;
                    self.index_counter += 1;
                    self.stack.push(v);
                    self.on_stack[v] = true;

                    self.process_edges(v, 0, &mut call_stack);
                }
                Frame::Resume { node, child, next_edge } => {
                    self.lowlink[node] = self.lowlink[node].min(self.lowlink[child]);
                    self.process_edges(node, next_edge, &mut call_stack);
                }
            }
        }
    }

    /// Walks `v`'s adjacency list starting at `from_edge`, recursing
    /// (via the explicit stack) into unvisited neighbors and updating
    /// `lowlink` for already-on-stack ones; pops `v`'s SCC once exhausted.
    fn process_edges(&mut self, v: usize, from_edge: usize, call_stack: &mut Vec<Frame>) {
        let neighbors = self.graph.adjacency[v].clone();
        let mut i = from_edge;
        while i < neighbors.len() {
            let w = neighbors[i];
            if self.index[w].is_none() {
                call_stack.push(Frame::Resume {
                    node: v,
                    child: w,
                    next_edge: i + 1,
                });
                call_stack.push(Frame::Enter(w));
                return;
            } else if self.on_stack[w] {
                self.lowlink[v] = self.lowlink[v].min(self.index[w].unwrap());
            }
            i += 1;
        }

        if self.lowlink[v] == self.index[v].unwrap() {
            let mut component = Vec::new();
            loop {
                let w = self.stack.pop().expect("SCC stack underflow");
                self.on_stack[w] = false;
                component.push(w);
                if w == v {
                    break;
                }
            }
            if component.len() > 1 {
                component.sort_unstable();
                self.sccs.push(component);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_node_cycle_detected() {
        let graph = ImportGraph::build(
            ["a".to_string(), "b".to_string()],
            [("a".to_string(), "b".to_string()), ("b".to_string(), "a".to_string())],
        );
        let sccs = graph.non_trivial_sccs();
        assert_eq!(sccs.len(), 1);
        assert_eq!(sccs[0].len(), 2);
    }

    #[test]
    fn self_loop_is_discarded() {
        let graph = ImportGraph::build(["a".to_string()], []);
        assert!(graph.non_trivial_sccs().is_empty());
    }

    #[test]
    fn acyclic_graph_has_no_sccs() {
        let graph = ImportGraph::build(
            ["a".to_string(), "b".to_string(), "c".to_string()],
            [("a".to_string(), "b".to_string()), ("b".to_string(), "c".to_string())],
        );
        assert!(graph.non_trivial_sccs().is_empty());
    }

    #[test]
    fn three_node_cycle_detected() {
        let graph = ImportGraph::build(
            ["a".to_string(), "b".to_string(), "c".to_string()],
            [
                ("a".to_string(), "b".to_string()),
                ("b".to_string(), "c".to_string()),
                ("c".to_string(), "a".to_string()),
            ],
        );
        let sccs = graph.non_trivial_sccs();
        assert_eq!(sccs.len(), 1);
        assert_eq!(sccs[0].len(), 3);
    }

    #[test]
    fn fan_out_counts_deduped_edges() {
        let graph = ImportGraph::build(
            ["a".to_string(), "b".to_string()],
            [("a".to_string(), "b".to_string()), ("a".to_string(), "b".to_string())],
        );
        assert_eq!(graph.fan_out(graph.module_id("a").unwrap()), 1);
    }
}
