//! Typed node/edge store backed by a petgraph undirected graph.
//!
//! # Invariants
//!
//! - Node identifiers are unique.
//! - Every edge's endpoints exist in the node set (nodes are never removed).
//! - No self-loops.
//! - At most one edge per unordered pair and [`LinkKind`]; re-adding an
//!   existing pair is a no-op.
//!
//! Escalation edges keep the orientation they were added with
//! (`source` notifies `target`), even though the backend is undirected.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::Serialize;
use tracing::trace;

use super::{Link, LinkKind, Node, NodeId, NodeKind};
use crate::error::GraphError;

// ---------------------------------------------------------------------------
// Edge view
// ---------------------------------------------------------------------------

/// Owned view of a stored edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub weight: u32,
    pub kind: LinkKind,
}

// ---------------------------------------------------------------------------
// GraphStore
// ---------------------------------------------------------------------------

/// Graph of typed nodes and weighted friendship/escalation edges.
///
/// Dense node indexes follow insertion order, which lets the propagation
/// engine address nodes by position.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    graph: UnGraph<Node, Link>,
    node_map: HashMap<NodeId, NodeIndex>,
}

impl GraphStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateNode`] if `id` is already present.
    pub fn add_node(&mut self, id: NodeId, kind: NodeKind) -> Result<(), GraphError> {
        if self.node_map.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        let idx = self.graph.add_node(Node {
            id: id.clone(),
            kind,
        });
        self.node_map.insert(id, idx);
        Ok(())
    }

    /// Add an edge between `u` and `v`.
    ///
    /// Returns `true` if a new edge was stored, `false` if an edge of the
    /// same kind already connects the pair (in either order).
    ///
    /// # Errors
    ///
    /// - [`GraphError::UnknownNode`] if either endpoint is absent.
    /// - [`GraphError::SelfLoop`] if `u == v`.
    pub fn add_edge(
        &mut self,
        u: &NodeId,
        v: &NodeId,
        weight: u32,
        kind: LinkKind,
    ) -> Result<bool, GraphError> {
        let a = self.require(u)?;
        let b = self.require(v)?;
        if a == b {
            return Err(GraphError::SelfLoop(u.clone()));
        }

        if self.connected_by(a, b, kind) {
            trace!(%u, %v, ?kind, "edge already present");
            return Ok(false);
        }

        self.graph.add_edge(a, b, Link { kind, weight });
        Ok(true)
    }

    /// Return `true` if a node with this identifier exists.
    #[must_use]
    pub fn has_node(&self, id: &NodeId) -> bool {
        self.node_map.contains_key(id)
    }

    /// Look up a node by identifier.
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.node_map
            .get(id)
            .and_then(|&idx| self.graph.node_weight(idx))
    }

    /// All neighbours of `id` over any edge kind, in node insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`] if `id` is absent.
    pub fn neighbors(&self, id: &NodeId) -> Result<Vec<&NodeId>, GraphError> {
        self.neighbors_matching(id, |_| true)
    }

    /// Friendship neighbours of `id`, in node insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`] if `id` is absent.
    pub fn friends(&self, id: &NodeId) -> Result<Vec<&NodeId>, GraphError> {
        self.neighbors_matching(id, |link| link.kind == LinkKind::Friendship)
    }

    /// Number of friendship edges touching `id`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`] if `id` is absent.
    pub fn degree(&self, id: &NodeId) -> Result<usize, GraphError> {
        self.friends(id).map(|friends| friends.len())
    }

    /// Iterate over nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_weights()
    }

    /// Student nodes sorted by student index.
    #[must_use]
    pub fn students(&self) -> Vec<&Node> {
        let mut students: Vec<&Node> = self.nodes().filter(|n| n.kind.is_student()).collect();
        students.sort_by_key(|n| n.kind.student_index());
        students
    }

    /// All edges in insertion order.
    #[must_use]
    pub fn edges(&self) -> Vec<Edge> {
        self.graph
            .raw_edges()
            .iter()
            .map(|edge| Edge {
                source: self.graph[edge.source()].id.clone(),
                target: self.graph[edge.target()].id.clone(),
                weight: edge.weight.weight,
                kind: edge.weight.kind,
            })
            .collect()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    #[must_use]
    pub fn friendship_edge_count(&self) -> usize {
        self.graph
            .raw_edges()
            .iter()
            .filter(|edge| edge.weight.kind == LinkKind::Friendship)
            .count()
    }

    /// BLAKE3 hash of the friendship edge set, independent of insertion order.
    ///
    /// Two stores built from the same seed hash identically.
    #[must_use]
    pub fn content_hash(&self) -> String {
        let mut pairs: Vec<(&str, &str, u32)> = self
            .graph
            .raw_edges()
            .iter()
            .filter(|edge| edge.weight.kind == LinkKind::Friendship)
            .map(|edge| {
                let a = self.graph[edge.source()].id.as_str();
                let b = self.graph[edge.target()].id.as_str();
                if a <= b {
                    (a, b, edge.weight.weight)
                } else {
                    (b, a, edge.weight.weight)
                }
            })
            .collect();
        pairs.sort_unstable();

        let mut hasher = blake3::Hasher::new();
        for (a, b, weight) in pairs {
            hasher.update(a.as_bytes());
            hasher.update(b"\x00");
            hasher.update(b.as_bytes());
            hasher.update(b"\x00");
            hasher.update(&weight.to_le_bytes());
        }
        format!("blake3:{}", hasher.finalize())
    }

    /// Friendship edges as `(dense_a, dense_b, weight)` triples.
    pub(crate) fn friendship_links(&self) -> impl Iterator<Item = (usize, usize, u32)> + '_ {
        self.graph
            .raw_edges()
            .iter()
            .filter(|edge| edge.weight.kind == LinkKind::Friendship)
            .map(|edge| (edge.source().index(), edge.target().index(), edge.weight.weight))
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    fn require(&self, id: &NodeId) -> Result<NodeIndex, GraphError> {
        self.node_map
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::UnknownNode(id.clone()))
    }

    fn connected_by(&self, a: NodeIndex, b: NodeIndex, kind: LinkKind) -> bool {
        self.graph
            .edges(a)
            .any(|e| e.weight().kind == kind && (e.source() == b || e.target() == b))
    }

    fn neighbors_matching(
        &self,
        id: &NodeId,
        keep: impl Fn(&Link) -> bool,
    ) -> Result<Vec<&NodeId>, GraphError> {
        let a = self.require(id)?;
        let mut others: Vec<NodeIndex> = self
            .graph
            .edges(a)
            .filter(|e| keep(e.weight()))
            .map(|e| if e.source() == a { e.target() } else { e.source() })
            .collect();
        others.sort_unstable();
        others.dedup();
        Ok(others.into_iter().map(|idx| &self.graph[idx].id).collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn students(n: usize) -> GraphStore {
        let mut store = GraphStore::new();
        for i in 0..n {
            let node = Node::student(i);
            store.add_node(node.id, node.kind).expect("add student");
        }
        store
    }

    fn id(label: &str) -> NodeId {
        NodeId::new(label)
    }

    #[test]
    fn empty_store() {
        let store = GraphStore::new();
        assert_eq!(store.node_count(), 0);
        assert_eq!(store.edge_count(), 0);
        assert!(!store.has_node(&id("A0")));
    }

    #[test]
    fn duplicate_node_rejected() {
        let mut store = students(2);
        let err = store
            .add_node(id("A1"), NodeKind::Student { index: 1 })
            .expect_err("duplicate");
        assert_eq!(err, GraphError::DuplicateNode(id("A1")));
        assert_eq!(store.node_count(), 2);
    }

    #[test]
    fn edge_to_unknown_node_rejected() {
        let mut store = students(2);
        let err = store
            .add_edge(&id("A0"), &id("A9"), 1, LinkKind::Friendship)
            .expect_err("unknown endpoint");
        assert_eq!(err, GraphError::UnknownNode(id("A9")));
        assert_eq!(store.edge_count(), 0);
    }

    #[test]
    fn self_loop_rejected() {
        let mut store = students(2);
        let err = store
            .add_edge(&id("A1"), &id("A1"), 1, LinkKind::Friendship)
            .expect_err("self loop");
        assert_eq!(err, GraphError::SelfLoop(id("A1")));
    }

    #[test]
    fn friendship_is_idempotent_in_either_order() {
        let mut store = students(3);
        assert!(
            store
                .add_edge(&id("A1"), &id("A2"), 1, LinkKind::Friendship)
                .expect("add")
        );
        assert!(
            !store
                .add_edge(&id("A1"), &id("A2"), 1, LinkKind::Friendship)
                .expect("re-add")
        );
        assert!(
            !store
                .add_edge(&id("A2"), &id("A1"), 1, LinkKind::Friendship)
                .expect("reverse")
        );
        assert_eq!(store.edge_count(), 1);
    }

    #[test]
    fn same_pair_different_kind_is_a_new_edge() {
        let mut store = students(2);
        store
            .add_edge(&id("A0"), &id("A1"), 1, LinkKind::Friendship)
            .expect("friendship");
        assert!(
            store
                .add_edge(&id("A0"), &id("A1"), 1, LinkKind::Escalation)
                .expect("escalation")
        );
        assert_eq!(store.edge_count(), 2);
        assert_eq!(store.friendship_edge_count(), 1);
    }

    #[test]
    fn neighbors_and_friends() {
        let mut store = students(4);
        store
            .add_node(id("T0"), NodeKind::Tutor { index: 0 })
            .expect("tutor");
        store
            .add_edge(&id("A0"), &id("A2"), 1, LinkKind::Friendship)
            .expect("edge");
        store
            .add_edge(&id("A1"), &id("A0"), 1, LinkKind::Friendship)
            .expect("edge");
        store
            .add_edge(&id("A0"), &id("T0"), 1, LinkKind::Escalation)
            .expect("edge");

        let all: Vec<&str> = store
            .neighbors(&id("A0"))
            .expect("neighbors")
            .into_iter()
            .map(NodeId::as_str)
            .collect();
        assert_eq!(all, vec!["A1", "A2", "T0"]);

        let friends: Vec<&str> = store
            .friends(&id("A0"))
            .expect("friends")
            .into_iter()
            .map(NodeId::as_str)
            .collect();
        assert_eq!(friends, vec!["A1", "A2"]);
        assert_eq!(store.degree(&id("A0")).expect("degree"), 2);
        assert_eq!(store.degree(&id("A3")).expect("degree"), 0);

        assert_eq!(
            store.neighbors(&id("nobody")).expect_err("unknown"),
            GraphError::UnknownNode(id("nobody"))
        );
    }

    #[test]
    fn escalation_edges_keep_orientation() {
        let mut store = students(1);
        store
            .add_node(id("T0"), NodeKind::Tutor { index: 0 })
            .expect("tutor");
        store
            .add_edge(&id("A0"), &id("T0"), 1, LinkKind::Escalation)
            .expect("edge");

        let edges = store.edges();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].source, id("A0"));
        assert_eq!(edges[0].target, id("T0"));
        assert_eq!(edges[0].kind, LinkKind::Escalation);
    }

    #[test]
    fn students_sorted_by_index() {
        let mut store = GraphStore::new();
        for i in [10, 2, 7] {
            let node = Node::student(i);
            store.add_node(node.id, node.kind).expect("add");
        }
        let order: Vec<Option<usize>> = store
            .students()
            .iter()
            .map(|n| n.kind.student_index())
            .collect();
        assert_eq!(order, vec![Some(2), Some(7), Some(10)]);
    }

    #[test]
    fn content_hash_ignores_insertion_order() {
        let mut a = students(3);
        a.add_edge(&id("A0"), &id("A1"), 1, LinkKind::Friendship)
            .expect("edge");
        a.add_edge(&id("A1"), &id("A2"), 1, LinkKind::Friendship)
            .expect("edge");

        let mut b = students(3);
        b.add_edge(&id("A2"), &id("A1"), 1, LinkKind::Friendship)
            .expect("edge");
        b.add_edge(&id("A1"), &id("A0"), 1, LinkKind::Friendship)
            .expect("edge");

        assert_eq!(a.content_hash(), b.content_hash());
        assert!(a.content_hash().starts_with("blake3:"));

        b.add_edge(&id("A0"), &id("A2"), 1, LinkKind::Friendship)
            .expect("edge");
        assert_ne!(a.content_hash(), b.content_hash(), "hash must change when edges added");
    }
}
