//! All-pairs shortest propagation times.
//!
//! # Overview
//!
//! News spreads one friendship edge per time unit, so the time at which a
//! student hears about an incident is their shortest-path distance from the
//! origin under friendship edges. Escalation edges never carry propagation
//! and are ignored here.
//!
//! Three interchangeable engines produce a [`DistanceTable`]:
//!
//! | Engine | Complexity | Valid for |
//! |---|---|---|
//! | [`bfs_all_pairs`] | O(V·(V+E)) | unit weights |
//! | [`dijkstra_all_pairs`] | O(V·E·log V) | non-negative weights |
//! | [`floyd_warshall`] | O(V³) | non-negative weights (reference) |
//!
//! [`compute_distances`] picks BFS when every friendship weight is 1 and
//! Dijkstra otherwise. On unit-weight graphs all three agree exactly.

mod bfs;
mod dijkstra;
mod floyd;
mod table;

pub use bfs::bfs_all_pairs;
pub use dijkstra::dijkstra_all_pairs;
pub use floyd::floyd_warshall;
pub use table::{Distance, DistanceTable};

use tracing::{debug, instrument};

use crate::graph::GraphStore;

/// Compute the distance table for every node pair of `graph`.
///
/// Unreachable pairs hold [`Distance::INFINITE`]; this never fails.
#[must_use]
#[instrument(skip(graph), fields(nodes = graph.node_count(), edges = graph.edge_count()))]
pub fn compute_distances(graph: &GraphStore) -> DistanceTable {
    let unit = graph.friendship_links().all(|(_, _, weight)| weight == 1);
    if unit {
        debug!("unit friendship weights, using BFS per source");
        bfs_all_pairs(graph)
    } else {
        debug!("weighted friendships, using Dijkstra per source");
        dijkstra_all_pairs(graph)
    }
}

/// Friendship adjacency by dense node index: `adj[u] = [(v, weight), ...]`.
fn friendship_adjacency(graph: &GraphStore) -> Vec<Vec<(usize, u64)>> {
    let mut adj = vec![Vec::new(); graph.node_count()];
    for (a, b, weight) in graph.friendship_links() {
        adj[a].push((b, u64::from(weight)));
        adj[b].push((a, u64::from(weight)));
    }
    adj
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{LinkKind, Node, NodeId};

    fn path_graph(weights: &[u32]) -> GraphStore {
        let mut store = GraphStore::new();
        for i in 0..=weights.len() {
            let node = Node::student(i);
            store.add_node(node.id, node.kind).expect("node");
        }
        for (i, &w) in weights.iter().enumerate() {
            store
                .add_edge(&NodeId::student(i), &NodeId::student(i + 1), w, LinkKind::Friendship)
                .expect("edge");
        }
        store
    }

    #[test]
    fn unit_weights_match_across_engines() {
        let graph = path_graph(&[1, 1, 1]);
        let table = compute_distances(&graph);
        assert_eq!(table, floyd_warshall(&graph));
        assert_eq!(table, dijkstra_all_pairs(&graph));
        assert_eq!(
            table.get(&NodeId::student(0), &NodeId::student(3)),
            Some(Distance::finite(3))
        );
    }

    #[test]
    fn stored_weights_are_respected() {
        let graph = path_graph(&[2, 3]);
        let table = compute_distances(&graph);
        assert_eq!(
            table.get(&NodeId::student(0), &NodeId::student(2)),
            Some(Distance::finite(5))
        );
        assert_eq!(table, floyd_warshall(&graph));
    }

    #[test]
    fn escalation_edges_do_not_propagate() {
        let mut graph = path_graph(&[1]);
        let tutor = Node::tutor(0);
        graph.add_node(tutor.id.clone(), tutor.kind).expect("tutor");
        graph
            .add_edge(&NodeId::student(1), &tutor.id, 1, LinkKind::Escalation)
            .expect("escalation");

        let table = compute_distances(&graph);
        assert_eq!(
            table.get(&NodeId::student(0), &tutor.id),
            Some(Distance::INFINITE)
        );
        assert_eq!(table, floyd_warshall(&graph));
    }
}
