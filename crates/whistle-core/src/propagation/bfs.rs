//! Breadth-first search from every source.
//!
//! Each friendship edge counts as one hop regardless of its stored weight,
//! so this engine is exact only for unit-weight graphs (the only kind the
//! school generator builds). Complexity: O(V·(V+E)).

use std::collections::VecDeque;

use tracing::instrument;

use super::{Distance, DistanceTable, friendship_adjacency};
use crate::graph::GraphStore;

/// Hop distances between every pair of nodes.
#[must_use]
#[instrument(skip(graph))]
pub fn bfs_all_pairs(graph: &GraphStore) -> DistanceTable {
    let adj = friendship_adjacency(graph);
    let mut table = DistanceTable::unreachable(graph);
    let n = adj.len();

    let mut depth: Vec<Option<u64>> = vec![None; n];
    let mut queue: VecDeque<usize> = VecDeque::with_capacity(n);

    for source in 0..n {
        depth.fill(None);
        depth[source] = Some(0);
        queue.clear();
        queue.push_back(source);

        while let Some(u) = queue.pop_front() {
            let Some(du) = depth[u] else { continue };
            table.set(source, u, Distance::finite(du));
            for &(v, _) in &adj[u] {
                if depth[v].is_none() {
                    depth[v] = Some(du + 1);
                    queue.push_back(v);
                }
            }
        }
    }

    table
}
