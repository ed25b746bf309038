//! Dijkstra from every source, for friendship graphs with non-unit weights.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use tracing::instrument;

use super::{Distance, DistanceTable, friendship_adjacency};
use crate::graph::GraphStore;

/// Shortest distances between every pair of nodes using stored weights.
#[must_use]
#[instrument(skip(graph))]
pub fn dijkstra_all_pairs(graph: &GraphStore) -> DistanceTable {
    let adj = friendship_adjacency(graph);
    let mut table = DistanceTable::unreachable(graph);
    let n = adj.len();

    let mut best: Vec<Distance> = vec![Distance::INFINITE; n];
    let mut heap: BinaryHeap<Reverse<(Distance, usize)>> = BinaryHeap::new();

    for source in 0..n {
        best.fill(Distance::INFINITE);
        best[source] = Distance::ZERO;
        heap.clear();
        heap.push(Reverse((Distance::ZERO, source)));

        while let Some(Reverse((d, u))) = heap.pop() {
            if d > best[u] {
                continue; // stale entry
            }
            for &(v, w) in &adj[u] {
                let candidate = d.plus(Distance::finite(w));
                if candidate < best[v] {
                    best[v] = candidate;
                    heap.push(Reverse((candidate, v)));
                }
            }
        }

        for (target, &d) in best.iter().enumerate() {
            table.set(source, target, d);
        }
    }

    table
}
