//! Floyd–Warshall all-pairs shortest paths.
//!
//! O(V³) and kept as the reference engine: the faster engines are checked
//! against it.

use tracing::instrument;

use super::{Distance, DistanceTable};
use crate::graph::GraphStore;

/// Shortest distances between every pair of nodes using stored weights.
#[must_use]
#[instrument(skip(graph))]
pub fn floyd_warshall(graph: &GraphStore) -> DistanceTable {
    let mut table = DistanceTable::unreachable(graph);
    let n = table.len();

    for (a, b, weight) in graph.friendship_links() {
        let w = Distance::finite(u64::from(weight));
        if w < table.at(a, b) {
            table.set(a, b, w);
            table.set(b, a, w);
        }
    }

    for k in 0..n {
        for i in 0..n {
            let dik = table.at(i, k);
            if !dik.is_finite() {
                continue;
            }
            for j in 0..n {
                let through = dik.plus(table.at(k, j));
                if through < table.at(i, j) {
                    table.set(i, j, through);
                }
            }
        }
    }

    table
}
