use std::collections::HashMap;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::graph::{GraphStore, NodeId};

// ---------------------------------------------------------------------------
// Distance
// ---------------------------------------------------------------------------

/// Shortest-path weight between two nodes, or [`Distance::INFINITE`] when
/// no friendship path exists.
///
/// Ordering puts every finite distance before `INFINITE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Distance(u64);

impl Distance {
    pub const ZERO: Self = Self(0);
    pub const INFINITE: Self = Self(u64::MAX);

    /// A finite distance. Values that would collide with the sentinel
    /// saturate to [`Distance::INFINITE`].
    #[must_use]
    pub const fn finite(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.0 != u64::MAX
    }

    /// The hop count, or `None` if unreachable.
    #[must_use]
    pub const fn value(self) -> Option<u64> {
        if self.is_finite() { Some(self.0) } else { None }
    }

    /// Path extension: `INFINITE` absorbs, finite values saturate.
    #[must_use]
    pub const fn plus(self, other: Self) -> Self {
        if !self.is_finite() || !other.is_finite() {
            return Self::INFINITE;
        }
        Self(self.0.saturating_add(other.0))
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            Some(v) => write!(f, "{v}"),
            None => f.write_str("inf"),
        }
    }
}

impl Serialize for Distance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value().serialize(serializer)
    }
}

// ---------------------------------------------------------------------------
// DistanceTable
// ---------------------------------------------------------------------------

/// Dense `n × n` matrix of shortest distances over every node of a graph.
///
/// Row/column `i` is the node with dense index `i` in the source
/// [`GraphStore`]. Invariants: the diagonal is zero, the matrix is
/// symmetric, and finite entries satisfy the triangle inequality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistanceTable {
    ids: Vec<NodeId>,
    lookup: HashMap<NodeId, usize>,
    cells: Vec<Distance>,
}

impl DistanceTable {
    /// A table with zero diagonal and every other pair unreachable.
    pub(crate) fn unreachable(graph: &GraphStore) -> Self {
        let ids: Vec<NodeId> = graph.nodes().map(|n| n.id.clone()).collect();
        let lookup = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();
        let n = ids.len();
        let mut cells = vec![Distance::INFINITE; n * n];
        for i in 0..n {
            cells[i * n + i] = Distance::ZERO;
        }
        Self { ids, lookup, cells }
    }

    /// Number of nodes covered by the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Node identifiers in dense-index order.
    #[must_use]
    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    /// Distance from `a` to `b`, or `None` if either node is not covered.
    #[must_use]
    pub fn get(&self, a: &NodeId, b: &NodeId) -> Option<Distance> {
        let i = *self.lookup.get(a)?;
        let j = *self.lookup.get(b)?;
        Some(self.at(i, j))
    }

    /// Every `(target, distance)` pair from `source`, in dense-index order.
    pub fn from_source<'a>(
        &'a self,
        source: &NodeId,
    ) -> Option<impl Iterator<Item = (&'a NodeId, Distance)> + 'a> {
        let i = *self.lookup.get(source)?;
        let n = self.len();
        Some(
            self.ids
                .iter()
                .zip(self.cells[i * n..(i + 1) * n].iter().copied()),
        )
    }

    pub(crate) fn at(&self, i: usize, j: usize) -> Distance {
        self.cells[i * self.len() + j]
    }

    pub(crate) fn set(&mut self, i: usize, j: usize, d: Distance) {
        let n = self.len();
        self.cells[i * n + j] = d;
    }
}
