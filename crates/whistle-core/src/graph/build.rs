//! School graph construction.
//!
//! Nodes are added in a fixed order: students `A0..A{n-1}`, then the
//! friendship edges, then tutors `T0..T{t-1}`, then the director. The first
//! construction error aborts the build; a partially built school is never
//! returned.

use tracing::{debug, instrument};

use super::{GraphStore, LinkKind, Node, NodeKind};
use crate::config::SimulationConfig;
use crate::error::GraphError;

/// Weight of every friendship edge: one unit of propagation time.
pub const FRIENDSHIP_WEIGHT: u32 = 1;

/// Build the full school graph from a config and normalized friendship pairs.
///
/// # Errors
///
/// Propagates the first [`GraphError`]: a director id colliding with a
/// student or tutor label is a [`GraphError::DuplicateNode`], a pair that
/// names a student outside the population is a [`GraphError::UnknownNode`],
/// and a self pair is a [`GraphError::SelfLoop`].
#[instrument(
    skip(config, friendships),
    fields(students = config.student_count, pairs = friendships.len())
)]
pub fn build_school(
    config: &SimulationConfig,
    friendships: &[(usize, usize)],
) -> Result<GraphStore, GraphError> {
    let mut store = GraphStore::new();

    for i in 0..config.student_count {
        let node = Node::student(i);
        store.add_node(node.id, node.kind)?;
    }

    for &(a, b) in friendships {
        store.add_edge(
            &Node::student(a).id,
            &Node::student(b).id,
            FRIENDSHIP_WEIGHT,
            LinkKind::Friendship,
        )?;
    }

    for t in 0..config.tutor_count {
        let node = Node::tutor(t);
        store.add_node(node.id, node.kind)?;
    }

    store.add_node(config.director(), NodeKind::Director)?;

    debug!(
        nodes = store.node_count(),
        edges = store.edge_count(),
        "school graph built"
    );
    Ok(store)
}
