//! Error types for graph construction, friendship generation and escalation.
//!
//! Unreachable students are not errors: they surface as
//! [`Distance::INFINITE`](crate::propagation::Distance::INFINITE) in the
//! distance table and are simply left out of the propagation records.

use crate::graph::NodeId;

/// Failures raised while building a [`GraphStore`](crate::graph::GraphStore).
///
/// All of these abort the operation that caused them; the store is left
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// A node with this identifier is already present.
    #[error("duplicate node: {0}")]
    DuplicateNode(NodeId),

    /// An edge endpoint (or a queried node) is not in the graph.
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    /// Both endpoints of an edge are the same node.
    #[error("self-loop on node {0}")]
    SelfLoop(NodeId),
}

/// Failures raised while resolving the escalation chain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EscalationError {
    /// No student is reachable from the origin, so nobody can warn a tutor.
    ///
    /// The caller decides whether to pick a new origin or give up.
    #[error("no student is reachable from the origin")]
    EmptyPropagation,

    /// An origin was requested from an empty student population.
    #[error("cannot select an origin: the graph has no students")]
    NoStudents,

    /// The node passed as origin is not a student.
    #[error("origin {0} is not a student")]
    NotAStudent(NodeId),

    /// A student index falls outside the configured population.
    #[error("student index {index} is outside 0..{student_count}")]
    StudentOutOfRange {
        /// Offending index.
        index: usize,
        /// Configured population size.
        student_count: usize,
    },

    /// The tutor partition cannot cover every student.
    #[error("invalid tutor assignment: {0}")]
    InvalidAssignment(String),

    /// Building the escalation subgraph failed.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Failures raised by a [`FriendshipSource`](crate::graph::FriendshipSource).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeneratorError {
    /// The population is empty.
    #[error("student population must not be empty")]
    EmptyPopulation,

    /// The out-degree must satisfy `0 < degree < student_count`.
    #[error("friendship degree {degree} must be in 1..{student_count}")]
    InvalidDegree {
        /// Requested out-degree.
        degree: usize,
        /// Population size.
        student_count: usize,
    },

    /// A fixed friendship pair is a self pair or references a missing student.
    #[error("invalid friendship pair ({0}, {1})")]
    InvalidPair(usize, usize),
}
