//! School social graph.
//!
//! # Overview
//!
//! The graph has three layers of typed nodes: students, tutors and one
//! director. Friendship edges connect students; escalation edges (student to
//! tutor, tutor to director) only ever appear in the derived
//! [`EscalationGraph`](crate::report::EscalationGraph).
//!
//! ## Pipeline
//!
//! ```text
//! FriendshipSource::friendships()   (index pairs, deduplicated)
//!        ↓  build::build_school()
//! GraphStore (students, friendships, tutors, director)
//!        ↓  propagation::compute_distances()
//! DistanceTable
//! ```
//!
//! Node kinds are an explicit enum. Identifiers (`A3`, `T0`, `D105`) are
//! display labels only and are never parsed back.

pub mod build;
pub mod friendship;
pub mod store;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use build::{FRIENDSHIP_WEIGHT, build_school};
pub use friendship::{FixedFriendships, FriendshipSource, UniformOutDegree, generate_friendships};
pub use store::{Edge, GraphStore};

// ---------------------------------------------------------------------------
// NodeId
// ---------------------------------------------------------------------------

/// Display identifier of a node (`A0`, `T1`, `D105`, ...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Wrap an arbitrary label.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Conventional label for the student at `index`.
    #[must_use]
    pub fn student(index: usize) -> Self {
        Self(format!("A{index}"))
    }

    /// Conventional label for the tutor at `index`.
    #[must_use]
    pub fn tutor(index: usize) -> Self {
        Self(format!("T{index}"))
    }

    /// Borrow the label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

// ---------------------------------------------------------------------------
// NodeKind / Node
// ---------------------------------------------------------------------------

/// Layer of a node in the school hierarchy.
///
/// Students and tutors carry their ordinal, which drives tutor assignment
/// and layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    Student { index: usize },
    Tutor { index: usize },
    Director,
}

impl NodeKind {
    /// Student ordinal, if this is a student.
    #[must_use]
    pub const fn student_index(self) -> Option<usize> {
        match self {
            Self::Student { index } => Some(index),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_student(self) -> bool {
        matches!(self, Self::Student { .. })
    }

    /// Short lowercase name, as used in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student { .. } => "student",
            Self::Tutor { .. } => "tutor",
            Self::Director => "director",
        }
    }
}

/// A node of the school graph. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl Node {
    #[must_use]
    pub fn student(index: usize) -> Self {
        Self {
            id: NodeId::student(index),
            kind: NodeKind::Student { index },
        }
    }

    #[must_use]
    pub fn tutor(index: usize) -> Self {
        Self {
            id: NodeId::tutor(index),
            kind: NodeKind::Tutor { index },
        }
    }

    #[must_use]
    pub const fn director(id: NodeId) -> Self {
        Self {
            id,
            kind: NodeKind::Director,
        }
    }
}

// ---------------------------------------------------------------------------
// LinkKind
// ---------------------------------------------------------------------------

/// Kind of an edge.
///
/// Only friendship edges carry propagation; escalation edges are added to
/// the derived subgraph after propagation has been computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    Friendship,
    Escalation,
}

/// Edge payload stored in the petgraph backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub kind: LinkKind,
    pub weight: u32,
}
