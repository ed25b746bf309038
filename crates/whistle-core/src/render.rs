//! Rendering seam.
//!
//! The core never draws anything. A [`Renderer`] consumes an
//! [`EscalationGraph`] through [`NodeView`]s and asks a [`RenderPolicy`]
//! where each node goes and how to colour it. [`LayeredPolicy`] reproduces
//! the classic three-row layout; callers can substitute their own.

use anyhow::Result;
use serde::Serialize;

use crate::graph::{NodeId, NodeKind};
use crate::report::EscalationGraph;

/// Everything a renderer may know about a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeView {
    pub id: NodeId,
    #[serde(flatten)]
    pub kind: NodeKind,
    /// `None` for tutors, the director, and students never informed.
    pub time_informed: Option<u64>,
}

/// Colour assigned to a node by a [`RenderPolicy`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeColor {
    /// Position on a continuous colour scale, in `[0, 1)`.
    Scale(f64),
    Tutor,
    Director,
}

/// Layout and colour policy, parameterized by node kind and time informed.
pub trait RenderPolicy {
    /// 2D position of a node.
    fn position(&self, node: &NodeView) -> (f64, f64);

    /// Colour of a node, where `scale_max` is the latest time any student
    /// was informed.
    fn color(&self, node: &NodeView, scale_max: u64) -> NodeColor;
}

/// Produces a textual drawing of an escalation graph.
pub trait Renderer {
    /// # Errors
    ///
    /// Returns an error if the output cannot be produced.
    fn render(&self, graph: &EscalationGraph, policy: &dyn RenderPolicy) -> Result<String>;
}

/// Three horizontal rows: students on `y = 0` by index, tutors on `y = 1`
/// spread by `tutor_spacing`, the director alone on `y = 2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayeredPolicy {
    pub tutor_spacing: f64,
    pub director_anchor: f64,
}

impl Default for LayeredPolicy {
    fn default() -> Self {
        Self {
            tutor_spacing: 2.0,
            director_anchor: 50.0,
        }
    }
}

impl RenderPolicy for LayeredPolicy {
    #[allow(clippy::cast_precision_loss)]
    fn position(&self, node: &NodeView) -> (f64, f64) {
        match node.kind {
            NodeKind::Student { index } => (index as f64, 0.0),
            NodeKind::Tutor { index } => (index as f64 * self.tutor_spacing, 1.0),
            NodeKind::Director => (self.director_anchor, 2.0),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn color(&self, node: &NodeView, scale_max: u64) -> NodeColor {
        match node.kind {
            NodeKind::Student { .. } => {
                let time = node.time_informed.unwrap_or(0);
                NodeColor::Scale(time as f64 / (scale_max as f64 + 1.0))
            }
            NodeKind::Tutor { .. } => NodeColor::Tutor,
            NodeKind::Director => NodeColor::Director,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(kind: NodeKind, time_informed: Option<u64>) -> NodeView {
        let id = match kind {
            NodeKind::Student { index } => NodeId::student(index),
            NodeKind::Tutor { index } => NodeId::tutor(index),
            NodeKind::Director => NodeId::new("D105"),
        };
        NodeView {
            id,
            kind,
            time_informed,
        }
    }

    #[test]
    fn layered_positions() {
        let policy = LayeredPolicy::default();
        assert_eq!(
            policy.position(&view(NodeKind::Student { index: 7 }, Some(1))),
            (7.0, 0.0)
        );
        assert_eq!(
            policy.position(&view(NodeKind::Tutor { index: 3 }, None)),
            (6.0, 1.0)
        );
        assert_eq!(
            policy.position(&view(NodeKind::Director, None)),
            (50.0, 2.0)
        );
    }

    #[test]
    fn student_colour_scales_with_time() {
        let policy = LayeredPolicy::default();
        let early = policy.color(&view(NodeKind::Student { index: 0 }, Some(1)), 3);
        let late = policy.color(&view(NodeKind::Student { index: 1 }, Some(3)), 3);
        assert_eq!(early, NodeColor::Scale(0.25));
        assert_eq!(late, NodeColor::Scale(0.75));
        assert_eq!(
            policy.color(&view(NodeKind::Tutor { index: 0 }, None), 3),
            NodeColor::Tutor
        );
        assert_eq!(
            policy.color(&view(NodeKind::Director, None), 3),
            NodeColor::Director
        );
    }
}
