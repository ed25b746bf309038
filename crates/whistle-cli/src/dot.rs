//! Graphviz DOT rendering of an escalation graph.
//!
//! Friendship edges are undirected and grey; escalation edges are red and
//! point from student to tutor and from tutor to director. Positions come
//! from the [`RenderPolicy`] as pinned `pos` attributes, so `neato -n`
//! reproduces the layered layout.

use std::fmt::Write as _;

use anyhow::Result;
use whistle_core::render::{NodeColor, RenderPolicy, Renderer};
use whistle_core::report::EscalationGraph;

/// Colour stops of the viridis map, from early to late.
const VIRIDIS: [(u8, u8, u8); 5] = [
    (0x44, 0x01, 0x54),
    (0x3b, 0x52, 0x8b),
    (0x21, 0x91, 0x8c),
    (0x5e, 0xc9, 0x62),
    (0xfd, 0xe7, 0x25),
];

const TUTOR_FILL: &str = "lightblue";
const DIRECTOR_FILL: &str = "red";

/// Renders [`EscalationGraph`]s as Graphviz DOT.
#[derive(Debug, Clone, Copy, Default)]
pub struct DotRenderer;

impl Renderer for DotRenderer {
    fn render(&self, graph: &EscalationGraph, policy: &dyn RenderPolicy) -> Result<String> {
        let scale_max = graph.max_time_informed().unwrap_or(0);
        let mut out = String::new();

        writeln!(out, "digraph escalation {{")?;
        writeln!(out, "  node [shape=circle, style=filled, fontsize=8];")?;

        for view in graph.node_views() {
            let (x, y) = policy.position(&view);
            let fill = match policy.color(&view, scale_max) {
                NodeColor::Scale(t) => viridis(t),
                NodeColor::Tutor => TUTOR_FILL.to_string(),
                NodeColor::Director => DIRECTOR_FILL.to_string(),
            };
            let label = match view.time_informed {
                Some(time) => format!("{}\\n{time}", view.id),
                None => view.id.to_string(),
            };
            writeln!(
                out,
                "  \"{}\" [pos=\"{x},{y}!\", fillcolor=\"{fill}\", label=\"{label}\"];",
                view.id
            )?;
        }

        for edge in graph.friendship_edges() {
            writeln!(
                out,
                "  \"{}\" -> \"{}\" [dir=none, color=gray, penwidth=1];",
                edge.source, edge.target
            )?;
        }
        for edge in graph.escalation_edges() {
            writeln!(
                out,
                "  \"{}\" -> \"{}\" [color=red, penwidth=2];",
                edge.source, edge.target
            )?;
        }

        writeln!(out, "}}")?;
        Ok(out)
    }
}

/// Hex colour for position `t` on the viridis scale, clamped to `[0, 1]`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn viridis(t: f64) -> String {
    let segments = (VIRIDIS.len() - 1) as f64;
    let scaled = t.clamp(0.0, 1.0) * segments;
    let lower = (scaled.floor() as usize).min(VIRIDIS.len() - 2);
    let frac = scaled - lower as f64;

    let (r0, g0, b0) = VIRIDIS[lower];
    let (r1, g1, b1) = VIRIDIS[lower + 1];
    let mix = |a: u8, b: u8| {
        (f64::from(b) - f64::from(a))
            .mul_add(frac, f64::from(a))
            .round() as u8
    };
    format!("#{:02x}{:02x}{:02x}", mix(r0, r1), mix(g0, g1), mix(b0, b1))
}
