//! Report assembly: the two result tables and the escalation subgraph.
//!
//! A [`Report`] is built once per run from the propagation records and is
//! never mutated afterwards.

use std::collections::{BTreeSet, HashMap};

use serde::{Serialize, Serializer};
use tracing::{debug, instrument};

use crate::error::EscalationError;
use crate::escalation::{
    PropagationRecord, STUDENT_TO_TUTOR_COST, TUTOR_TO_DIRECTOR_COST, TutorAssignment,
    fastest_informants, minimal_time, time_to_director,
};
use crate::graph::{Edge, GraphStore, LinkKind, Node, NodeId};
use crate::render::NodeView;

// ---------------------------------------------------------------------------
// Table rows
// ---------------------------------------------------------------------------

/// Row of the propagation table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropagationRow {
    pub student: NodeId,
    pub time_informed: u64,
    /// Numeric part of the student id; breaks ties between equal times.
    #[serde(skip)]
    pub student_index: usize,
}

/// Row of the fastest-informants table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FastestInformantRow {
    pub student: NodeId,
    pub time_informed: u64,
    pub time_to_director: u64,
}

// ---------------------------------------------------------------------------
// EscalationGraph
// ---------------------------------------------------------------------------

/// Subgraph handed to renderers: the informed students with the friendships
/// among them, the tutors of the fastest informants, the director, and the
/// escalation edges linking them.
///
/// The origin is not part of it; it never informs anyone itself.
#[derive(Debug, Clone)]
pub struct EscalationGraph {
    store: GraphStore,
    times: HashMap<NodeId, u64>,
}

impl EscalationGraph {
    /// Derive the subgraph from the full school graph.
    ///
    /// # Errors
    ///
    /// Returns an [`EscalationError`] if a fastest informant has no tutor.
    pub fn build(
        source: &GraphStore,
        records: &[PropagationRecord],
        fastest: &[&PropagationRecord],
        assignment: &TutorAssignment,
        director: &Node,
    ) -> Result<Self, EscalationError> {
        let mut store = GraphStore::new();
        let mut times = HashMap::with_capacity(records.len());

        for record in records {
            let node = Node::student(record.student_index);
            store.add_node(record.student.clone(), node.kind)?;
            times.insert(record.student.clone(), record.time_informed);
        }

        let mut tutor_indexes = BTreeSet::new();
        let mut informant_links = Vec::with_capacity(fastest.len());
        for record in fastest {
            let tutor = assignment.assign(record.student_index)?;
            informant_links.push((record.student.clone(), NodeId::tutor(tutor)));
            tutor_indexes.insert(tutor);
        }
        let tutors: Vec<Node> = tutor_indexes.into_iter().map(Node::tutor).collect();
        for tutor in &tutors {
            store.add_node(tutor.id.clone(), tutor.kind)?;
        }
        store.add_node(director.id.clone(), director.kind)?;

        for edge in source.edges() {
            if edge.kind == LinkKind::Friendship
                && times.contains_key(&edge.source)
                && times.contains_key(&edge.target)
            {
                store.add_edge(
                    &edge.source,
                    &edge.target,
                    edge.weight,
                    LinkKind::Friendship,
                )?;
            }
        }

        for (student, tutor) in &informant_links {
            store.add_edge(student, tutor, STUDENT_TO_TUTOR_COST, LinkKind::Escalation)?;
        }
        for tutor in &tutors {
            store.add_edge(
                &tutor.id,
                &director.id,
                TUTOR_TO_DIRECTOR_COST,
                LinkKind::Escalation,
            )?;
        }

        debug!(
            nodes = store.node_count(),
            edges = store.edge_count(),
            tutors = tutors.len(),
            "escalation graph built"
        );
        Ok(Self { store, times })
    }

    #[must_use]
    pub const fn graph(&self) -> &GraphStore {
        &self.store
    }

    /// When a student in the subgraph was informed.
    #[must_use]
    pub fn time_informed(&self, id: &NodeId) -> Option<u64> {
        self.times.get(id).copied()
    }

    /// Latest time any student in the subgraph was informed.
    #[must_use]
    pub fn max_time_informed(&self) -> Option<u64> {
        self.times.values().copied().max()
    }

    /// Renderer input for every node, in insertion order.
    #[must_use]
    pub fn node_views(&self) -> Vec<NodeView> {
        self.store
            .nodes()
            .map(|node| NodeView {
                id: node.id.clone(),
                kind: node.kind,
                time_informed: self.time_informed(&node.id),
            })
            .collect()
    }

    #[must_use]
    pub fn friendship_edges(&self) -> Vec<Edge> {
        self.edges_of(LinkKind::Friendship)
    }

    #[must_use]
    pub fn escalation_edges(&self) -> Vec<Edge> {
        self.edges_of(LinkKind::Escalation)
    }

    fn edges_of(&self, kind: LinkKind) -> Vec<Edge> {
        self.store
            .edges()
            .into_iter()
            .filter(|edge| edge.kind == kind)
            .collect()
    }
}

impl Serialize for EscalationGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Doc {
            nodes: Vec<NodeView>,
            edges: Vec<Edge>,
        }
        Doc {
            nodes: self.node_views(),
            edges: self.store.edges(),
        }
        .serialize(serializer)
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Everything one run produces.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub origin: NodeId,
    pub minimal_time: u64,
    pub time_to_director: u64,
    /// Every informed student, earliest first.
    pub propagation: Vec<PropagationRow>,
    /// Students tied for the minimal time.
    pub fastest_informants: Vec<FastestInformantRow>,
    pub escalation: EscalationGraph,
}

impl Report {
    /// Assemble the tables and escalation graph for one origin.
    ///
    /// # Errors
    ///
    /// Returns [`EscalationError::EmptyPropagation`] when `records` is empty
    /// (the origin has no friendship path to anyone), or an assignment error
    /// from [`EscalationGraph::build`].
    #[instrument(skip_all, fields(origin = %origin.id, records = records.len()))]
    pub fn assemble(
        source: &GraphStore,
        origin: &Node,
        records: &[PropagationRecord],
        assignment: &TutorAssignment,
        director: &Node,
    ) -> Result<Self, EscalationError> {
        let minimal_time = minimal_time(records)?;
        let time_to_director = time_to_director(minimal_time);
        let fastest = fastest_informants(records, minimal_time);

        let escalation = EscalationGraph::build(source, records, &fastest, assignment, director)?;

        let propagation = records
            .iter()
            .map(|r| PropagationRow {
                student: r.student.clone(),
                time_informed: r.time_informed,
                student_index: r.student_index,
            })
            .collect();
        let fastest_informants = fastest
            .iter()
            .map(|r| FastestInformantRow {
                student: r.student.clone(),
                time_informed: r.time_informed,
                time_to_director,
            })
            .collect();

        Ok(Self {
            origin: origin.id.clone(),
            minimal_time,
            time_to_director,
            propagation,
            fastest_informants,
            escalation,
        })
    }

    /// The first `rows` entries of the propagation table.
    #[must_use]
    pub fn preview(&self, rows: usize) -> &[PropagationRow] {
        &self.propagation[..rows.min(self.propagation.len())]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escalation::build_propagation_records;
    use crate::graph::FRIENDSHIP_WEIGHT;
    use crate::propagation::compute_distances;

    /// Path A0 - A1 - A2 - A3 plus an isolated A4; two tutors (blocks of 2),
    /// director D.
    fn school() -> (GraphStore, Node) {
        let mut store = GraphStore::new();
        for i in 0..5 {
            let node = Node::student(i);
            store.add_node(node.id, node.kind).expect("student");
        }
        for i in 0..3 {
            store
                .add_edge(
                    &NodeId::student(i),
                    &NodeId::student(i + 1),
                    FRIENDSHIP_WEIGHT,
                    LinkKind::Friendship,
                )
                .expect("edge");
        }
        for t in 0..3 {
            let node = Node::tutor(t);
            store.add_node(node.id, node.kind).expect("tutor");
        }
        let director = Node::director(NodeId::new("D"));
        store
            .add_node(director.id.clone(), director.kind)
            .expect("director");
        (store, director)
    }

    fn report_from(origin: usize) -> Result<Report, EscalationError> {
        let (store, director) = school();
        let table = compute_distances(&store);
        let origin = Node::student(origin);
        let students = store.students();
        let records = build_propagation_records(&origin, &table, &students);
        let assignment = TutorAssignment::new(5, 3, 2).expect("assignment");
        Report::assemble(&store, &origin, &records, &assignment, &director)
    }

    #[test]
    fn tables_from_path_end() {
        let report = report_from(0).expect("report");
        assert_eq!(report.origin, NodeId::student(0));
        assert_eq!(report.minimal_time, 1);
        assert_eq!(report.time_to_director, 3);

        let rows: Vec<(&str, u64)> = report
            .propagation
            .iter()
            .map(|r| (r.student.as_str(), r.time_informed))
            .collect();
        assert_eq!(rows, vec![("A1", 1), ("A2", 2), ("A3", 3)]);

        assert_eq!(
            report.fastest_informants,
            vec![FastestInformantRow {
                student: NodeId::student(1),
                time_informed: 1,
                time_to_director: 3,
            }]
        );
        assert_eq!(report.preview(2).len(), 2);
        assert_eq!(report.preview(50).len(), 3);
    }

    #[test]
    fn escalation_graph_contents() {
        // Origin A1: A0 and A2 tie at 1; A0 -> T0, A2 -> T1.
        let report = report_from(1).expect("report");
        let graph = &report.escalation;
        let store = graph.graph();

        assert!(!store.has_node(&NodeId::student(1)), "origin excluded");
        assert!(!store.has_node(&NodeId::student(4)), "unreachable excluded");
        assert!(store.has_node(&NodeId::tutor(0)));
        assert!(store.has_node(&NodeId::tutor(1)));
        assert!(!store.has_node(&NodeId::tutor(2)), "tutor of nobody fast");
        assert!(store.has_node(&NodeId::new("D")));

        // Only A2 - A3 survives among informed students (A0 - A1 and A1 - A2 touch the origin).
        let friendships: Vec<(String, String)> = graph
            .friendship_edges()
            .into_iter()
            .map(|e| (e.source.to_string(), e.target.to_string()))
            .collect();
        assert_eq!(friendships, vec![("A2".to_string(), "A3".to_string())]);

        let escalations: Vec<(String, String)> = graph
            .escalation_edges()
            .into_iter()
            .map(|e| (e.source.to_string(), e.target.to_string()))
            .collect();
        assert_eq!(
            escalations,
            vec![
                ("A0".to_string(), "T0".to_string()),
                ("A2".to_string(), "T1".to_string()),
                ("T0".to_string(), "D".to_string()),
                ("T1".to_string(), "D".to_string()),
            ]
        );

        assert_eq!(graph.time_informed(&NodeId::student(3)), Some(2));
        assert_eq!(graph.time_informed(&NodeId::tutor(0)), None);
        assert_eq!(graph.max_time_informed(), Some(2));
    }

    #[test]
    fn isolated_origin_is_empty_propagation() {
        assert_eq!(
            report_from(4).expect_err("isolated"),
            EscalationError::EmptyPropagation
        );
    }

    #[test]
    fn report_serializes_tables_and_graph() {
        let report = report_from(0).expect("report");
        let json = serde_json::to_value(&report).expect("json");
        assert_eq!(json["time_to_director"], 3);
        assert_eq!(json["fastest_informants"][0]["student"], "A1");
        assert_eq!(json["escalation"]["nodes"][0]["type"], "student");
        assert!(
            json["escalation"]["edges"]
                .as_array()
                .is_some_and(|e| !e.is_empty())
        );
    }
}
