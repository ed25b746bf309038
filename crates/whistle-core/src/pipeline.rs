//! One simulation run, end to end.
//!
//! [`Scenario::build`] does the expensive, origin-independent work
//! (friendships, graph, distance table). [`Scenario::resolve`] can then be
//! called for any origin; callers that want to retry after
//! [`EscalationError::EmptyPropagation`] pick another origin and resolve
//! again without rebuilding.

use anyhow::{Context, Result};
use rand::Rng;
use tracing::{info, instrument};

use crate::config::SimulationConfig;
use crate::error::{EscalationError, GraphError};
use crate::escalation::{TutorAssignment, build_propagation_records, select_origin};
use crate::graph::{FriendshipSource, GraphStore, Node, NodeId, build_school};
use crate::propagation::{DistanceTable, compute_distances};
use crate::report::Report;

/// A built school graph with its distance table, ready to resolve origins.
///
/// Owned by a single run; never shared between runs.
#[derive(Debug, Clone)]
pub struct Scenario {
    config: SimulationConfig,
    graph: GraphStore,
    distances: DistanceTable,
    assignment: TutorAssignment,
}

impl Scenario {
    /// Generate friendships, build the graph and compute all distances.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid, the friendship source
    /// rejects its parameters, or graph construction fails.
    #[instrument(
        skip_all,
        fields(students = config.student_count, degree = config.friendship_degree)
    )]
    pub fn build<S, R>(config: &SimulationConfig, source: &S, rng: &mut R) -> Result<Self>
    where
        S: FriendshipSource + ?Sized,
        R: Rng + ?Sized,
    {
        config.validate()?;

        let friendships = source
            .friendships(config.student_count, rng)
            .context("generate friendships")?;
        let graph = build_school(config, &friendships).context("build school graph")?;
        let distances = compute_distances(&graph);
        let assignment = TutorAssignment::from_config(config)?;

        Ok(Self {
            config: config.clone(),
            graph,
            distances,
            assignment,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    #[must_use]
    pub const fn graph(&self) -> &GraphStore {
        &self.graph
    }

    #[must_use]
    pub const fn distances(&self) -> &DistanceTable {
        &self.distances
    }

    #[must_use]
    pub const fn assignment(&self) -> &TutorAssignment {
        &self.assignment
    }

    /// Pick a random student as the incident origin.
    ///
    /// # Errors
    ///
    /// Returns [`EscalationError::NoStudents`] for an empty population.
    pub fn pick_origin<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<NodeId, EscalationError> {
        let students = self.graph.students();
        select_origin(&students, rng).map(|node| node.id.clone())
    }

    /// Resolve the escalation chain for `origin`.
    ///
    /// # Errors
    ///
    /// - [`EscalationError::Graph`] wrapping [`GraphError::UnknownNode`] if
    ///   `origin` is not in the graph.
    /// - [`EscalationError::NotAStudent`] if `origin` is a tutor or the
    ///   director.
    /// - [`EscalationError::EmptyPropagation`] if nobody is reachable.
    #[instrument(skip(self))]
    pub fn resolve(&self, origin: &NodeId) -> Result<Report, EscalationError> {
        let origin_node = self
            .graph
            .node(origin)
            .ok_or_else(|| GraphError::UnknownNode(origin.clone()))?;
        if !origin_node.kind.is_student() {
            return Err(EscalationError::NotAStudent(origin.clone()));
        }

        let director = self.director()?;
        let students = self.graph.students();
        let records = build_propagation_records(origin_node, &self.distances, &students);
        let report = Report::assemble(
            &self.graph,
            origin_node,
            &records,
            &self.assignment,
            director,
        )?;

        info!(
            origin = %report.origin,
            informed = report.propagation.len(),
            minimal_time = report.minimal_time,
            fastest = report.fastest_informants.len(),
            time_to_director = report.time_to_director,
            "escalation resolved"
        );
        Ok(report)
    }

    fn director(&self) -> Result<&Node, GraphError> {
        let id = self.config.director();
        self.graph.node(&id).ok_or(GraphError::UnknownNode(id))
    }
}

/// Build a scenario, pick a random origin and resolve it. No retries.
///
/// # Errors
///
/// Returns any build error, and [`EscalationError::EmptyPropagation`] (as
/// the root cause) when the chosen origin is isolated.
pub fn run_simulation<S, R>(config: &SimulationConfig, source: &S, rng: &mut R) -> Result<Report>
where
    S: FriendshipSource + ?Sized,
    R: Rng + ?Sized,
{
    let scenario = Scenario::build(config, source, rng)?;
    let origin = scenario.pick_origin(rng)?;
    scenario
        .resolve(&origin)
        .with_context(|| format!("resolve escalation from {origin}"))
}
