//! Escalation resolution: who hears first, and how fast the director learns.
//!
//! # Overview
//!
//! Given the incident origin and a [`DistanceTable`], every other reachable
//! student becomes a [`PropagationRecord`]. The students tied for the
//! minimal time are the *fastest informants*; each warns the tutor of their
//! block, and the tutor warns the director:
//!
//! ```text
//! origin ~~ friendships ~~► informant ──1──► tutor ──1──► director
//! ```
//!
//! so the director is reached at `minimal_time + 2`.
//!
//! ## Ordering
//!
//! Records are sorted by time informed, ties broken by ascending student
//! index (numeric, so `A2` precedes `A10`). The order is fully determined
//! by the graph and the origin.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::config::SimulationConfig;
use crate::error::EscalationError;
use crate::graph::{Node, NodeId, NodeKind};
use crate::propagation::DistanceTable;

/// Time for a student to warn their tutor.
pub const STUDENT_TO_TUTOR_COST: u32 = 1;

/// Time for a tutor to warn the director.
pub const TUTOR_TO_DIRECTOR_COST: u32 = 1;

// ---------------------------------------------------------------------------
// PropagationRecord
// ---------------------------------------------------------------------------

/// When a single student hears about the incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropagationRecord {
    pub student: NodeId,
    pub student_index: usize,
    pub time_informed: u64,
}

// ---------------------------------------------------------------------------
// Origin and records
// ---------------------------------------------------------------------------

/// Pick the incident origin uniformly among `students`.
///
/// # Errors
///
/// Returns [`EscalationError::NoStudents`] if `students` is empty.
pub fn select_origin<'a, R: Rng + ?Sized>(
    students: &[&'a Node],
    rng: &mut R,
) -> Result<&'a Node, EscalationError> {
    students
        .choose(rng)
        .copied()
        .ok_or(EscalationError::NoStudents)
}

/// Build the sorted propagation records for `origin`.
///
/// The origin itself, non-student nodes, and students with no friendship
/// path from the origin are left out.
#[must_use]
#[instrument(skip(table, students), fields(origin = %origin.id))]
pub fn build_propagation_records(
    origin: &Node,
    table: &DistanceTable,
    students: &[&Node],
) -> Vec<PropagationRecord> {
    let mut records: Vec<PropagationRecord> = students
        .iter()
        .filter(|s| s.id != origin.id)
        .filter_map(|s| {
            let student_index = s.kind.student_index()?;
            let time_informed = table.get(&origin.id, &s.id)?.value()?;
            Some(PropagationRecord {
                student: s.id.clone(),
                student_index,
                time_informed,
            })
        })
        .collect();

    records.sort_by_key(|r| (r.time_informed, r.student_index));
    debug!(informed = records.len(), "propagation records built");
    records
}

/// The earliest time any student hears about the incident.
///
/// # Errors
///
/// Returns [`EscalationError::EmptyPropagation`] if no student was informed.
pub fn minimal_time(records: &[PropagationRecord]) -> Result<u64, EscalationError> {
    records
        .iter()
        .map(|r| r.time_informed)
        .min()
        .ok_or(EscalationError::EmptyPropagation)
}

/// Every record informed at exactly `minimal_time`, in record order.
#[must_use]
pub fn fastest_informants(
    records: &[PropagationRecord],
    minimal_time: u64,
) -> Vec<&PropagationRecord> {
    records
        .iter()
        .filter(|r| r.time_informed == minimal_time)
        .collect()
}

/// Time at which the director is warned: one hop to the tutor, one to the
/// director.
#[must_use]
pub fn time_to_director(minimal_time: u64) -> u64 {
    minimal_time
        .saturating_add(u64::from(STUDENT_TO_TUTOR_COST))
        .saturating_add(u64::from(TUTOR_TO_DIRECTOR_COST))
}

// ---------------------------------------------------------------------------
// TutorAssignment
// ---------------------------------------------------------------------------

/// Block partition of students over tutors: student `i` reports to tutor
/// `i / block_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TutorAssignment {
    student_count: usize,
    tutor_count: usize,
    block_size: usize,
}

impl TutorAssignment {
    /// # Errors
    ///
    /// Returns [`EscalationError::InvalidAssignment`] if the block size is
    /// zero or the tutors cannot cover every student.
    pub fn new(
        student_count: usize,
        tutor_count: usize,
        block_size: usize,
    ) -> Result<Self, EscalationError> {
        if block_size == 0 {
            return Err(EscalationError::InvalidAssignment(
                "block size must be > 0".to_string(),
            ));
        }
        let needed = student_count.div_ceil(block_size);
        if needed > tutor_count {
            return Err(EscalationError::InvalidAssignment(format!(
                "{student_count} students in blocks of {block_size} need {needed} tutors, have {tutor_count}"
            )));
        }
        Ok(Self {
            student_count,
            tutor_count,
            block_size,
        })
    }

    /// # Errors
    ///
    /// See [`TutorAssignment::new`].
    pub fn from_config(config: &SimulationConfig) -> Result<Self, EscalationError> {
        Self::new(
            config.student_count,
            config.tutor_count,
            config.tutor_block_size,
        )
    }

    /// Tutor index for a student index.
    ///
    /// # Errors
    ///
    /// Returns [`EscalationError::StudentOutOfRange`] outside
    /// `0..student_count`.
    pub fn assign(&self, student_index: usize) -> Result<usize, EscalationError> {
        if student_index >= self.student_count {
            return Err(EscalationError::StudentOutOfRange {
                index: student_index,
                student_count: self.student_count,
            });
        }
        Ok(student_index / self.block_size)
    }

    /// Tutor node for a student node.
    ///
    /// # Errors
    ///
    /// Returns [`EscalationError::NotAStudent`] for tutors and the director,
    /// and [`EscalationError::StudentOutOfRange`] as for [`Self::assign`].
    pub fn tutor_of(&self, student: &Node) -> Result<Node, EscalationError> {
        let NodeKind::Student { index } = student.kind else {
            return Err(EscalationError::NotAStudent(student.id.clone()));
        };
        self.assign(index).map(Node::tutor)
    }

    #[must_use]
    pub const fn tutor_count(&self) -> usize {
        self.tutor_count
    }

    #[must_use]
    pub const fn block_size(&self) -> usize {
        self.block_size
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn record(index: usize, time: u64) -> PropagationRecord {
        PropagationRecord {
            student: NodeId::student(index),
            student_index: index,
            time_informed: time,
        }
    }

    #[test]
    fn minimal_time_of_empty_records_is_an_error() {
        assert_eq!(minimal_time(&[]), Err(EscalationError::EmptyPropagation));
    }

    #[test]
    fn fastest_informants_share_the_minimum() {
        let records = vec![record(10, 1), record(2, 1), record(4, 2)];
        let min = minimal_time(&records).expect("non-empty");
        assert_eq!(min, 1);
        let fastest: Vec<usize> = fastest_informants(&records, min)
            .iter()
            .map(|r| r.student_index)
            .collect();
        assert_eq!(fastest, vec![10, 2]);
    }

    #[test]
    fn director_is_two_hops_after_the_fastest_informant() {
        assert_eq!(time_to_director(0), 2);
        assert_eq!(time_to_director(1), 3);
        assert_eq!(time_to_director(u64::MAX), u64::MAX);
    }

    #[test]
    fn block_assignment() {
        let assignment = TutorAssignment::new(100, 5, 20).expect("valid");
        assert_eq!(assignment.assign(0), Ok(0));
        assert_eq!(assignment.assign(19), Ok(0));
        assert_eq!(assignment.assign(20), Ok(1));
        assert_eq!(assignment.assign(99), Ok(4));
        assert_eq!(
            assignment.assign(100),
            Err(EscalationError::StudentOutOfRange {
                index: 100,
                student_count: 100
            })
        );
    }

    #[test]
    fn assignment_is_total_and_deterministic() {
        let assignment = TutorAssignment::new(23, 3, 8).expect("valid");
        for i in 0..23 {
            let first = assignment.assign(i).expect("in range");
            assert_eq!(assignment.assign(i), Ok(first));
            assert!(first < assignment.tutor_count());
        }
    }

    #[test]
    fn assignment_must_cover_population() {
        assert!(TutorAssignment::new(100, 4, 20).is_err());
        assert!(TutorAssignment::new(10, 4, 0).is_err());
        assert!(TutorAssignment::new(0, 1, 1).is_ok());
    }

    #[test]
    fn tutor_of_rejects_non_students() {
        let assignment = TutorAssignment::new(4, 2, 2).expect("valid");
        assert_eq!(assignment.tutor_of(&Node::student(3)), Ok(Node::tutor(1)));
        assert_eq!(
            assignment.tutor_of(&Node::tutor(0)),
            Err(EscalationError::NotAStudent(NodeId::tutor(0)))
        );
    }

    #[test]
    fn origin_selection_is_seeded() {
        let nodes: Vec<Node> = (0..10).map(Node::student).collect();
        let students: Vec<&Node> = nodes.iter().collect();

        let a = select_origin(&students, &mut StdRng::seed_from_u64(5)).expect("origin");
        let b = select_origin(&students, &mut StdRng::seed_from_u64(5)).expect("origin");
        assert_eq!(a, b);

        let none: Vec<&Node> = Vec::new();
        assert_eq!(
            select_origin(&none, &mut StdRng::seed_from_u64(5)),
            Err(EscalationError::NoStudents)
        );
    }
}
