use whistle_core::Scenario;
use whistle_core::escalation::time_to_director;
use whistle_core::graph::NodeId;
use whistle_core::propagation::{Distance, bfs_all_pairs, floyd_warshall};
use whistle_core::report::{PropagationRow, Report};

// ── Core result types ─────────────────────────────────────────────────────────

/// Oracle result for an invariant check.
///
/// Returned by each checker and by [`PropagationOracle::check_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleResult {
    /// `true` iff no violations were found.
    pub passed: bool,
    /// Detailed description of every invariant that was violated.
    pub violations: Vec<InvariantViolation>,
}

impl OracleResult {
    /// Construct a passing result.
    #[must_use]
    const fn pass() -> Self {
        Self {
            passed: true,
            violations: Vec::new(),
        }
    }

    /// Construct a result from collected violations (passing if empty).
    #[must_use]
    fn from_violations(violations: Vec<InvariantViolation>) -> Self {
        Self {
            passed: violations.is_empty(),
            violations,
        }
    }

    /// Merge another result into this one (failures accumulate).
    #[must_use]
    fn merge(mut self, other: Self) -> Self {
        if !other.passed {
            self.passed = false;
            self.violations.extend(other.violations);
        }
        self
    }
}

// ── Invariant violation diagnostics ──────────────────────────────────────────

/// Diagnostic information for a single failed invariant check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// `distance(x, x) != 0`.
    NonZeroDiagonal { node: NodeId, distance: Distance },

    /// `distance(a, b) != distance(b, a)`.
    Asymmetric {
        a: NodeId,
        b: NodeId,
        forward: Distance,
        backward: Distance,
    },

    /// `distance(x, z) > distance(x, y) + distance(y, z)` with both legs finite.
    TriangleInequality {
        x: NodeId,
        y: NodeId,
        z: NodeId,
        direct: Distance,
        via: Distance,
    },

    /// BFS and Floyd–Warshall disagree on a pair.
    EngineMismatch {
        a: NodeId,
        b: NodeId,
        bfs: Distance,
        floyd: Distance,
    },

    /// A student ended up with fewer friends than it picked.
    DegreeBelowRequested {
        student: NodeId,
        degree: usize,
        requested: usize,
    },

    /// The origin appears in its own propagation table.
    OriginInformed { origin: NodeId },

    /// The propagation table is not sorted by (time, student index).
    UnsortedPropagation { position: usize },

    /// Records exist but no fastest informant was reported.
    NoFastestInformant,

    /// A fastest informant does not hold the minimal time.
    FastestNotMinimal {
        student: NodeId,
        time_informed: u64,
        minimal_time: u64,
    },

    /// `time_to_director != minimal_time + 2`.
    DirectorTime {
        minimal_time: u64,
        time_to_director: u64,
    },

    /// Assigning the same student twice gave different tutors, or none.
    UnstableAssignment { student_index: usize },
}

// ── Oracle ───────────────────────────────────────────────────────────────────

/// Invariant checks over one built scenario and (optionally) its report.
pub struct PropagationOracle;

impl PropagationOracle {
    /// Run every checker. `report` is `None` when the origin was isolated.
    #[must_use]
    pub fn check_all(scenario: &Scenario, report: Option<&Report>) -> OracleResult {
        let result = Self::check_distance_laws(scenario)
            .merge(Self::check_engines(scenario))
            .merge(Self::check_degrees(scenario))
            .merge(Self::check_assignment(scenario));
        match report {
            Some(report) => result.merge(Self::check_report(report)),
            None => result,
        }
    }

    /// Zero diagonal, symmetry and the triangle inequality.
    #[must_use]
    pub fn check_distance_laws(scenario: &Scenario) -> OracleResult {
        let table = scenario.distances();
        let ids = table.ids();
        let mut violations = Vec::new();

        for x in ids {
            let d = table.get(x, x).unwrap_or(Distance::INFINITE);
            if d != Distance::ZERO {
                violations.push(InvariantViolation::NonZeroDiagonal {
                    node: x.clone(),
                    distance: d,
                });
            }
        }

        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                let forward = table.get(a, b).unwrap_or(Distance::INFINITE);
                let backward = table.get(b, a).unwrap_or(Distance::INFINITE);
                if forward != backward {
                    violations.push(InvariantViolation::Asymmetric {
                        a: a.clone(),
                        b: b.clone(),
                        forward,
                        backward,
                    });
                }
            }
        }

        let rows: Vec<Vec<Distance>> = ids
            .iter()
            .map(|a| {
                ids.iter()
                    .map(|b| table.get(a, b).unwrap_or(Distance::INFINITE))
                    .collect()
            })
            .collect();
        for (x, row_x) in rows.iter().enumerate() {
            for (y, &xy) in row_x.iter().enumerate() {
                if !xy.is_finite() {
                    continue;
                }
                for (z, &yz) in rows[y].iter().enumerate() {
                    let via = xy.plus(yz);
                    if yz.is_finite() && row_x[z] > via {
                        violations.push(InvariantViolation::TriangleInequality {
                            x: ids[x].clone(),
                            y: ids[y].clone(),
                            z: ids[z].clone(),
                            direct: row_x[z],
                            via,
                        });
                    }
                }
            }
        }

        OracleResult::from_violations(violations)
    }

    /// BFS-per-source and Floyd–Warshall must agree on every pair.
    #[must_use]
    pub fn check_engines(scenario: &Scenario) -> OracleResult {
        let bfs = bfs_all_pairs(scenario.graph());
        let floyd = floyd_warshall(scenario.graph());
        if bfs == floyd {
            return OracleResult::pass();
        }

        let mut violations = Vec::new();
        for a in bfs.ids() {
            for b in bfs.ids() {
                let lhs = bfs.get(a, b).unwrap_or(Distance::INFINITE);
                let rhs = floyd.get(a, b).unwrap_or(Distance::INFINITE);
                if lhs != rhs {
                    violations.push(InvariantViolation::EngineMismatch {
                        a: a.clone(),
                        b: b.clone(),
                        bfs: lhs,
                        floyd: rhs,
                    });
                }
            }
        }
        OracleResult::from_violations(violations)
    }

    /// Every student has at least `friendship_degree` friends.
    #[must_use]
    pub fn check_degrees(scenario: &Scenario) -> OracleResult {
        let requested = scenario.config().friendship_degree;
        let violations = scenario
            .graph()
            .students()
            .into_iter()
            .filter_map(|student| {
                let degree = scenario.graph().degree(&student.id).unwrap_or(0);
                (degree < requested).then(|| InvariantViolation::DegreeBelowRequested {
                    student: student.id.clone(),
                    degree,
                    requested,
                })
            })
            .collect();
        OracleResult::from_violations(violations)
    }

    /// Tutor assignment is total over the population and repeatable.
    #[must_use]
    pub fn check_assignment(scenario: &Scenario) -> OracleResult {
        let assignment = scenario.assignment();
        let violations = (0..scenario.config().student_count)
            .filter(|&i| match (assignment.assign(i), assignment.assign(i)) {
                (Ok(first), Ok(second)) => first != second,
                _ => true,
            })
            .map(|student_index| InvariantViolation::UnstableAssignment { student_index })
            .collect();
        OracleResult::from_violations(violations)
    }

    /// Table ordering, fastest-informant and director-time arithmetic.
    #[must_use]
    pub fn check_report(report: &Report) -> OracleResult {
        let mut violations = Vec::new();

        if report
            .propagation
            .iter()
            .any(|row| row.student == report.origin)
        {
            violations.push(InvariantViolation::OriginInformed {
                origin: report.origin.clone(),
            });
        }

        let key = |row: &PropagationRow| (row.time_informed, row.student_index);
        for (position, pair) in report.propagation.windows(2).enumerate() {
            if key(&pair[0]) >= key(&pair[1]) {
                violations.push(InvariantViolation::UnsortedPropagation { position });
            }
        }

        if !report.propagation.is_empty() && report.fastest_informants.is_empty() {
            violations.push(InvariantViolation::NoFastestInformant);
        }

        let true_min = report.propagation.iter().map(|row| row.time_informed).min();
        for row in &report.fastest_informants {
            if Some(row.time_informed) != true_min || row.time_informed != report.minimal_time {
                violations.push(InvariantViolation::FastestNotMinimal {
                    student: row.student.clone(),
                    time_informed: row.time_informed,
                    minimal_time: report.minimal_time,
                });
            }
        }

        if report.time_to_director != time_to_director(report.minimal_time)
            || report.time_to_director != report.minimal_time + 2
        {
            violations.push(InvariantViolation::DirectorTime {
                minimal_time: report.minimal_time,
                time_to_director: report.time_to_director,
            });
        }

        OracleResult::from_violations(violations)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
