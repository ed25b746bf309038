//! Campaign runner for seeded simulation campaigns.
//!
//! Builds one school per seed, resolves a random origin, and checks every
//! invariant the oracle knows about. The first failing seed is recorded
//! for replay.

use std::collections::BTreeMap;
use std::ops::Range;

use anyhow::{Result, bail};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use whistle_core::graph::{NodeId, UniformOutDegree};
use whistle_core::{EscalationError, Report, Scenario, SimulationConfig};

use crate::oracle::{InvariantViolation, OracleResult, PropagationOracle};

/// Campaign-level configuration controlling how many seeds to run and
/// what school to build for each seed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignConfig {
    /// Range of seeds to execute, e.g., `0..100`.
    pub seed_range: Range<u64>,
    pub student_count: usize,
    pub tutor_count: usize,
    /// Candidate friends drawn per student.
    pub friendship_degree: usize,
    pub tutor_block_size: usize,
    pub director_id: String,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        let base = SimulationConfig::default();
        Self {
            seed_range: 0..100,
            student_count: base.student_count,
            tutor_count: base.tutor_count,
            friendship_degree: base.friendship_degree,
            tutor_block_size: base.tutor_block_size,
            director_id: base.director_id,
        }
    }
}

impl CampaignConfig {
    /// Build a [`SimulationConfig`] for a specific seed.
    #[must_use]
    pub fn sim_config_for_seed(&self, seed: u64) -> SimulationConfig {
        SimulationConfig {
            student_count: self.student_count,
            tutor_count: self.tutor_count,
            friendship_degree: self.friendship_degree,
            director_id: self.director_id.clone(),
            tutor_block_size: self.tutor_block_size,
            random_seed: Some(seed),
        }
    }

    /// Validate configuration before running.
    ///
    /// # Errors
    ///
    /// Returns an error if the seed range is empty or the per-seed school
    /// configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.seed_range.is_empty() {
            bail!("seed_range must not be empty");
        }
        self.sim_config_for_seed(self.seed_range.start).validate()
    }
}

/// Failure details for a single seed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedFailure {
    /// The seed that failed.
    pub seed: u64,
    /// Invariant violations found.
    pub violations: Vec<String>,
}

/// Aggregate report produced by a campaign run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignReport {
    /// Total seeds executed.
    pub seeds_run: usize,
    /// Seeds that passed all invariants.
    pub seeds_passed: usize,
    /// First seed that failed (for prioritized replay).
    pub first_failure: Option<u64>,
    /// All seed failures with violation details.
    pub failures: Vec<SeedFailure>,
    /// Seeds whose origin had no friendship path to anyone.
    pub isolated_origins: usize,
    /// Minimal time → number of seeds that resolved with it.
    pub minimal_time_histogram: BTreeMap<u64, usize>,
    /// Mean director time over resolved seeds, `None` if none resolved.
    pub mean_time_to_director: Option<f64>,
    /// Largest friendship degree seen in any school.
    pub max_degree: usize,
}

impl CampaignReport {
    /// True if every seed passed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Everything produced by running one seed.
#[derive(Debug, Clone)]
pub struct SeedRun {
    pub seed: u64,
    /// The randomly picked origin.
    pub origin: NodeId,
    /// `None` when the origin was isolated.
    pub report: Option<Report>,
    /// Oracle check result with violation details.
    pub oracle: OracleResult,
    /// Content hash of the friendship graph; equal seeds give equal hashes.
    pub content_hash: String,
    pub max_degree: usize,
}

/// Run a full campaign across all seeds in the config.
///
/// # Errors
///
/// Returns an error if config validation fails or a seed hits an error
/// other than an isolated origin.
pub fn run_campaign(config: &CampaignConfig) -> Result<CampaignReport> {
    config.validate()?;

    let mut seeds_run = 0_usize;
    let mut seeds_passed = 0_usize;
    let mut first_failure: Option<u64> = None;
    let mut failures = Vec::new();
    let mut isolated_origins = 0_usize;
    let mut minimal_time_histogram = BTreeMap::new();
    let mut director_total = 0_u64;
    let mut max_degree = 0_usize;

    for seed in config.seed_range.clone() {
        seeds_run += 1;
        let run = run_seed(seed, config)?;
        max_degree = max_degree.max(run.max_degree);

        match &run.report {
            Some(report) => {
                *minimal_time_histogram
                    .entry(report.minimal_time)
                    .or_insert(0) += 1;
                director_total += report.time_to_director;
            }
            None => isolated_origins += 1,
        }

        if run.oracle.passed {
            seeds_passed += 1;
        } else {
            if first_failure.is_none() {
                first_failure = Some(seed);
            }
            failures.push(SeedFailure {
                seed,
                violations: run.oracle.violations.iter().map(format_violation).collect(),
            });
        }
    }

    let resolved = seeds_run - isolated_origins;
    #[allow(clippy::cast_precision_loss)]
    let mean_time_to_director = (resolved > 0).then(|| director_total as f64 / resolved as f64);

    info!(
        seeds_run,
        seeds_passed,
        isolated_origins,
        first_failure = ?first_failure,
        "campaign finished"
    );

    Ok(CampaignReport {
        seeds_run,
        seeds_passed,
        first_failure,
        failures,
        isolated_origins,
        minimal_time_histogram,
        mean_time_to_director,
        max_degree,
    })
}

/// Replay a single seed with full details for debugging.
///
/// # Errors
///
/// Returns an error when config validation or the build fails.
pub fn replay_seed(seed: u64, config: &CampaignConfig) -> Result<SeedRun> {
    config.validate()?;
    run_seed(seed, config)
}

/// One seeded run. The same RNG builds the school and then picks the origin.
fn run_seed(seed: u64, config: &CampaignConfig) -> Result<SeedRun> {
    let sim_config = config.sim_config_for_seed(seed);
    let source = UniformOutDegree {
        degree: sim_config.friendship_degree,
    };
    let mut rng = StdRng::seed_from_u64(seed);
    let scenario = Scenario::build(&sim_config, &source, &mut rng)?;
    let origin = scenario.pick_origin(&mut rng)?;

    let report = match scenario.resolve(&origin) {
        Ok(report) => Some(report),
        Err(EscalationError::EmptyPropagation) => {
            debug!(seed, origin = %origin, "isolated origin");
            None
        }
        Err(e) => return Err(e.into()),
    };

    let oracle = PropagationOracle::check_all(&scenario, report.as_ref());
    let graph = scenario.graph();
    let max_degree = graph
        .students()
        .iter()
        .filter_map(|s| graph.degree(&s.id).ok())
        .max()
        .unwrap_or(0);

    Ok(SeedRun {
        seed,
        origin,
        report,
        oracle,
        content_hash: graph.content_hash(),
        max_degree,
    })
}

/// Format an invariant violation into a human-readable string.
fn format_violation(v: &InvariantViolation) -> String {
    match v {
        InvariantViolation::NonZeroDiagonal { node, distance } => {
            format!("NonZeroDiagonal: distance({node}, {node}) = {distance}")
        }
        InvariantViolation::Asymmetric {
            a,
            b,
            forward,
            backward,
        } => format!("Asymmetric: {a}->{b} = {forward} but {b}->{a} = {backward}"),
        InvariantViolation::TriangleInequality {
            x,
            y,
            z,
            direct,
            via,
        } => format!("TriangleInequality: {x}->{z} = {direct} exceeds {x}->{y}->{z} = {via}"),
        InvariantViolation::EngineMismatch { a, b, bfs, floyd } => {
            format!("EngineMismatch: {a}->{b} bfs={bfs} floyd={floyd}")
        }
        InvariantViolation::DegreeBelowRequested {
            student,
            degree,
            requested,
        } => format!(
            "DegreeBelowRequested: {student} has {degree} friends, expected >= {requested}"
        ),
        InvariantViolation::OriginInformed { origin } => {
            format!("OriginInformed: origin {origin} listed in its own propagation table")
        }
        InvariantViolation::UnsortedPropagation { position } => {
            format!("UnsortedPropagation: rows {position} and {} out of order", position + 1)
        }
        InvariantViolation::NoFastestInformant => {
            "NoFastestInformant: records exist but none is fastest".to_string()
        }
        InvariantViolation::FastestNotMinimal {
            student,
            time_informed,
            minimal_time,
        } => format!(
            "FastestNotMinimal: {student} informed at {time_informed}, minimal time is {minimal_time}"
        ),
        InvariantViolation::DirectorTime {
            minimal_time,
            time_to_director,
        } => format!(
            "DirectorTime: minimal time {minimal_time} but director informed at {time_to_director}"
        ),
        InvariantViolation::UnstableAssignment { student_index } => {
            format!("UnstableAssignment: student index {student_index}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> CampaignConfig {
        CampaignConfig {
            seed_range: 0..10,
            student_count: 30,
            tutor_count: 3,
            friendship_degree: 3,
            tutor_block_size: 10,
            ..CampaignConfig::default()
        }
    }

    #[test]
    fn campaign_config_default_is_valid() {
        let config = CampaignConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn campaign_config_empty_seed_range_rejected() {
        let config = CampaignConfig {
            seed_range: 5..5,
            ..CampaignConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn campaign_config_uncovered_students_rejected() {
        let config = CampaignConfig {
            tutor_count: 1,
            ..CampaignConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn sim_config_for_seed_uses_correct_seed() {
        let config = CampaignConfig::default();
        let sim = config.sim_config_for_seed(42);
        assert_eq!(sim.random_seed, Some(42));
        assert_eq!(sim.student_count, config.student_count);
        assert_eq!(sim.friendship_degree, config.friendship_degree);
    }

    #[test]
    fn run_campaign_all_seeds_pass() {
        let report = run_campaign(&small()).expect("campaign should not error");
        assert_eq!(report.seeds_run, 10);
        assert_eq!(report.seeds_passed, 10);
        assert!(report.all_passed());
        assert!(report.first_failure.is_none());
        assert!(report.max_degree >= 3);
    }

    #[test]
    fn run_campaign_100_seeds_pass() {
        let report = run_campaign(&CampaignConfig::default()).expect("campaign should not error");
        assert_eq!(report.seeds_run, 100);
        assert!(
            report.all_passed(),
            "campaign failed: {} failures, first at seed {:?}",
            report.failures.len(),
            report.first_failure,
        );
        // Out-degree 5 over 100 students leaves nobody isolated.
        assert_eq!(report.isolated_origins, 0);
        let resolved: usize = report.minimal_time_histogram.values().sum();
        assert_eq!(resolved, 100);
        let mean = report.mean_time_to_director.expect("some seeds resolved");
        assert!(mean >= 3.0);
    }

    #[test]
    fn replay_is_deterministic() {
        let config = small();
        let first = replay_seed(7, &config).expect("replay 1");
        let second = replay_seed(7, &config).expect("replay 2");

        assert_eq!(first.content_hash, second.content_hash);
        assert_eq!(first.origin, second.origin);
        let (a, b) = (first.report.expect("report"), second.report.expect("report"));
        assert_eq!(a.propagation, b.propagation);
        assert_eq!(a.fastest_informants, b.fastest_informants);
    }

    #[test]
    fn different_seeds_build_different_schools() {
        let config = small();
        let a = replay_seed(1, &config).expect("seed 1");
        let b = replay_seed(2, &config).expect("seed 2");
        assert_ne!(a.content_hash, b.content_hash);
    }

    #[test]
    fn replayed_seed_passes_oracle() {
        let run = replay_seed(42, &small()).expect("replay should not error");
        assert!(run.oracle.passed, "oracle should pass: {:?}", run.oracle.violations);
        let report = run.report.expect("degree 3 leaves nobody isolated");
        assert_eq!(report.time_to_director, report.minimal_time + 2);
    }

    #[test]
    fn campaign_report_serializes_to_json() {
        let report = CampaignReport {
            seeds_run: 10,
            seeds_passed: 9,
            first_failure: Some(7),
            failures: vec![SeedFailure {
                seed: 7,
                violations: vec!["DirectorTime: minimal time 1 but director informed at 4".into()],
            }],
            isolated_origins: 0,
            minimal_time_histogram: BTreeMap::from([(1, 10)]),
            mean_time_to_director: Some(3.0),
            max_degree: 12,
        };
        let json = serde_json::to_string(&report).expect("serialize");
        assert!(json.contains("\"seeds_run\":10"));
        assert!(json.contains("\"first_failure\":7"));
        assert!(json.contains("\"minimal_time_histogram\":{\"1\":10}"));
    }

    #[test]
    fn format_violation_names_the_invariant() {
        let text = format_violation(&InvariantViolation::UnsortedPropagation { position: 3 });
        assert!(text.starts_with("UnsortedPropagation"));
        assert!(text.contains("3 and 4"));
    }
}
