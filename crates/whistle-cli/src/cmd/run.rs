//! `whistle run` - simulate one incident and report its escalation.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, warn};
use whistle_core::config::load_config;
use whistle_core::graph::{NodeId, UniformOutDegree};
use whistle_core::render::{LayeredPolicy, Renderer};
use whistle_core::report::{FastestInformantRow, PropagationRow};
use whistle_core::{EscalationError, Report, Scenario, SimulationConfig};

use crate::dot::DotRenderer;
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `whistle run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// TOML config file. Missing keys (or a missing file) take defaults.
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// RNG seed; overrides `random_seed` from the config.
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long)]
    pub students: Option<usize>,

    #[arg(long)]
    pub tutors: Option<usize>,

    /// Friends drawn per student.
    #[arg(long)]
    pub degree: Option<usize>,

    /// Students per tutor block.
    #[arg(long)]
    pub block_size: Option<usize>,

    #[arg(long)]
    pub director: Option<String>,

    /// Student where the incident happens, e.g. `A12`. Random if omitted.
    #[arg(long)]
    pub origin: Option<String>,

    /// Random origins to try before giving up when an origin has no friends.
    #[arg(
        long,
        default_value = "10",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub max_origin_attempts: u32,

    /// Rows of the propagation table to print (JSON always has all of them).
    #[arg(long, default_value = "12")]
    pub preview: usize,

    /// Write the escalation graph as Graphviz DOT to this path (`-` for stdout).
    #[arg(long, value_name = "PATH")]
    pub dot: Option<PathBuf>,
}

/// JSON output for `whistle run`.
#[derive(Debug, Serialize)]
struct RunOutput<'a> {
    seed: Option<u64>,
    origin_attempts: u32,
    #[serde(flatten)]
    report: &'a Report,
    /// DOT text, present only for `--dot -` so stdout stays one JSON document.
    #[serde(skip_serializing_if = "Option::is_none")]
    dot: Option<String>,
}

/// Execute `whistle run`.
pub fn run_run(args: &RunArgs, output: OutputMode) -> Result<()> {
    let config = resolve_config(args)?;
    let mut rng = match config.random_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let source = UniformOutDegree {
        degree: config.friendship_degree,
    };
    let scenario = Scenario::build(&config, &source, &mut rng)?;

    let (report, origin_attempts) = match &args.origin {
        Some(origin) => {
            let origin = NodeId::new(origin.as_str());
            let report = scenario
                .resolve(&origin)
                .with_context(|| format!("Failed to resolve escalation from {origin}"))?;
            (report, 1)
        }
        None => resolve_random_origin(&scenario, &mut rng, args.max_origin_attempts)?,
    };

    let mut stdout_dot = None;
    if let Some(path) = &args.dot {
        let dot = DotRenderer.render(&report.escalation, &LayeredPolicy::default())?;
        if path.as_os_str() == "-" {
            stdout_dot = Some(dot);
        } else {
            fs::write(path, dot)
                .with_context(|| format!("Failed to write DOT file {}", path.display()))?;
            debug!(path = %path.display(), "wrote escalation graph");
        }
    }

    // DOT on stdout replaces the human report; JSON carries it as a field.
    if output != OutputMode::Json {
        if let Some(dot) = &stdout_dot {
            print!("{dot}");
            return Ok(());
        }
    }

    let out = RunOutput {
        seed: config.random_seed,
        origin_attempts,
        report: &report,
        dot: stdout_dot,
    };
    let preview = args.preview;
    render_mode(
        output,
        &out,
        |out, w| write_text(out.report, preview, w),
        |out, w| write_pretty(out.report, preview, w),
    )
}

/// Load the config file (if any) and layer command-line overrides on top.
fn resolve_config(args: &RunArgs) -> Result<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => SimulationConfig::default(),
    };

    if let Some(seed) = args.seed {
        config.random_seed = Some(seed);
    }
    if let Some(students) = args.students {
        config.student_count = students;
    }
    if let Some(tutors) = args.tutors {
        config.tutor_count = tutors;
    }
    if let Some(degree) = args.degree {
        config.friendship_degree = degree;
    }
    if let Some(block) = args.block_size {
        config.tutor_block_size = block;
    }
    if let Some(director) = &args.director {
        config.director_id.clone_from(director);
    }

    config.validate()?;
    Ok(config)
}

/// Pick random origins until one has somebody to tell.
fn resolve_random_origin<R: Rng + ?Sized>(
    scenario: &Scenario,
    rng: &mut R,
    max_attempts: u32,
) -> Result<(Report, u32)> {
    for attempt in 1..=max_attempts {
        let origin = scenario.pick_origin(rng)?;
        match scenario.resolve(&origin) {
            Ok(report) => return Ok((report, attempt)),
            Err(EscalationError::EmptyPropagation) => {
                warn!(origin = %origin, attempt, "origin has no friends, picking another");
            }
            Err(e) => return Err(e.into()),
        }
    }
    bail!("no origin with reachable students after {max_attempts} attempts")
}

fn write_text(report: &Report, preview: usize, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(
        w,
        "incident origin={} informed={} minimal_time={} time_to_director={}",
        report.origin,
        report.propagation.len(),
        report.minimal_time,
        report.time_to_director
    )?;
    for PropagationRow {
        student,
        time_informed,
        ..
    } in report.preview(preview)
    {
        writeln!(w, "propagation student={student} time_informed={time_informed}")?;
    }
    for FastestInformantRow {
        student,
        time_informed,
        time_to_director,
    } in &report.fastest_informants
    {
        writeln!(
            w,
            "fastest student={student} time_informed={time_informed} time_to_director={time_to_director}"
        )?;
    }
    Ok(())
}

fn write_pretty(report: &Report, preview: usize, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, "Incident")?;
    pretty_kv(
        w,
        "Origin",
        format!("{} (cannot report it directly)", report.origin),
    )?;
    pretty_kv(w, "Informed", report.propagation.len().to_string())?;
    pretty_kv(w, "Minimal time", report.minimal_time.to_string())?;
    pretty_kv(w, "Time to director", report.time_to_director.to_string())?;
    writeln!(w)?;

    let rows = report.preview(preview);
    pretty_section(
        w,
        &format!("Propagation (first {} of {})", rows.len(), report.propagation.len()),
    )?;
    writeln!(w, "{:<10} {:>13}", "student", "time_informed")?;
    for row in rows {
        writeln!(w, "{:<10} {:>13}", row.student, row.time_informed)?;
    }
    writeln!(w)?;

    pretty_section(w, "Fastest Informants")?;
    writeln!(w, "{:<10} {:>13} {:>16}", "student", "time_informed", "time_to_director")?;
    for row in &report.fastest_informants {
        writeln!(
            w,
            "{:<10} {:>13} {:>16}",
            row.student, row.time_informed, row.time_to_director
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use whistle_core::graph::FixedFriendships;

    fn args() -> RunArgs {
        RunArgs {
            config: None,
            seed: None,
            students: None,
            tutors: None,
            degree: None,
            block_size: None,
            director: None,
            origin: None,
            max_origin_attempts: 10,
            preview: 12,
            dot: None,
        }
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("whistle.toml");
        fs::write(&path, "student_count = 40\ntutor_count = 2\nrandom_seed = 1\n").expect("write");

        let config = resolve_config(&RunArgs {
            config: Some(path),
            seed: Some(9),
            director: Some("HEAD".into()),
            ..args()
        })
        .expect("config");
        assert_eq!(config.student_count, 40);
        assert_eq!(config.tutor_count, 2);
        assert_eq!(config.random_seed, Some(9));
        assert_eq!(config.director_id, "HEAD");
    }

    #[test]
    fn invalid_overrides_rejected() {
        let result = resolve_config(&RunArgs {
            tutors: Some(1),
            ..args()
        });
        assert!(result.is_err());
    }

    #[test]
    fn retry_gives_up_when_every_origin_is_isolated() {
        let config = SimulationConfig {
            student_count: 4,
            tutor_count: 1,
            friendship_degree: 1,
            tutor_block_size: 4,
            ..SimulationConfig::default()
        };
        let source = FixedFriendships::new(Vec::new());
        let mut rng = StdRng::seed_from_u64(3);
        let scenario = Scenario::build(&config, &source, &mut rng).expect("build");

        let err = resolve_random_origin(&scenario, &mut rng, 3).expect_err("all isolated");
        assert!(err.to_string().contains("after 3 attempts"));
    }

    #[test]
    fn text_output_lists_preview_and_fastest() {
        let config = SimulationConfig {
            student_count: 6,
            tutor_count: 3,
            friendship_degree: 2,
            tutor_block_size: 2,
            ..SimulationConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(0);
        let scenario =
            Scenario::build(&config, &FixedFriendships::ring(6), &mut rng).expect("build");
        let report = scenario.resolve(&NodeId::student(0)).expect("resolve");

        let mut buf = Vec::new();
        write_text(&report, 2, &mut buf).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(
            text.starts_with("incident origin=A0 informed=5 minimal_time=1 time_to_director=3")
        );
        assert_eq!(text.matches("propagation ").count(), 2);
        assert!(text.contains("fastest student=A1 time_informed=1 time_to_director=3"));
        assert!(text.contains("fastest student=A5 time_informed=1 time_to_director=3"));
    }
}
