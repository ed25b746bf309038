//! `whistle campaign` - seeded simulation campaign commands.
//!
//! `whistle campaign run` - execute a campaign across many seeds.
//! `whistle campaign replay` - replay a single seed with full details.

use std::process;

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;
use whistle_sim::CampaignConfig;

use crate::output::{OutputMode, pretty_kv, pretty_section};

/// Top-level arguments for `whistle campaign`.
#[derive(Args, Debug)]
pub struct CampaignArgs {
    #[command(subcommand)]
    pub command: CampaignCommand,
}

/// Campaign subcommands.
#[derive(Subcommand, Debug)]
pub enum CampaignCommand {
    #[command(
        about = "Run a simulation campaign across multiple seeds",
        long_about = "Build one school per seed, resolve a random origin, and check every\n\
                      invariant. Reports pass/fail per seed and identifies the first failure\n\
                      for replay.",
        after_help = "EXAMPLES:\n    # Run 100 seeds with defaults\n    whistle campaign run --seeds 100\n\n\
                      # Smaller, sparser schools\n    whistle campaign run --seeds 500 --students 30 --degree 2 --block-size 10 --tutors 3\n\n\
                      # Machine-readable output\n    whistle campaign run --format json"
    )]
    Run(CampaignRunArgs),

    #[command(
        about = "Replay a single seed",
        long_about = "Replay a specific seed to get its origin, graph hash, oracle result,\n\
                      and violation details. Use after a campaign failure to debug.",
        after_help = "EXAMPLES:\n    # Replay seed 42\n    whistle campaign replay --seed 42"
    )]
    Replay(CampaignReplayArgs),
}

/// School parameters shared by `run` and `replay`.
#[derive(Args, Debug, Clone)]
pub struct SchoolArgs {
    #[arg(long, default_value = "100")]
    pub students: usize,

    #[arg(long, default_value = "5")]
    pub tutors: usize,

    /// Friends drawn per student.
    #[arg(long, default_value = "5")]
    pub degree: usize,

    /// Students per tutor block.
    #[arg(long, default_value = "20")]
    pub block_size: usize,

    #[arg(long, default_value = "D105")]
    pub director: String,
}

/// Arguments for `whistle campaign run`.
#[derive(Args, Debug)]
pub struct CampaignRunArgs {
    /// Number of seeds to run.
    #[arg(long, default_value = "100")]
    pub seeds: u64,

    /// Starting seed value.
    #[arg(long, default_value = "0")]
    pub seed_start: u64,

    #[command(flatten)]
    pub school: SchoolArgs,
}

/// Arguments for `whistle campaign replay`.
#[derive(Args, Debug)]
pub struct CampaignReplayArgs {
    /// Seed to replay.
    #[arg(long)]
    pub seed: u64,

    #[command(flatten)]
    pub school: SchoolArgs,
}

/// JSON output for `whistle campaign run`.
#[derive(Debug, Serialize)]
struct RunOutput {
    seeds_run: usize,
    seeds_passed: usize,
    seeds_failed: usize,
    first_failure: Option<u64>,
    isolated_origins: usize,
    mean_time_to_director: Option<f64>,
    max_degree: usize,
    minimal_time_histogram: Vec<(u64, usize)>,
    all_passed: bool,
    failures: Vec<FailureOutput>,
}

#[derive(Debug, Serialize)]
struct FailureOutput {
    seed: u64,
    violations: Vec<String>,
}

/// JSON output for `whistle campaign replay`.
#[derive(Debug, Serialize)]
struct ReplayOutput {
    seed: u64,
    origin: String,
    isolated: bool,
    minimal_time: Option<u64>,
    time_to_director: Option<u64>,
    informed: usize,
    content_hash: String,
    max_degree: usize,
    oracle_passed: bool,
    violations: Vec<String>,
}

fn build_campaign_config(seed_start: u64, seeds: u64, school: &SchoolArgs) -> CampaignConfig {
    CampaignConfig {
        seed_range: seed_start..seed_start.saturating_add(seeds),
        student_count: school.students,
        tutor_count: school.tutors,
        friendship_degree: school.degree,
        tutor_block_size: school.block_size,
        director_id: school.director.clone(),
    }
}

/// Dispatch `whistle campaign`.
pub fn run_campaign_cmd(args: &CampaignArgs, output: OutputMode) -> Result<()> {
    match &args.command {
        CampaignCommand::Run(run) => run_campaign_run(run, output),
        CampaignCommand::Replay(replay) => run_campaign_replay(replay, output),
    }
}

/// Execute `whistle campaign run`.
fn run_campaign_run(args: &CampaignRunArgs, output: OutputMode) -> Result<()> {
    let config = build_campaign_config(args.seed_start, args.seeds, &args.school);
    let report = whistle_sim::run_campaign(&config)?;

    let out = RunOutput {
        seeds_run: report.seeds_run,
        seeds_passed: report.seeds_passed,
        seeds_failed: report.failures.len(),
        first_failure: report.first_failure,
        isolated_origins: report.isolated_origins,
        mean_time_to_director: report.mean_time_to_director,
        max_degree: report.max_degree,
        minimal_time_histogram: report
            .minimal_time_histogram
            .iter()
            .map(|(&time, &count)| (time, count))
            .collect(),
        all_passed: report.all_passed(),
        failures: report
            .failures
            .iter()
            .map(|f| FailureOutput {
                seed: f.seed,
                violations: f.violations.clone(),
            })
            .collect(),
    };

    match output {
        OutputMode::Json => {
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputMode::Text => {
            println!(
                "campaign seeds_run={} students={} degree={}",
                out.seeds_run, args.school.students, args.school.degree
            );
            println!(
                "results passed={} failed={} isolated_origins={} max_degree={} all_passed={}",
                out.seeds_passed,
                out.seeds_failed,
                out.isolated_origins,
                out.max_degree,
                out.all_passed
            );
            for (time, count) in &out.minimal_time_histogram {
                println!("minimal_time value={time} seeds={count}");
            }
            if !out.all_passed {
                for failure in out.failures.iter().take(5) {
                    println!(
                        "failure seed={} violations={}",
                        failure.seed,
                        failure.violations.len()
                    );
                }
                if out.failures.len() > 5 {
                    println!("failures_truncated count={}", out.failures.len() - 5);
                }
                println!("hint replay_seed={}", out.first_failure.unwrap_or(0));
            }
        }
        OutputMode::Pretty => {
            let stdout = std::io::stdout();
            let mut w = stdout.lock();
            pretty_section(&mut w, "Simulation Campaign")?;
            pretty_kv(&mut w, "Seeds", out.seeds_run.to_string())?;
            pretty_kv(&mut w, "Students", args.school.students.to_string())?;
            pretty_kv(&mut w, "Degree", args.school.degree.to_string())?;
            pretty_kv(
                &mut w,
                "Results",
                format!(
                    "{} passed / {} failed ({} isolated origins)",
                    out.seeds_passed, out.seeds_failed, out.isolated_origins
                ),
            )?;
            pretty_kv(&mut w, "Max degree", out.max_degree.to_string())?;
            if let Some(mean) = out.mean_time_to_director {
                pretty_kv(&mut w, "Mean director time", format!("{mean:.2}"))?;
            }
            let histogram = out
                .minimal_time_histogram
                .iter()
                .map(|(time, count)| format!("{time}:{count}"))
                .collect::<Vec<_>>()
                .join(" ");
            pretty_kv(&mut w, "Minimal times", histogram)?;

            if out.all_passed {
                pretty_kv(&mut w, "Status", "all seeds passed")?;
            } else {
                pretty_kv(
                    &mut w,
                    "Status",
                    format!(
                        "{} failures (first at seed {})",
                        out.seeds_failed,
                        out.first_failure.unwrap_or(0)
                    ),
                )?;
                println!();
                pretty_section(&mut w, "Failure Samples")?;
                for failure in out.failures.iter().take(5) {
                    println!("seed {:<8} violations={}", failure.seed, failure.violations.len());
                    for violation in &failure.violations {
                        println!("  - {violation}");
                    }
                }
                if out.failures.len() > 5 {
                    println!("... and {} more failures", out.failures.len() - 5);
                }
                println!();
                pretty_kv(
                    &mut w,
                    "Replay",
                    format!(
                        "whistle campaign replay --seed {} --students {} --degree {}",
                        out.first_failure.unwrap_or(0),
                        args.school.students,
                        args.school.degree
                    ),
                )?;
            }
        }
    }

    // Exit code 1 on any failure for CI integration
    if !report.all_passed() {
        process::exit(1);
    }

    Ok(())
}

/// Execute `whistle campaign replay`.
fn run_campaign_replay(args: &CampaignReplayArgs, output: OutputMode) -> Result<()> {
    let config = build_campaign_config(args.seed, 1, &args.school);
    let run = whistle_sim::replay_seed(args.seed, &config)?;

    let out = ReplayOutput {
        seed: run.seed,
        origin: run.origin.to_string(),
        isolated: run.report.is_none(),
        minimal_time: run.report.as_ref().map(|r| r.minimal_time),
        time_to_director: run.report.as_ref().map(|r| r.time_to_director),
        informed: run.report.as_ref().map_or(0, |r| r.propagation.len()),
        content_hash: run.content_hash.clone(),
        max_degree: run.max_degree,
        oracle_passed: run.oracle.passed,
        violations: run
            .oracle
            .violations
            .iter()
            .map(|v| format!("{v:?}"))
            .collect(),
    };

    match output {
        OutputMode::Json => {
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputMode::Text => {
            println!(
                "replay seed={} origin={} isolated={} informed={}",
                out.seed, out.origin, out.isolated, out.informed
            );
            println!(
                "result oracle_passed={} max_degree={} content_hash={}",
                out.oracle_passed, out.max_degree, out.content_hash
            );
            for violation in &out.violations {
                println!("violation={violation}");
            }
        }
        OutputMode::Pretty => {
            let stdout = std::io::stdout();
            let mut w = stdout.lock();
            pretty_section(&mut w, &format!("Replay Seed {}", out.seed))?;
            pretty_kv(&mut w, "Origin", &out.origin)?;
            pretty_kv(&mut w, "Informed", out.informed.to_string())?;
            if let (Some(min), Some(director)) = (out.minimal_time, out.time_to_director) {
                pretty_kv(&mut w, "Minimal time", min.to_string())?;
                pretty_kv(&mut w, "Time to director", director.to_string())?;
            } else {
                pretty_kv(&mut w, "Minimal time", "origin isolated")?;
            }
            pretty_kv(&mut w, "Max degree", out.max_degree.to_string())?;
            pretty_kv(&mut w, "Content hash", &out.content_hash)?;
            pretty_kv(&mut w, "Oracle", out.oracle_passed.to_string())?;

            if !out.oracle_passed {
                println!();
                pretty_section(&mut w, "Violations")?;
                for violation in &out.violations {
                    println!("  - {violation}");
                }
            }
        }
    }

    Ok(())
}
