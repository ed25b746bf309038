#![forbid(unsafe_code)]

mod cmd;
mod dot;
mod output;

use std::env;

use clap::{Parser, Subcommand};
use output::{OutputMode, resolve_output_mode};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "whistle: incident propagation and escalation simulator",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Emit JSON output (alias for `--format json`).
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Simulate one incident",
        long_about = "Build a school, pick an origin student and report how the news reaches\n\
                      the director.",
        after_help = "EXAMPLES:\n    # Default school, random origin\n    whistle run\n\n\
                      # Reproducible run from a config file\n    whistle run --config whistle.toml --seed 7\n\n\
                      # Fixed origin, escalation graph as Graphviz DOT\n    whistle run --seed 7 --origin A12 --dot escalation.dot"
    )]
    Run(cmd::run::RunArgs),

    #[command(
        about = "Seeded simulation campaigns",
        long_about = "Run many seeded simulations and check every invariant on each one."
    )]
    Campaign(cmd::campaign::CampaignArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("WHISTLE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "whistle=debug,info"
        } else {
            "whistle=info,warn"
        })
    });

    let format = env::var("WHISTLE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_ansi(false)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let output = resolve_output_mode(cli.format, cli.json);

    match cli.command {
        Commands::Run(ref args) => cmd::run::run_run(args, output),
        Commands::Campaign(ref args) => cmd::campaign::run_campaign_cmd(args, output),
    }
}
