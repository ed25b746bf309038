//! whistle-sim library.
//!
//! Runs many independently seeded simulations and checks every run against
//! an invariant oracle (distance-table laws, engine agreement, generator
//! degree bounds, escalation arithmetic).
//!
//! Each seed builds its own [`whistle_core::Scenario`]; nothing is shared
//! between seeds.
//!
//! # Conventions
//!
//! - **Errors**: Use `anyhow::Result` for return types.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod campaign;
pub mod oracle;

pub use campaign::{CampaignConfig, CampaignReport, SeedRun, replay_seed, run_campaign};
pub use oracle::{InvariantViolation, OracleResult, PropagationOracle};
