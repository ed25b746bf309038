#![forbid(unsafe_code)]
//! whistle-core library.
//!
//! Models how news of an incident spreads through a school's friendship
//! graph and how it escalates from the first students to hear about it,
//! through their tutor, to the director.
//!
//! ```text
//! FriendshipSource ──► GraphStore ──► DistanceTable
//!                                          │
//!                         escalation (records, fastest informants, tutors)
//!                                          │
//!                         Report ──► EscalationGraph ──► Renderer
//! ```
//!
//! # Conventions
//!
//! - **Errors**: Typed `thiserror` enums for graph and escalation failures
//!   ([`error`]); `anyhow::Result` for the pipeline and config loading.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod error;
pub mod escalation;
pub mod graph;
pub mod pipeline;
pub mod propagation;
pub mod render;
pub mod report;

pub use config::SimulationConfig;
pub use error::{EscalationError, GeneratorError, GraphError};
pub use graph::{LinkKind, Node, NodeId, NodeKind};
pub use pipeline::{Scenario, run_simulation};
pub use propagation::{Distance, DistanceTable};
pub use report::{EscalationGraph, Report};
