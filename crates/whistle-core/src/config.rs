use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::graph::NodeId;

/// Parameters of one simulation run.
///
/// Loaded from TOML (`whistle.toml`); every key is optional and falls back
/// to the defaults below.
///
/// ```toml
/// student_count = 100
/// tutor_count = 5
/// friendship_degree = 5
/// director_id = "D105"
/// tutor_block_size = 20
/// random_seed = 42
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_student_count")]
    pub student_count: usize,
    #[serde(default = "default_tutor_count")]
    pub tutor_count: usize,
    /// Candidate friends drawn per student.
    #[serde(default = "default_friendship_degree")]
    pub friendship_degree: usize,
    #[serde(default = "default_director_id")]
    pub director_id: String,
    /// Contiguous students per tutor: student `i` reports to tutor `i / block`.
    #[serde(default = "default_tutor_block_size")]
    pub tutor_block_size: usize,
    /// Seed for reproducible runs. `None` seeds from OS entropy.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            student_count: default_student_count(),
            tutor_count: default_tutor_count(),
            friendship_degree: default_friendship_degree(),
            director_id: default_director_id(),
            tutor_block_size: default_tutor_block_size(),
            random_seed: None,
        }
    }
}

impl SimulationConfig {
    /// Identifier of the director node.
    #[must_use]
    pub fn director(&self) -> NodeId {
        NodeId::new(self.director_id.clone())
    }

    /// Validate configuration before running.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if self.student_count == 0 {
            bail!("student_count must be > 0");
        }
        if self.tutor_count == 0 {
            bail!("tutor_count must be > 0");
        }
        if self.friendship_degree == 0 || self.friendship_degree >= self.student_count {
            bail!(
                "friendship_degree must be in 1..{} (got {})",
                self.student_count,
                self.friendship_degree
            );
        }
        if self.tutor_block_size == 0 {
            bail!("tutor_block_size must be > 0");
        }
        if self.tutor_count.saturating_mul(self.tutor_block_size) < self.student_count {
            bail!(
                "{} tutors with blocks of {} cannot cover {} students",
                self.tutor_count,
                self.tutor_block_size,
                self.student_count
            );
        }
        if self.director_id.trim().is_empty() {
            bail!("director_id must not be empty");
        }
        Ok(())
    }
}

/// Parse a config from TOML text.
///
/// # Errors
///
/// Returns an error if the text is not valid TOML for [`SimulationConfig`].
pub fn parse_config(content: &str) -> Result<SimulationConfig> {
    toml::from_str::<SimulationConfig>(content).context("Failed to parse simulation config")
}

/// Load a config file, falling back to defaults when it does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(path: &Path) -> Result<SimulationConfig> {
    if !path.exists() {
        return Ok(SimulationConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<SimulationConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

const fn default_student_count() -> usize {
    100
}

const fn default_tutor_count() -> usize {
    5
}

const fn default_friendship_degree() -> usize {
    5
}

fn default_director_id() -> String {
    "D105".to_string()
}

const fn default_tutor_block_size() -> usize {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = SimulationConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.student_count, 100);
        assert_eq!(cfg.tutor_count, 5);
        assert_eq!(cfg.friendship_degree, 5);
        assert_eq!(cfg.tutor_block_size, 20);
        assert_eq!(cfg.director(), NodeId::new("D105"));
        assert_eq!(cfg.random_seed, None);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg = parse_config("student_count = 12\nrandom_seed = 7\n").expect("parse");
        assert_eq!(cfg.student_count, 12);
        assert_eq!(cfg.random_seed, Some(7));
        assert_eq!(cfg.tutor_count, 5);
        assert_eq!(cfg.director_id, "D105");
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(parse_config("student_count = \"many\"").is_err());
    }

    #[test]
    fn degree_must_be_below_population() {
        let cfg = SimulationConfig {
            student_count: 5,
            friendship_degree: 5,
            tutor_block_size: 1,
            ..SimulationConfig::default()
        };
        let err = cfg.validate().expect_err("degree too large");
        assert!(err.to_string().contains("friendship_degree"));

        let cfg = SimulationConfig {
            friendship_degree: 0,
            ..SimulationConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_counts_rejected() {
        for cfg in [
            SimulationConfig {
                student_count: 0,
                ..SimulationConfig::default()
            },
            SimulationConfig {
                tutor_count: 0,
                ..SimulationConfig::default()
            },
            SimulationConfig {
                tutor_block_size: 0,
                ..SimulationConfig::default()
            },
        ] {
            assert!(cfg.validate().is_err(), "{cfg:?} should be rejected");
        }
    }

    #[test]
    fn tutors_must_cover_every_block() {
        let cfg = SimulationConfig {
            tutor_count: 4,
            ..SimulationConfig::default()
        };
        let err = cfg.validate().expect_err("80 < 100");
        assert!(err.to_string().contains("cannot cover"));
    }

    #[test]
    fn blank_director_rejected() {
        let cfg = SimulationConfig {
            director_id: "  ".to_string(),
            ..SimulationConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&dir.path().join("whistle.toml")).expect("load");
        assert_eq!(cfg, SimulationConfig::default());
    }

    #[test]
    fn file_is_loaded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("whistle.toml");
        std::fs::write(&path, "tutor_count = 10\ntutor_block_size = 10\ndirector_id = \"HEAD\"\n")
            .expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.tutor_count, 10);
        assert_eq!(cfg.director_id, "HEAD");
        assert!(cfg.validate().is_ok());
    }
}
