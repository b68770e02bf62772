//! Configuration system for RotaForge.
//!
//! Load engine configuration from TOML or YAML to control validation retries,
//! solver determinism, relaxation and sandbox limits without code changes.
//!
//! # Examples
//!
//! Load configuration from a TOML string:
//!
//! ```
//! use rotaforge_config::EngineConfig;
//! use std::time::Duration;
//!
//! let config = EngineConfig::from_toml_str(r#"
//!     [validation]
//!     max_attempts = 5
//!
//!     [solver]
//!     time_limit_secs = 30
//!
//!     [relaxation]
//!     minimize_original = true
//! "#).unwrap();
//!
//! assert_eq!(config.validation.max_attempts, 5);
//! assert_eq!(config.time_limit(), Some(Duration::from_secs(30)));
//! assert!(config.relaxation.minimize_original);
//! ```
//!
//! Use the default config when the file is missing:
//!
//! ```
//! use rotaforge_config::EngineConfig;
//!
//! let config = EngineConfig::load("rotaforge.toml").unwrap_or_default();
//! assert_eq!(config.validation.max_attempts, 3);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound accepted for `validation.max_attempts`.
pub const MAX_VALIDATION_ATTEMPTS: u32 = 10;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EngineConfig {
    /// Translate-validate-retry loop settings.
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Solver session settings.
    #[serde(default)]
    pub solver: SolverSettingsConfig,

    /// Infeasibility relaxation settings.
    #[serde(default)]
    pub relaxation: RelaxationConfig,

    /// Limits for the constraint expression sandbox.
    #[serde(default)]
    pub sandbox: SandboxConfig,

    /// Realized assignment extraction.
    #[serde(default)]
    pub assignment: AssignmentConfig,

    /// Console output.
    #[serde(default)]
    pub console: ConsoleConfig,
}

impl EngineConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist, contains invalid TOML, or fails validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the number of translate-validate attempts.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.validation.max_attempts = attempts;
        self
    }

    /// Requires approval before resubmitting a phrase with error text.
    pub fn with_confirm_resubmission(mut self, confirm: bool) -> Self {
        self.validation.confirm_resubmission = confirm;
        self
    }

    /// Sets the solve wall-clock limit.
    pub fn with_time_limit_secs(mut self, seconds: u64) -> Self {
        self.solver.time_limit_secs = Some(seconds);
        self
    }

    /// Sets the branch-and-bound node limit.
    pub fn with_node_limit(mut self, nodes: u64) -> Self {
        self.solver.node_limit = Some(nodes);
        self
    }

    /// Enables or disables automatic relaxation of infeasible models.
    pub fn with_relaxation(mut self, enabled: bool) -> Self {
        self.relaxation.enabled = enabled;
        self
    }

    /// Sets the sandbox evaluation step budget.
    pub fn with_max_steps(mut self, steps: u64) -> Self {
        self.sandbox.max_steps = steps;
        self
    }

    /// Enables the colored console output.
    pub fn with_console(mut self, enabled: bool) -> Self {
        self.console.enabled = enabled;
        self
    }

    /// Returns the solve time limit, if configured.
    pub fn time_limit(&self) -> Option<Duration> {
        self.solver.time_limit()
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let attempts = self.validation.max_attempts;
        if attempts == 0 || attempts > MAX_VALIDATION_ATTEMPTS {
            return Err(ConfigError::Invalid(format!(
                "validation.max_attempts must be in 1..={}, got {}",
                MAX_VALIDATION_ATTEMPTS, attempts
            )));
        }
        if self.solver.threads == 0 {
            return Err(ConfigError::Invalid("solver.threads must be at least 1".into()));
        }
        if !(self.solver.mip_gap >= 0.0 && self.solver.mip_gap < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "solver.mip_gap must be in [0, 1), got {}",
                self.solver.mip_gap
            )));
        }
        let threshold = self.assignment.rounding_threshold;
        if !(threshold > 0.0 && threshold < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "assignment.rounding_threshold must be in (0, 1), got {}",
                threshold
            )));
        }
        if self.sandbox.max_steps == 0 || self.sandbox.max_constraints == 0 {
            return Err(ConfigError::Invalid("sandbox limits must be positive".into()));
        }
        Ok(())
    }
}

/// Translate-validate-retry loop configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ValidationConfig {
    /// Maximum translation attempts per phrase (including the first).
    pub max_attempts: u32,

    /// Ask for approval before resubmitting a phrase augmented with error text.
    pub confirm_resubmission: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            confirm_resubmission: false,
        }
    }
}

/// Solver session configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SolverSettingsConfig {
    /// Worker threads. Interactive solves always run single-threaded.
    pub threads: usize,

    /// Whether presolve reductions run before the search.
    pub presolve: bool,

    /// Keep `threads`/`presolve` as configured instead of forcing the
    /// reproducible settings on the live session.
    pub allow_nondeterministic: bool,

    /// Maximum seconds to spend in one solve.
    pub time_limit_secs: Option<u64>,

    /// Maximum branch-and-bound nodes in one solve.
    pub node_limit: Option<u64>,

    /// Relative optimality gap at which the search stops.
    pub mip_gap: f64,
}

impl Default for SolverSettingsConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            presolve: false,
            allow_nondeterministic: false,
            time_limit_secs: None,
            node_limit: None,
            mip_gap: 1e-6,
        }
    }
}

impl SolverSettingsConfig {
    /// Returns the time limit as a Duration, if any.
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// Relaxation configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct RelaxationConfig {
    /// Attempt a slack relaxation when the model is infeasible.
    pub enabled: bool,

    /// After minimizing total slack, re-optimize the original objective with
    /// total slack held at its minimum.
    pub minimize_original: bool,
}

impl Default for RelaxationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            minimize_original: false,
        }
    }
}

/// Sandbox limits for programs in the constraint language.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SandboxConfig {
    /// Maximum evaluated nodes per program.
    pub max_steps: u64,

    /// Maximum constraints a single program may add.
    pub max_constraints: usize,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            max_steps: 1_000_000,
            max_constraints: 100_000,
        }
    }
}

/// Realized assignment extraction.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct AssignmentConfig {
    /// Values above this threshold count as assigned.
    pub rounding_threshold: f64,
}

impl Default for AssignmentConfig {
    fn default() -> Self {
        Self {
            rounding_threshold: 0.5,
        }
    }
}

/// Console output configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ConsoleConfig {
    /// Install the colored console subscriber on first solve.
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.validation.max_attempts, 3);
        assert!(!config.validation.confirm_resubmission);
        assert_eq!(config.solver.threads, 1);
        assert!(!config.solver.presolve);
        assert!(config.relaxation.enabled);
        assert_eq!(config.assignment.rounding_threshold, 0.5);
        assert_eq!(config.time_limit(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_parsing() {
        let toml = r#"
            [validation]
            max_attempts = 4
            confirm_resubmission = true

            [solver]
            time_limit_secs = 20
            node_limit = 5000

            [sandbox]
            max_steps = 1000
        "#;

        let config = EngineConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.validation.max_attempts, 4);
        assert!(config.validation.confirm_resubmission);
        assert_eq!(config.time_limit(), Some(Duration::from_secs(20)));
        assert_eq!(config.solver.node_limit, Some(5000));
        assert_eq!(config.sandbox.max_steps, 1000);
        // untouched sections keep their defaults
        assert_eq!(config.sandbox.max_constraints, 100_000);
        assert!(config.relaxation.enabled);
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r#"
            validation:
              max_attempts: 2
            relaxation:
              enabled: false
            console:
              enabled: true
        "#;

        let config = EngineConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.validation.max_attempts, 2);
        assert!(!config.relaxation.enabled);
        assert!(config.console.enabled);
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let err = EngineConfig::from_toml_str("[validation]\nmax_attempts = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let config = EngineConfig {
            assignment: AssignmentConfig {
                rounding_threshold: 1.5,
            },
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_builder() {
        let config = EngineConfig::new()
            .with_max_attempts(5)
            .with_time_limit_secs(60)
            .with_node_limit(100)
            .with_relaxation(false)
            .with_max_steps(42);

        assert_eq!(config.validation.max_attempts, 5);
        assert_eq!(config.time_limit(), Some(Duration::from_secs(60)));
        assert_eq!(config.solver.node_limit, Some(100));
        assert!(!config.relaxation.enabled);
        assert_eq!(config.sandbox.max_steps, 42);
    }
}
