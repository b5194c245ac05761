use thiserror::Error;

use crate::solver::SolveStatus;

// ---------------------------------------------------------------------------
// Scenario validation
// ---------------------------------------------------------------------------

/// A malformed scenario, caught before any problem is built.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScenarioError {
    #[error("step count must be at least 1, got {0}")]
    StepCount(usize),
    #[error("{field} must be positive and finite, got {value}")]
    NonPositive { field: &'static str, value: f64 },
    #[error("{field} must be finite")]
    NonFinite { field: &'static str },
    #[error("{field} must be non-negative, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("gravity must be non-negative and finite, got {0}")]
    Gravity(f64),
    #[error("glide-slope half-angle must lie in (0, pi/2) rad, got {0}")]
    GlideSlope(f64),
}

// ---------------------------------------------------------------------------
// Manifest loading
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read scenario: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unsupported scenario file extension: {0}")]
    Extension(String),
    #[error(transparent)]
    Invalid(#[from] ScenarioError),
}

// ---------------------------------------------------------------------------
// Guidance pipeline
// ---------------------------------------------------------------------------

/// Failure of one guidance attempt. None of these are retried internally.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GuidanceError {
    #[error("invalid scenario: {0}")]
    Configuration(#[from] ScenarioError),
    #[error("scenario infeasible by construction: {0}")]
    InfeasibleBoundary(String),
    #[error("solve failed: {status}")]
    SolveFailure { status: SolveStatus },
    #[error("malformed solver response: {0}")]
    Extraction(String),
}

impl GuidanceError {
    /// True when the scenario itself is physically unsolvable, as opposed to
    /// a configuration mistake or a solver/extraction malfunction.
    pub fn is_infeasible(&self) -> bool {
        matches!(
            self,
            GuidanceError::InfeasibleBoundary(_)
                | GuidanceError::SolveFailure { status: SolveStatus::Infeasible }
        )
    }
}

// ---------------------------------------------------------------------------
// Scenario controller
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControlError {
    #[error("a solve is already in flight (ticket {0})")]
    SolveInFlight(u64),
    #[error("no free-flight run is active")]
    NotFlying,
}
