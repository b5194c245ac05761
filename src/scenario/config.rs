use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::ScenarioError;

// ---------------------------------------------------------------------------
// Operational constraint switches
// ---------------------------------------------------------------------------

/// Optional relaxations of the descent rules. Both rules are on by default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OperationalConstraints {
    /// Vertical thrust component must be non-negative (engine cannot pull down).
    #[serde(default = "enabled")]
    pub upward_thrust_only: bool,
    /// Vertical velocity must never be positive (no bounce-and-redescend).
    #[serde(default = "enabled")]
    pub monotonic_descent: bool,
}

fn enabled() -> bool {
    true
}

impl Default for OperationalConstraints {
    fn default() -> Self {
        Self { upward_thrust_only: true, monotonic_descent: true }
    }
}

// ---------------------------------------------------------------------------
// Scenario: vehicle + boundary conditions (SI units, z = altitude)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub steps: usize,                     // K, number of discretization steps
    pub step_duration: f64,               // h, s
    pub gravity: f64,                     // m/s^2, acts along -z
    pub mass: f64,                        // kg (constant, no depletion)
    pub max_thrust: f64,                  // N, bound on |F|
    pub min_altitude: f64,                // m, floor on P.z
    #[serde(default)]
    pub glide_slope: Option<f64>,         // rad, cone half-angle from vertical
    pub initial_position: Vector3<f64>,   // m
    pub initial_velocity: Vector3<f64>,   // m/s
    pub target_position: Vector3<f64>,    // m
    #[serde(default)]
    pub constraints: OperationalConstraints,
}

impl ScenarioConfig {
    /// Check the scenario invariants: K >= 1, h, m, F_max > 0, finite inputs.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.steps < 1 {
            return Err(ScenarioError::StepCount(self.steps));
        }
        positive("step_duration", self.step_duration)?;
        positive("mass", self.mass)?;
        positive("max_thrust", self.max_thrust)?;
        if !self.gravity.is_finite() || self.gravity < 0.0 {
            return Err(ScenarioError::Gravity(self.gravity));
        }
        if !self.min_altitude.is_finite() {
            return Err(ScenarioError::NonFinite { field: "min_altitude" });
        }
        finite_vec("initial_position", &self.initial_position)?;
        finite_vec("initial_velocity", &self.initial_velocity)?;
        finite_vec("target_position", &self.target_position)?;
        if let Some(alpha) = self.glide_slope {
            if !(alpha > 0.0 && alpha < std::f64::consts::FRAC_PI_2) {
                return Err(ScenarioError::GlideSlope(alpha));
            }
        }
        Ok(())
    }

    /// Total planning horizon K*h, s.
    pub fn horizon(&self) -> f64 {
        self.steps as f64 * self.step_duration
    }

    /// Maximum thrust acceleration over local gravity.
    pub fn thrust_to_weight(&self) -> f64 {
        if self.gravity > 0.0 {
            self.max_thrust / (self.mass * self.gravity)
        } else {
            f64::INFINITY
        }
    }
}

pub(super) fn positive(field: &'static str, value: f64) -> Result<(), ScenarioError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ScenarioError::NonPositive { field, value })
    }
}

fn finite_vec(field: &'static str, v: &Vector3<f64>) -> Result<(), ScenarioError> {
    if v.iter().all(|c| c.is_finite()) {
        Ok(())
    } else {
        Err(ScenarioError::NonFinite { field })
    }
}

// ---------------------------------------------------------------------------
// Scenario builder
// ---------------------------------------------------------------------------

pub struct ScenarioBuilder {
    config: ScenarioConfig,
}

impl ScenarioBuilder {
    pub fn new() -> Self {
        Self {
            config: ScenarioConfig {
                steps: 30,
                step_duration: 1.0,
                gravity: 9.80665,
                mass: 1000.0,
                max_thrust: 20_000.0,
                min_altitude: 0.0,
                glide_slope: None,
                initial_position: Vector3::new(0.0, 0.0, 100.0),
                initial_velocity: Vector3::zeros(),
                target_position: Vector3::zeros(),
                constraints: OperationalConstraints::default(),
            },
        }
    }

    pub fn steps(mut self, v: usize) -> Self { self.config.steps = v; self }
    pub fn step_duration(mut self, v: f64) -> Self { self.config.step_duration = v; self }
    pub fn gravity(mut self, v: f64) -> Self { self.config.gravity = v; self }
    pub fn mass(mut self, v: f64) -> Self { self.config.mass = v; self }
    pub fn max_thrust(mut self, v: f64) -> Self { self.config.max_thrust = v; self }
    pub fn min_altitude(mut self, v: f64) -> Self { self.config.min_altitude = v; self }
    pub fn glide_slope(mut self, v: f64) -> Self { self.config.glide_slope = Some(v); self }
    pub fn initial_position(mut self, v: Vector3<f64>) -> Self { self.config.initial_position = v; self }
    pub fn initial_velocity(mut self, v: Vector3<f64>) -> Self { self.config.initial_velocity = v; self }
    pub fn target_position(mut self, v: Vector3<f64>) -> Self { self.config.target_position = v; self }
    pub fn upward_thrust_only(mut self, v: bool) -> Self { self.config.constraints.upward_thrust_only = v; self }
    pub fn monotonic_descent(mut self, v: bool) -> Self { self.config.constraints.monotonic_descent = v; self }

    pub fn build(self) -> Result<ScenarioConfig, ScenarioError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ScenarioBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_are_valid() {
        let s = ScenarioBuilder::new().build().unwrap();
        assert_eq!(s.steps, 30);
        assert!((s.horizon() - 30.0).abs() < 1e-12);
        assert!(s.constraints.upward_thrust_only && s.constraints.monotonic_descent);
    }

    #[test]
    fn rejects_zero_steps() {
        let err = ScenarioBuilder::new().steps(0).build().unwrap_err();
        assert_eq!(err, ScenarioError::StepCount(0));
    }

    #[test]
    fn rejects_non_positive_physical_parameters() {
        for (builder, field) in [
            (ScenarioBuilder::new().mass(0.0), "mass"),
            (ScenarioBuilder::new().step_duration(-1.0), "step_duration"),
            (ScenarioBuilder::new().max_thrust(0.0), "max_thrust"),
            (ScenarioBuilder::new().mass(f64::NAN), "mass"),
        ] {
            match builder.build() {
                Err(ScenarioError::NonPositive { field: f, .. }) => assert_eq!(f, field),
                other => panic!("expected NonPositive({field}), got {:?}", other),
            }
        }
    }

    #[test]
    fn rejects_bad_glide_slope_and_vectors() {
        assert!(matches!(
            ScenarioBuilder::new().glide_slope(std::f64::consts::FRAC_PI_2).build(),
            Err(ScenarioError::GlideSlope(_))
        ));
        assert!(matches!(
            ScenarioBuilder::new()
                .initial_velocity(Vector3::new(0.0, f64::INFINITY, 0.0))
                .build(),
            Err(ScenarioError::NonFinite { field: "initial_velocity" })
        ));
        assert!(matches!(
            ScenarioBuilder::new().gravity(-1.0).build(),
            Err(ScenarioError::Gravity(_))
        ));
    }

    #[test]
    fn thrust_to_weight_handles_zero_gravity() {
        let s = ScenarioBuilder::new().gravity(0.0).build().unwrap();
        assert!(s.thrust_to_weight().is_infinite());
        let s = ScenarioBuilder::new().gravity(10.0).mass(100.0).max_thrust(2000.0).build().unwrap();
        assert!((s.thrust_to_weight() - 2.0).abs() < 1e-12);
    }
}
