use nalgebra::Vector3;
use serde::Serialize;

use crate::error::GuidanceError;
use crate::scenario::ScenarioConfig;

// ---------------------------------------------------------------------------
// Trajectory: K+1 state samples, K thrust samples, z = altitude
// ---------------------------------------------------------------------------

/// How a trajectory ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Output of the guidance solve; ends at the target by construction.
    Planned,
    LandedSafely,
    Crashed,
    /// Free flight hit its time cap before touching down.
    TimedOut,
}

/// Time-indexed descent trajectory shared by both production modes.
///
/// `thrusts[k]` acts over the interval between samples `k` and `k+1`.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub step: f64,                        // s between samples
    pub positions: Vec<Vector3<f64>>,     // P[0..=K], m
    pub velocities: Vec<Vector3<f64>>,    // V[0..=K], m/s
    pub thrusts: Vec<Vector3<f64>>,       // F[0..K], N
    pub fuel_used: f64,                   // total impulse, N*s
    pub termination: Termination,
}

impl Trajectory {
    /// Number of steps K.
    pub fn steps(&self) -> usize {
        self.thrusts.len()
    }

    /// Check len(P) = len(V) = len(F) + 1.
    pub fn check_shape(&self) -> Result<(), String> {
        let k = self.thrusts.len();
        if self.positions.len() != k + 1 || self.velocities.len() != k + 1 {
            return Err(format!(
                "expected {} position/velocity samples for {} thrust samples, got {}/{}",
                k + 1,
                k,
                self.positions.len(),
                self.velocities.len()
            ));
        }
        Ok(())
    }

    pub fn duration(&self) -> f64 {
        self.steps() as f64 * self.step
    }

    /// Time of sample k, s.
    pub fn time_at(&self, k: usize) -> f64 {
        k as f64 * self.step
    }

    pub fn final_position(&self) -> Option<Vector3<f64>> {
        self.positions.last().copied()
    }

    pub fn final_velocity(&self) -> Option<Vector3<f64>> {
        self.velocities.last().copied()
    }

    pub fn peak_thrust(&self) -> f64 {
        self.thrusts.iter().map(|f| f.norm()).fold(0.0_f64, f64::max)
    }

    pub fn min_altitude(&self) -> f64 {
        self.positions.iter().map(|p| p.z).fold(f64::INFINITY, f64::min)
    }

    /// Impulse actually commanded, sum of |F[k]| * h.
    pub fn commanded_impulse(&self) -> f64 {
        self.thrusts.iter().map(|f| f.norm()).sum::<f64>() * self.step
    }
}

// ---------------------------------------------------------------------------
// Trajectory source: one capability, two modes
// ---------------------------------------------------------------------------

/// Anything that turns a scenario into a trajectory: the convex guidance
/// solve or the fixed-thrust free-flight integrator.
pub trait TrajectorySource {
    fn produce(&mut self, scenario: &ScenarioConfig) -> Result<Trajectory, GuidanceError>;

    /// Human-readable name for logging/display.
    fn name(&self) -> &str {
        "unnamed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_step() -> Trajectory {
        Trajectory {
            step: 0.5,
            positions: vec![
                Vector3::new(0.0, 0.0, 10.0),
                Vector3::new(0.0, 0.0, 5.0),
                Vector3::new(1.0, 0.0, 0.0),
            ],
            velocities: vec![Vector3::zeros(); 3],
            thrusts: vec![Vector3::new(0.0, 3.0, 4.0), Vector3::new(0.0, 0.0, 1.0)],
            fuel_used: 3.0,
            termination: Termination::Planned,
        }
    }

    #[test]
    fn shape_and_derived_quantities() {
        let t = two_step();
        assert!(t.check_shape().is_ok());
        assert_eq!(t.steps(), 2);
        assert!((t.duration() - 1.0).abs() < 1e-12);
        assert!((t.time_at(1) - 0.5).abs() < 1e-12);
        assert!((t.peak_thrust() - 5.0).abs() < 1e-12);
        assert!((t.commanded_impulse() - 3.0).abs() < 1e-12);
        assert_eq!(t.min_altitude(), 0.0);
        assert_eq!(t.final_position().unwrap().x, 1.0);
    }

    #[test]
    fn shape_mismatch_is_reported() {
        let mut t = two_step();
        t.velocities.pop();
        let msg = t.check_shape().unwrap_err();
        assert!(msg.contains("expected 3"), "{}", msg);
    }
}
