use nalgebra::Vector3;

use crate::error::GuidanceError;
use crate::guidance::program::{Variable, VariableLayout};
use crate::solver::SolveResult;
use crate::trajectory::{Termination, Trajectory};

// ---------------------------------------------------------------------------
// Solver primal -> physical trajectory
// ---------------------------------------------------------------------------

/// Maps primal values back onto P, V, F by variable identity. Gaps in the
/// solver response are fatal; nothing is zero-filled.
pub struct TrajectoryExtractor {
    layout: VariableLayout,
    step: f64,
}

impl TrajectoryExtractor {
    pub fn new(layout: VariableLayout, step: f64) -> Self {
        Self { layout, step }
    }

    pub fn extract(&self, result: &SolveResult) -> Result<Trajectory, GuidanceError> {
        if !result.status.is_optimal() {
            return Err(GuidanceError::SolveFailure { status: result.status.clone() });
        }
        if result.primal.len() != self.layout.len() {
            return Err(self.fail(format!(
                "expected {} primal values, solver returned {}",
                self.layout.len(),
                result.primal.len()
            )));
        }

        let k_final = self.layout.steps();
        let mut positions = Vec::with_capacity(k_final + 1);
        let mut velocities = Vec::with_capacity(k_final + 1);
        let mut thrusts = Vec::with_capacity(k_final);
        for step in 0..=k_final {
            positions.push(self.vector(result, |axis| Variable::Position { step, axis })?);
            velocities.push(self.vector(result, |axis| Variable::Velocity { step, axis })?);
            if step < k_final {
                thrusts.push(self.vector(result, |axis| Variable::Thrust { step, axis })?);
            }
        }

        let fuel_used = self.objective(result.objective)?;
        let trajectory = Trajectory {
            step: self.step,
            positions,
            velocities,
            thrusts,
            fuel_used,
            termination: Termination::Planned,
        };
        trajectory.check_shape().map_err(|msg| self.fail(msg))?;
        Ok(trajectory)
    }

    fn vector<F>(&self, result: &SolveResult, var: F) -> Result<Vector3<f64>, GuidanceError>
    where
        F: Fn(usize) -> Variable,
    {
        let mut v = Vector3::zeros();
        for axis in 0..3 {
            let id = var(axis);
            v[axis] = match result.value(&self.layout, id) {
                Some(x) if x.is_finite() => x,
                Some(x) => return Err(self.fail(format!("non-finite value {} for {:?}", x, id))),
                None => return Err(self.fail(format!("missing primal value for {:?}", id))),
            };
        }
        Ok(v)
    }

    fn objective(&self, value: f64) -> Result<f64, GuidanceError> {
        if !value.is_finite() {
            return Err(self.fail(format!("non-finite objective {}", value)));
        }
        // Interior-point optima of a norm sum can land a hair below zero.
        if value < -1e-6 * (1.0 + value.abs()) {
            return Err(self.fail(format!("negative fuel cost {}", value)));
        }
        Ok(value.max(0.0))
    }

    fn fail(&self, reason: String) -> GuidanceError {
        log::error!("trajectory extraction failed: {}", reason);
        GuidanceError::Extraction(reason)
    }
}
