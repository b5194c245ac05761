use nalgebra::Vector3;

use crate::guidance::program::{AffineExpr, Cone, ConicProgram, ConstraintKind, VariableLayout};
use crate::scenario::ScenarioConfig;
use crate::trajectory::Trajectory;

// ---------------------------------------------------------------------------
// Translational point-mass dynamics, discretized at fixed step h
//
//   V[k+1] = V[k] + (h/m) F[k] - g h z
//   P[k+1] = P[k] + (h/2) (V[k] + V[k+1])
//
// Mass is held constant over the whole horizon.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicsDiscretizer {
    pub step: f64,      // h, s
    pub mass: f64,      // kg
    pub gravity: f64,   // m/s^2 along -z
}

impl DynamicsDiscretizer {
    pub fn new(step: f64, mass: f64, gravity: f64) -> Self {
        Self { step, mass, gravity }
    }

    pub fn from_scenario(scenario: &ScenarioConfig) -> Self {
        Self::new(scenario.step_duration, scenario.mass, scenario.gravity)
    }

    /// The six equality rows linking step k to k+1, each `expr == 0`.
    /// Velocity rows come first (x, y, z), then position rows.
    pub fn step_constraints(&self, layout: &VariableLayout, k: usize) -> [AffineExpr; 6] {
        let h = self.step;
        let velocity = |axis: usize| {
            let gravity_term = if axis == 2 { self.gravity * h } else { 0.0 };
            AffineExpr::var(layout.velocity(k + 1, axis))
                .term(layout.velocity(k, axis), -1.0)
                .term(layout.thrust(k, axis), -h / self.mass)
                .plus(gravity_term)
        };
        let position = |axis: usize| {
            AffineExpr::var(layout.position(k + 1, axis))
                .term(layout.position(k, axis), -1.0)
                .term(layout.velocity(k, axis), -0.5 * h)
                .term(layout.velocity(k + 1, axis), -0.5 * h)
        };
        [velocity(0), velocity(1), velocity(2), position(0), position(1), position(2)]
    }

    /// Append dynamics equalities for every adjacent pair (k, k+1), k in [0, K).
    pub fn append(&self, program: &mut ConicProgram) {
        let layout = program.layout;
        for k in 0..layout.steps() {
            for row in self.step_constraints(&layout, k) {
                program.push(ConstraintKind::Dynamics, Cone::Zero(row));
            }
        }
    }

    /// Apply one step of the discrete model numerically.
    pub fn propagate(
        &self,
        pos: &Vector3<f64>,
        vel: &Vector3<f64>,
        thrust: &Vector3<f64>,
    ) -> (Vector3<f64>, Vector3<f64>) {
        let h = self.step;
        let vel_next = vel + thrust * (h / self.mass) - Vector3::z() * (self.gravity * h);
        let pos_next = pos + (vel + vel_next) * (0.5 * h);
        (pos_next, vel_next)
    }

    /// Largest recurrence residual over a trajectory, m or m/s.
    pub fn max_residual(&self, trajectory: &Trajectory) -> f64 {
        let mut worst = 0.0_f64;
        for (k, f) in trajectory.thrusts.iter().enumerate() {
            let (p, v) = self.propagate(&trajectory.positions[k], &trajectory.velocities[k], f);
            worst = worst
                .max((p - trajectory.positions[k + 1]).norm())
                .max((v - trajectory.velocities[k + 1]).norm());
        }
        worst
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trajectory::Termination;
    use approx::assert_relative_eq;

    #[test]
    fn propagate_matches_closed_form() {
        let d = DynamicsDiscretizer::new(2.0, 10.0, 1.5);
        let (p, v) = d.propagate(
            &Vector3::new(0.0, 0.0, 100.0),
            &Vector3::new(1.0, 0.0, -3.0),
            &Vector3::new(5.0, 0.0, 20.0),
        );
        // dv = (h/m) F - g h z = (1, 0, 4) - (0, 0, 3)
        assert_relative_eq!(v, Vector3::new(2.0, 0.0, -2.0), epsilon = 1e-12);
        // dp = h/2 (v0 + v1) = (3, 0, -5)
        assert_relative_eq!(p, Vector3::new(3.0, 0.0, 95.0), epsilon = 1e-12);
    }

    #[test]
    fn constraint_rows_vanish_on_propagated_samples() {
        let d = DynamicsDiscretizer::new(0.5, 4.0, 9.8);
        let layout = VariableLayout::new(1);
        let p0 = Vector3::new(1.0, -2.0, 30.0);
        let v0 = Vector3::new(0.5, 0.0, -4.0);
        let f0 = Vector3::new(-2.0, 3.0, 50.0);
        let (p1, v1) = d.propagate(&p0, &v0, &f0);

        let mut x = vec![0.0; layout.len()];
        for a in 0..3 {
            x[layout.position(0, a)] = p0[a];
            x[layout.position(1, a)] = p1[a];
            x[layout.velocity(0, a)] = v0[a];
            x[layout.velocity(1, a)] = v1[a];
            x[layout.thrust(0, a)] = f0[a];
        }
        for row in d.step_constraints(&layout, 0) {
            assert!(row.eval(&x).abs() < 1e-12, "residual {}", row.eval(&x));
        }
    }

    #[test]
    fn append_adds_six_rows_per_step() {
        let d = DynamicsDiscretizer::new(1.0, 1.0, 0.0);
        let mut program = ConicProgram::new(VariableLayout::new(4));
        d.append(&mut program);
        assert_eq!(program.count(ConstraintKind::Dynamics), 24);
    }

    #[test]
    fn residual_detects_inconsistent_sample() {
        let d = DynamicsDiscretizer::new(1.0, 1.0, 0.0);
        let mut traj = Trajectory {
            step: 1.0,
            positions: vec![Vector3::new(0.0, 0.0, 10.0), Vector3::new(0.0, 0.0, 10.0)],
            velocities: vec![Vector3::zeros(), Vector3::zeros()],
            thrusts: vec![Vector3::zeros()],
            fuel_used: 0.0,
            termination: Termination::Planned,
        };
        assert!(d.max_residual(&traj) < 1e-12);
        traj.positions[1].z = 9.0;
        assert_relative_eq!(d.max_residual(&traj), 1.0, epsilon = 1e-12);
    }
}
