use crate::dynamics::DynamicsDiscretizer;
use crate::error::GuidanceError;
use crate::guidance::program::{AffineExpr, Cone, ConicProgram, ConstraintKind, VariableLayout};
use crate::scenario::ScenarioConfig;

// ---------------------------------------------------------------------------
// Fuel-optimal landing SOCP
//
//   min   sum_k h * sigma[k]
//   s.t.  P[0] = p0, V[0] = v0, P[K] = p_target, V[K] = 0
//         discrete dynamics for k in [0, K)
//         P[k].z >= P_min, V[k].z <= 0                 k in [0, K]
//         F[k].z >= 0, |F[k]| <= F_max, |F[k]| <= sigma[k]   k in [0, K)
//         |P[k].xy - p_target.xy| <= tan(a) (P[k].z - p_target.z)   (optional)
// ---------------------------------------------------------------------------

pub struct GuidanceProblemBuilder<'a> {
    scenario: &'a ScenarioConfig,
}

impl<'a> GuidanceProblemBuilder<'a> {
    pub fn new(scenario: &'a ScenarioConfig) -> Self {
        Self { scenario }
    }

    /// Assemble the conic program. Fails on a malformed scenario; does not
    /// run the boundary pre-check (see [`check_boundary_feasibility`]).
    pub fn build(&self) -> Result<ConicProgram, GuidanceError> {
        let s = self.scenario;
        s.validate()?;

        let layout = VariableLayout::new(s.steps);
        let mut program = ConicProgram::new(layout);

        self.boundary(&mut program);
        DynamicsDiscretizer::from_scenario(s).append(&mut program);
        self.operational(&mut program);
        self.thrust(&mut program);
        if let Some(alpha) = s.glide_slope {
            self.glide_slope(&mut program, alpha.tan());
        }

        program.objective = (0..s.steps)
            .map(|k| (layout.thrust_norm(k), s.step_duration))
            .collect();

        log::debug!(
            "built guidance SOCP: K={} vars={} rows={} constraints={} (soc={})",
            s.steps,
            program.num_variables(),
            program.num_rows(),
            program.constraints.len(),
            program
                .constraints
                .iter()
                .filter(|c| matches!(c.cone, Cone::SecondOrder { .. }))
                .count(),
        );
        Ok(program)
    }

    fn boundary(&self, program: &mut ConicProgram) {
        let s = self.scenario;
        let layout = program.layout;
        let k_final = s.steps;
        for a in 0..3 {
            let p0 = AffineExpr::var(layout.position(0, a)).plus(-s.initial_position[a]);
            let v0 = AffineExpr::var(layout.velocity(0, a)).plus(-s.initial_velocity[a]);
            program.push(ConstraintKind::InitialState, Cone::Zero(p0));
            program.push(ConstraintKind::InitialState, Cone::Zero(v0));

            let pk = AffineExpr::var(layout.position(k_final, a)).plus(-s.target_position[a]);
            let vk = AffineExpr::var(layout.velocity(k_final, a));
            program.push(ConstraintKind::FinalState, Cone::Zero(pk));
            program.push(ConstraintKind::FinalState, Cone::Zero(vk));
        }
    }

    fn operational(&self, program: &mut ConicProgram) {
        let s = self.scenario;
        let layout = program.layout;
        for k in 0..=s.steps {
            let floor = AffineExpr::var(layout.position(k, 2)).plus(-s.min_altitude);
            program.push(ConstraintKind::MinAltitude, Cone::Nonnegative(floor));
            if s.constraints.monotonic_descent {
                let descending = AffineExpr::var(layout.velocity(k, 2)).negated();
                program.push(ConstraintKind::Descent, Cone::Nonnegative(descending));
            }
        }
    }

    fn thrust(&self, program: &mut ConicProgram) {
        let s = self.scenario;
        let layout = program.layout;
        for k in 0..s.steps {
            let f = || (0..3).map(|a| AffineExpr::var(layout.thrust(k, a))).collect::<Vec<_>>();
            if s.constraints.upward_thrust_only {
                program.push(
                    ConstraintKind::ThrustDirection,
                    Cone::Nonnegative(AffineExpr::var(layout.thrust(k, 2))),
                );
            }
            // Isotropic bound on the true 3-vector norm, not per axis.
            program.push(
                ConstraintKind::ThrustBound,
                Cone::SecondOrder { head: AffineExpr::constant(s.max_thrust), tail: f() },
            );
            program.push(
                ConstraintKind::ThrustEpigraph,
                Cone::SecondOrder { head: AffineExpr::var(layout.thrust_norm(k)), tail: f() },
            );
        }
    }

    fn glide_slope(&self, program: &mut ConicProgram, tan_alpha: f64) {
        let s = self.scenario;
        let layout = program.layout;
        let target = s.target_position;
        for k in 0..=s.steps {
            let head = AffineExpr::var(layout.position(k, 2))
                .plus(-target.z)
                .scaled(tan_alpha);
            let tail = vec![
                AffineExpr::var(layout.position(k, 0)).plus(-target.x),
                AffineExpr::var(layout.position(k, 1)).plus(-target.y),
            ];
            program.push(ConstraintKind::GlideSlope, Cone::SecondOrder { head, tail });
        }
    }
}

// ---------------------------------------------------------------------------
// Fast-fail boundary pre-check
// ---------------------------------------------------------------------------

/// Reject scenarios whose boundary conditions already contradict the
/// operational constraints, before spending a solver call on them.
pub fn check_boundary_feasibility(s: &ScenarioConfig) -> Result<(), GuidanceError> {
    s.validate()?;
    let p0 = s.initial_position;
    let target = s.target_position;

    if s.min_altitude > p0.z {
        return Err(GuidanceError::InfeasibleBoundary(format!(
            "minimum altitude {:.3} m is above initial altitude {:.3} m",
            s.min_altitude, p0.z
        )));
    }
    if s.min_altitude > target.z {
        return Err(GuidanceError::InfeasibleBoundary(format!(
            "minimum altitude {:.3} m is above target altitude {:.3} m",
            s.min_altitude, target.z
        )));
    }
    if s.constraints.monotonic_descent {
        if s.initial_velocity.z > 0.0 {
            return Err(GuidanceError::InfeasibleBoundary(format!(
                "initial vertical velocity {:.3} m/s is upward under the descent rule",
                s.initial_velocity.z
            )));
        }
        if target.z > p0.z {
            return Err(GuidanceError::InfeasibleBoundary(format!(
                "target altitude {:.3} m is above initial altitude {:.3} m under the descent rule",
                target.z, p0.z
            )));
        }
    }
    if let Some(alpha) = s.glide_slope {
        let lateral = ((p0.x - target.x).powi(2) + (p0.y - target.y).powi(2)).sqrt();
        let allowed = alpha.tan() * (p0.z - target.z);
        if lateral > allowed + 1e-9 * (1.0 + lateral) {
            return Err(GuidanceError::InfeasibleBoundary(format!(
                "initial position is outside the glide-slope cone ({:.3} m lateral, {:.3} m allowed)",
                lateral, allowed
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::ScenarioBuilder;
    use nalgebra::Vector3;

    fn unit_scenario() -> ScenarioConfig {
        ScenarioBuilder::new()
            .steps(2)
            .step_duration(1.0)
            .gravity(0.0)
            .mass(1.0)
            .max_thrust(10.0)
            .initial_position(Vector3::new(0.0, 0.0, 10.0))
            .build()
            .unwrap()
    }

    #[test]
    fn constraint_counts_match_formulation() {
        let s = unit_scenario();
        let p = GuidanceProblemBuilder::new(&s).build().unwrap();
        assert_eq!(p.count(ConstraintKind::InitialState), 6);
        assert_eq!(p.count(ConstraintKind::FinalState), 6);
        assert_eq!(p.count(ConstraintKind::Dynamics), 12);
        assert_eq!(p.count(ConstraintKind::MinAltitude), 3);
        assert_eq!(p.count(ConstraintKind::Descent), 3);
        assert_eq!(p.count(ConstraintKind::ThrustDirection), 2);
        assert_eq!(p.count(ConstraintKind::ThrustBound), 2);
        assert_eq!(p.count(ConstraintKind::ThrustEpigraph), 2);
        assert_eq!(p.count(ConstraintKind::GlideSlope), 0);
        assert_eq!(p.objective.len(), 2);
        assert_eq!(p.num_variables(), 6 * 3 + 4 * 2);
    }

    #[test]
    fn relaxations_drop_their_rows() {
        let mut s = unit_scenario();
        s.constraints.upward_thrust_only = false;
        s.constraints.monotonic_descent = false;
        let p = GuidanceProblemBuilder::new(&s).build().unwrap();
        assert_eq!(p.count(ConstraintKind::ThrustDirection), 0);
        assert_eq!(p.count(ConstraintKind::Descent), 0);
    }

    #[test]
    fn thrust_bound_is_a_ball_not_a_box() {
        let s = unit_scenario();
        let p = GuidanceProblemBuilder::new(&s).build().unwrap();
        let layout = p.layout;
        let bound = p
            .constraints
            .iter()
            .find(|c| c.kind == ConstraintKind::ThrustBound)
            .unwrap();
        // (8, 0, 8) is inside the per-axis box but outside the ball of radius 10.
        let mut x = vec![0.0; layout.len()];
        x[layout.thrust(0, 0)] = 8.0;
        x[layout.thrust(0, 2)] = 8.0;
        assert!(bound.cone.violation(&x) > 1.0);
    }

    #[test]
    fn glide_slope_cone_has_apex_at_target() {
        let mut s = unit_scenario();
        s.glide_slope = Some(std::f64::consts::FRAC_PI_4);
        s.target_position = Vector3::new(1.0, 1.0, 0.0);
        let p = GuidanceProblemBuilder::new(&s).build().unwrap();
        assert_eq!(p.count(ConstraintKind::GlideSlope), 3);
        let layout = p.layout;
        let cone = &p
            .constraints
            .iter()
            .find(|c| c.kind == ConstraintKind::GlideSlope)
            .unwrap()
            .cone;
        let mut x = vec![0.0; layout.len()];
        // 3 m lateral offset at 4 m altitude: inside a 45 deg cone.
        x[layout.position(0, 0)] = 4.0;
        x[layout.position(0, 1)] = 1.0;
        x[layout.position(0, 2)] = 4.0;
        assert!(cone.violation(&x) < 0.0);
        // same offset at 2 m altitude: outside.
        x[layout.position(0, 2)] = 2.0;
        assert!(cone.violation(&x) > 0.0);
    }

    #[test]
    fn objective_is_impulse_weighted() {
        let mut s = unit_scenario();
        s.step_duration = 0.25;
        let p = GuidanceProblemBuilder::new(&s).build().unwrap();
        assert!(p.objective.iter().all(|&(_, c)| c == 0.25));
    }

    #[test]
    fn build_rejects_malformed_scenario() {
        let mut s = unit_scenario();
        s.mass = 0.0;
        assert!(matches!(
            GuidanceProblemBuilder::new(&s).build(),
            Err(GuidanceError::Configuration(_))
        ));
    }

    #[test]
    fn precheck_catches_floor_above_boundary() {
        let mut s = unit_scenario();
        s.min_altitude = 20.0;
        match check_boundary_feasibility(&s) {
            Err(GuidanceError::InfeasibleBoundary(msg)) => assert!(msg.contains("initial altitude")),
            other => panic!("expected InfeasibleBoundary, got {:?}", other),
        }
        s.min_altitude = 5.0;
        assert!(matches!(
            check_boundary_feasibility(&s),
            Err(GuidanceError::InfeasibleBoundary(_))
        ));
    }

    #[test]
    fn precheck_catches_upward_start_and_glide_slope() {
        let mut s = unit_scenario();
        s.initial_velocity = Vector3::new(0.0, 0.0, 1.0);
        assert!(check_boundary_feasibility(&s).is_err());
        s.constraints.monotonic_descent = false;
        assert!(check_boundary_feasibility(&s).is_ok());

        let mut s = unit_scenario();
        s.initial_position = Vector3::new(20.0, 0.0, 10.0);
        s.glide_slope = Some(std::f64::consts::FRAC_PI_4);
        assert!(check_boundary_feasibility(&s).is_err());
    }
}
