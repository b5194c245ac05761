use crate::error::GuidanceError;
use crate::guidance::builder::{check_boundary_feasibility, GuidanceProblemBuilder};
use crate::guidance::extract::TrajectoryExtractor;
use crate::guidance::program::ConicProgram;
use crate::scenario::ScenarioConfig;
use crate::solver::{ConvexSolver, SolveResult};
use crate::trajectory::{Trajectory, TrajectorySource};

// ---------------------------------------------------------------------------
// Fuel-optimal guidance: build -> solve -> extract
// ---------------------------------------------------------------------------

/// Convex powered-descent planner over a borrowed solver handle.
pub struct GfoldGuidance<'a, S: ConvexSolver> {
    solver: &'a S,
    precheck: bool,
}

impl<'a, S: ConvexSolver> GfoldGuidance<'a, S> {
    pub fn new(solver: &'a S) -> Self {
        Self { solver, precheck: true }
    }

    /// Skip the boundary pre-check and always hand the program to the solver.
    pub fn without_precheck(mut self) -> Self {
        self.precheck = false;
        self
    }

    /// Build and solve, returning the raw program and solver result.
    pub fn solve(&self, scenario: &ScenarioConfig) -> Result<(ConicProgram, SolveResult), GuidanceError> {
        if self.precheck {
            check_boundary_feasibility(scenario)?;
        }
        let program = GuidanceProblemBuilder::new(scenario).build()?;
        let result = self.solver.solve(&program);
        if result.status.is_optimal() {
            log::info!(
                "{}: optimal descent over {} steps, impulse {:.1} N*s",
                self.solver.name(),
                scenario.steps,
                result.objective
            );
        } else {
            log::info!("{}: no trajectory, status {}", self.solver.name(), result.status);
        }
        Ok((program, result))
    }

    pub fn plan(&self, scenario: &ScenarioConfig) -> Result<Trajectory, GuidanceError> {
        let (program, result) = self.solve(scenario)?;
        TrajectoryExtractor::new(program.layout, scenario.step_duration).extract(&result)
    }
}

impl<S: ConvexSolver> TrajectorySource for GfoldGuidance<'_, S> {
    fn produce(&mut self, scenario: &ScenarioConfig) -> Result<Trajectory, GuidanceError> {
        self.plan(scenario)
    }

    fn name(&self) -> &str {
        "G-FOLD"
    }
}
