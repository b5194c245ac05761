//! Convex solver boundary: conic program in, [`SolveResult`] out.

pub mod backend;

use std::fmt;
use std::time::Duration;

use crate::guidance::program::{ConicProgram, Variable, VariableLayout};

pub use backend::{ClarabelSolver, SolverOptions};

// ---------------------------------------------------------------------------
// Solve result contract
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    /// Solver gave up or malfunctioned; carries the solver's own status name.
    SolverError(String),
}

impl SolveStatus {
    pub fn is_optimal(&self) -> bool {
        matches!(self, SolveStatus::Optimal)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveStatus::Optimal => write!(f, "optimal"),
            SolveStatus::Infeasible => write!(f, "infeasible"),
            SolveStatus::Unbounded => write!(f, "unbounded"),
            SolveStatus::SolverError(raw) => write!(f, "solver-error ({})", raw),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolveResult {
    pub status: SolveStatus,
    pub objective: f64,          // total impulse, N*s
    pub primal: Vec<f64>,        // one value per layout column when optimal
    pub iterations: u32,
    pub solve_time: Duration,
}

impl SolveResult {
    /// A non-optimal outcome with no primal values.
    pub fn failed(status: SolveStatus) -> Self {
        Self {
            status,
            objective: f64::NAN,
            primal: Vec::new(),
            iterations: 0,
            solve_time: Duration::ZERO,
        }
    }

    /// Primal value of a decision variable, if present.
    pub fn value(&self, layout: &VariableLayout, var: Variable) -> Option<f64> {
        layout.index_of(var).and_then(|col| self.primal.get(col).copied())
    }
}

// ---------------------------------------------------------------------------
// Solver trait
// ---------------------------------------------------------------------------

/// Stateless conic solver: each call is an independent solve and the same
/// handle may be reused for any number of scenarios.
pub trait ConvexSolver {
    fn solve(&self, program: &ConicProgram) -> SolveResult;

    fn name(&self) -> &str {
        "unnamed"
    }
}
