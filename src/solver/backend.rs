use std::time::Instant;

use clarabel::algebra::CscMatrix;
use clarabel::solver::*;
use serde::{Deserialize, Serialize};

use super::{ConvexSolver, SolveResult, SolveStatus};
use crate::guidance::program::{AffineExpr, Cone, ConicProgram};

// ---------------------------------------------------------------------------
// Solver options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverOptions {
    pub max_iter: u32,
    #[serde(default)]
    pub time_limit: Option<f64>,   // s
    pub tol_gap_abs: f64,
    pub tol_gap_rel: f64,
    pub tol_feas: f64,
    #[serde(default)]
    pub verbose: bool,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iter: 200,
            time_limit: None,
            tol_gap_abs: 1e-8,
            tol_gap_rel: 1e-8,
            tol_feas: 1e-8,
            verbose: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Clarabel interior-point handle
// ---------------------------------------------------------------------------

/// Explicit solver handle. Create once, pass by reference; holds no
/// per-solve state.
#[derive(Debug, Clone, Default)]
pub struct ClarabelSolver {
    options: SolverOptions,
}

impl ClarabelSolver {
    pub fn new(options: SolverOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    fn settings(&self) -> DefaultSettings<f64> {
        let o = &self.options;
        DefaultSettings {
            max_iter: o.max_iter,
            time_limit: o.time_limit.unwrap_or(f64::INFINITY),
            tol_gap_abs: o.tol_gap_abs,
            tol_gap_rel: o.tol_gap_rel,
            tol_feas: o.tol_feas,
            verbose: o.verbose,
            ..DefaultSettings::default()
        }
    }
}

impl ConvexSolver for ClarabelSolver {
    fn solve(&self, program: &ConicProgram) -> SolveResult {
        let lowered = lower(program);
        let started = Instant::now();

        let mut solver = DefaultSolver::new(
            &lowered.p,
            &lowered.q,
            &lowered.a,
            &lowered.b,
            &lowered.cones,
            self.settings(),
        );
        solver.solve();

        let solution = &solver.solution;
        let status = map_status(&solution.status);
        let solve_time = started.elapsed();
        log::info!(
            "clarabel finished: status={} iterations={} time={:.3}s",
            status,
            solution.iterations,
            solve_time.as_secs_f64()
        );

        if !status.is_optimal() {
            return SolveResult {
                iterations: solution.iterations,
                solve_time,
                ..SolveResult::failed(status)
            };
        }
        SolveResult {
            status,
            objective: program.objective_value(&solution.x),
            primal: solution.x.clone(),
            iterations: solution.iterations,
            solve_time,
        }
    }

    fn name(&self) -> &str {
        "clarabel"
    }
}

fn map_status(status: &SolverStatus) -> SolveStatus {
    match status {
        SolverStatus::Solved => SolveStatus::Optimal,
        SolverStatus::AlmostSolved => {
            log::warn!("solver reached reduced accuracy only; accepting as optimal");
            SolveStatus::Optimal
        }
        SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
            SolveStatus::Infeasible
        }
        SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
            SolveStatus::Unbounded
        }
        other => SolveStatus::SolverError(format!("{:?}", other)),
    }
}

// ---------------------------------------------------------------------------
// Lowering to Clarabel standard form:  min q'x  s.t.  Ax + s = b, s in K
//
// A cone row holding affine expression e = a'x + c becomes  A_i = -a, b_i = c,
// so that s_i = e.
// ---------------------------------------------------------------------------

struct Lowered {
    p: CscMatrix<f64>,
    q: Vec<f64>,
    a: CscMatrix<f64>,
    b: Vec<f64>,
    cones: Vec<SupportedConeT<f64>>,
}

#[derive(Clone, Copy, PartialEq)]
enum RowKind {
    Zero,
    Nonnegative,
}

fn lower(program: &ConicProgram) -> Lowered {
    let n = program.num_variables();
    let mut q = vec![0.0; n];
    for &(col, c) in &program.objective {
        q[col] += c;
    }

    let mut triplets: Vec<(usize, usize, f64)> = Vec::new();
    let mut b: Vec<f64> = Vec::with_capacity(program.num_rows());
    let mut cones: Vec<SupportedConeT<f64>> = Vec::new();
    let mut run: Option<(RowKind, usize)> = None;

    for constraint in &program.constraints {
        match &constraint.cone {
            Cone::Zero(e) | Cone::Nonnegative(e) => {
                let kind = if matches!(constraint.cone, Cone::Zero(_)) {
                    RowKind::Zero
                } else {
                    RowKind::Nonnegative
                };
                run = match run {
                    Some((k, len)) if k == kind => Some((k, len + 1)),
                    Some(done) => {
                        cones.push(flush(done));
                        Some((kind, 1))
                    }
                    None => Some((kind, 1)),
                };
                push_row(e, &mut triplets, &mut b);
            }
            Cone::SecondOrder { head, tail } => {
                if let Some(done) = run.take() {
                    cones.push(flush(done));
                }
                push_row(head, &mut triplets, &mut b);
                for e in tail {
                    push_row(e, &mut triplets, &mut b);
                }
                cones.push(SupportedConeT::SecondOrderConeT(1 + tail.len()));
            }
        }
    }
    if let Some(done) = run.take() {
        cones.push(flush(done));
    }

    let m = b.len();
    log::debug!("lowered program: {} rows, {} columns, {} nonzeros, {} cones", m, n, triplets.len(), cones.len());

    Lowered {
        p: CscMatrix::new(n, n, vec![0; n + 1], Vec::new(), Vec::new()),
        q,
        a: csc_from_triplets(m, n, triplets),
        b,
        cones,
    }
}

fn push_row(expr: &AffineExpr, triplets: &mut Vec<(usize, usize, f64)>, b: &mut Vec<f64>) {
    let row = b.len();
    for &(col, coef) in &expr.terms {
        if coef != 0.0 {
            triplets.push((row, col, -coef));
        }
    }
    b.push(expr.constant);
}

fn flush((kind, len): (RowKind, usize)) -> SupportedConeT<f64> {
    match kind {
        RowKind::Zero => SupportedConeT::ZeroConeT(len),
        RowKind::Nonnegative => SupportedConeT::NonnegativeConeT(len),
    }
}

/// Compressed sparse column matrix from (row, col, value) triplets.
/// Duplicate entries are summed.
fn csc_from_triplets(m: usize, n: usize, mut triplets: Vec<(usize, usize, f64)>) -> CscMatrix<f64> {
    let (colptr, rowval, nzval) = compress_columns(n, &mut triplets);
    CscMatrix::new(m, n, colptr, rowval, nzval)
}

fn compress_columns(n: usize, triplets: &mut [(usize, usize, f64)]) -> (Vec<usize>, Vec<usize>, Vec<f64>) {
    triplets.sort_by(|x, y| (x.1, x.0).cmp(&(y.1, y.0)));

    let mut colptr = vec![0usize; n + 1];
    let mut rowval: Vec<usize> = Vec::with_capacity(triplets.len());
    let mut nzval: Vec<f64> = Vec::with_capacity(triplets.len());
    let mut last: Option<(usize, usize)> = None;

    for &(r, c, v) in triplets.iter() {
        if last == Some((r, c)) {
            if let Some(tail) = nzval.last_mut() {
                *tail += v;
            }
            continue;
        }
        rowval.push(r);
        nzval.push(v);
        colptr[c + 1] += 1;
        last = Some((r, c));
    }
    for j in 0..n {
        colptr[j + 1] += colptr[j];
    }
    (colptr, rowval, nzval)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guidance::program::{ConstraintKind, VariableLayout};

    fn pin_columns(program: &mut ConicProgram, cols: std::ops::Range<usize>) {
        for col in cols {
            program.push(ConstraintKind::InitialState, Cone::Zero(AffineExpr::var(col)));
        }
    }

    #[test]
    fn compress_sums_duplicates_and_orders_by_column() {
        let mut t = vec![(1, 1, 2.0), (0, 0, 1.0), (1, 1, 3.0), (2, 0, 4.0)];
        let (colptr, rowval, nzval) = compress_columns(3, &mut t);
        assert_eq!(colptr, vec![0, 2, 3, 3]);
        assert_eq!(rowval, vec![0, 2, 1]);
        assert_eq!(nzval, vec![1.0, 4.0, 5.0]);
    }

    #[test]
    fn lowering_groups_adjacent_linear_rows() {
        let mut program = ConicProgram::new(VariableLayout::new(1));
        program.push(ConstraintKind::InitialState, Cone::Zero(AffineExpr::var(0).plus(-1.0)));
        program.push(ConstraintKind::InitialState, Cone::Zero(AffineExpr::var(1)));
        program.push(ConstraintKind::MinAltitude, Cone::Nonnegative(AffineExpr::var(2)));
        program.push(
            ConstraintKind::ThrustBound,
            Cone::SecondOrder {
                head: AffineExpr::constant(5.0),
                tail: vec![AffineExpr::var(3), AffineExpr::var(4)],
            },
        );
        program.push(ConstraintKind::MinAltitude, Cone::Nonnegative(AffineExpr::var(5)));

        let lowered = lower(&program);
        // b carries the expression constant, so s = b - Ax = e
        assert_eq!(lowered.b, vec![-1.0, 0.0, 0.0, 5.0, 0.0, 0.0, 0.0]);
        let dims: Vec<String> = lowered.cones.iter().map(|c| format!("{:?}", c)).collect();
        assert_eq!(dims.len(), 4);
        assert!(dims[0].contains("ZeroConeT(2)"), "{:?}", dims);
        assert!(dims[1].contains("NonnegativeConeT(1)"), "{:?}", dims);
        assert!(dims[2].contains("SecondOrderConeT(3)"), "{:?}", dims);
        assert!(dims[3].contains("NonnegativeConeT(1)"), "{:?}", dims);
    }

    #[test]
    fn solves_a_tiny_socp() {
        // min t  s.t. |(x - 3, y - 4)| <= t, on a 1-step layout using columns 0..3
        let layout = VariableLayout::new(1);
        let mut program = ConicProgram::new(layout);
        program.objective = vec![(2, 1.0)];
        program.push(
            ConstraintKind::ThrustEpigraph,
            Cone::SecondOrder {
                head: AffineExpr::var(2),
                tail: vec![AffineExpr::var(0).plus(-3.0), AffineExpr::var(1).plus(-4.0)],
            },
        );
        // x = y = 0, so t* = |(3, 4)| = 5
        program.push(ConstraintKind::InitialState, Cone::Zero(AffineExpr::var(0)));
        program.push(ConstraintKind::InitialState, Cone::Zero(AffineExpr::var(1)));
        pin_columns(&mut program, 3..layout.len());

        let result = ClarabelSolver::default().solve(&program);
        assert_eq!(result.status, SolveStatus::Optimal);
        assert!((result.objective - 5.0).abs() < 1e-6, "objective {}", result.objective);
        assert!((result.primal[2] - 5.0).abs() < 1e-6);
    }

    #[test]
    fn status_mapping_covers_every_outcome() {
        assert_eq!(map_status(&SolverStatus::Solved), SolveStatus::Optimal);
        assert_eq!(map_status(&SolverStatus::AlmostSolved), SolveStatus::Optimal);
        assert_eq!(map_status(&SolverStatus::PrimalInfeasible), SolveStatus::Infeasible);
        assert_eq!(map_status(&SolverStatus::AlmostPrimalInfeasible), SolveStatus::Infeasible);
        assert_eq!(map_status(&SolverStatus::DualInfeasible), SolveStatus::Unbounded);
        assert_eq!(map_status(&SolverStatus::AlmostDualInfeasible), SolveStatus::Unbounded);
        assert_eq!(
            map_status(&SolverStatus::MaxIterations),
            SolveStatus::SolverError("MaxIterations".into())
        );
        assert_eq!(
            map_status(&SolverStatus::NumericalError),
            SolveStatus::SolverError("NumericalError".into())
        );
        assert_eq!(map_status(&SolverStatus::MaxIterations).to_string(), "solver-error (MaxIterations)");
    }

    #[test]
    fn reports_infeasible() {
        let layout = VariableLayout::new(1);
        let mut program = ConicProgram::new(layout);
        program.push(ConstraintKind::InitialState, Cone::Zero(AffineExpr::var(0).plus(-1.0)));
        program.push(ConstraintKind::MinAltitude, Cone::Nonnegative(AffineExpr::var(0).plus(-2.0)));
        pin_columns(&mut program, 1..layout.len());
        let result = ClarabelSolver::default().solve(&program);
        assert_eq!(result.status, SolveStatus::Infeasible);
        assert!(result.primal.is_empty());
    }
}
