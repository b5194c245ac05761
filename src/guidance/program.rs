//! Solver-neutral description of a second-order cone program.
//!
//! Every constraint is an affine expression (or a stack of them) that must
//! lie in a cone: zero, nonnegative orthant, or second-order cone.

// ---------------------------------------------------------------------------
// Decision variables
// ---------------------------------------------------------------------------

/// Identity of one scalar decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variable {
    Position { step: usize, axis: usize },
    Velocity { step: usize, axis: usize },
    Thrust { step: usize, axis: usize },
    /// Epigraph variable bounding |F[step]|.
    ThrustNorm { step: usize },
}

/// Column layout for a K-step problem: P block, V block, F block, sigma block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableLayout {
    steps: usize,
}

impl VariableLayout {
    pub fn new(steps: usize) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Total number of scalar columns: 6(K+1) + 4K.
    pub fn len(&self) -> usize {
        6 * (self.steps + 1) + 4 * self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn position(&self, step: usize, axis: usize) -> usize {
        debug_assert!(step <= self.steps && axis < 3);
        3 * step + axis
    }

    pub fn velocity(&self, step: usize, axis: usize) -> usize {
        debug_assert!(step <= self.steps && axis < 3);
        3 * (self.steps + 1) + 3 * step + axis
    }

    pub fn thrust(&self, step: usize, axis: usize) -> usize {
        debug_assert!(step < self.steps && axis < 3);
        6 * (self.steps + 1) + 3 * step + axis
    }

    pub fn thrust_norm(&self, step: usize) -> usize {
        debug_assert!(step < self.steps);
        6 * (self.steps + 1) + 3 * self.steps + step
    }

    /// Column of a variable, or `None` if it is outside this layout.
    pub fn index_of(&self, var: Variable) -> Option<usize> {
        let k = self.steps;
        match var {
            Variable::Position { step, axis } if step <= k && axis < 3 => Some(self.position(step, axis)),
            Variable::Velocity { step, axis } if step <= k && axis < 3 => Some(self.velocity(step, axis)),
            Variable::Thrust { step, axis } if step < k && axis < 3 => Some(self.thrust(step, axis)),
            Variable::ThrustNorm { step } if step < k => Some(self.thrust_norm(step)),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Affine expressions
// ---------------------------------------------------------------------------

/// `sum(coef * x[col]) + constant`, sparse.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AffineExpr {
    pub terms: Vec<(usize, f64)>,
    pub constant: f64,
}

impl AffineExpr {
    pub fn constant(c: f64) -> Self {
        Self { terms: Vec::new(), constant: c }
    }

    pub fn var(col: usize) -> Self {
        Self { terms: vec![(col, 1.0)], constant: 0.0 }
    }

    pub fn term(mut self, col: usize, coef: f64) -> Self {
        self.terms.push((col, coef));
        self
    }

    pub fn plus(mut self, c: f64) -> Self {
        self.constant += c;
        self
    }

    pub fn scaled(mut self, factor: f64) -> Self {
        for t in &mut self.terms {
            t.1 *= factor;
        }
        self.constant *= factor;
        self
    }

    pub fn negated(self) -> Self {
        self.scaled(-1.0)
    }

    /// Evaluate at a primal point.
    pub fn eval(&self, x: &[f64]) -> f64 {
        self.terms.iter().map(|&(col, c)| c * x[col]).sum::<f64>() + self.constant
    }
}

// ---------------------------------------------------------------------------
// Constraints
// ---------------------------------------------------------------------------

/// What a constraint enforces, for logging and inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    InitialState,
    FinalState,
    Dynamics,
    MinAltitude,
    Descent,
    ThrustDirection,
    ThrustBound,
    ThrustEpigraph,
    GlideSlope,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cone {
    /// expr == 0
    Zero(AffineExpr),
    /// expr >= 0
    Nonnegative(AffineExpr),
    /// |tail|_2 <= head
    SecondOrder { head: AffineExpr, tail: Vec<AffineExpr> },
}

impl Cone {
    /// Number of scalar rows this cone contributes.
    pub fn dim(&self) -> usize {
        match self {
            Cone::Zero(_) | Cone::Nonnegative(_) => 1,
            Cone::SecondOrder { tail, .. } => 1 + tail.len(),
        }
    }

    /// Signed violation at `x` (zero or negative means satisfied).
    pub fn violation(&self, x: &[f64]) -> f64 {
        match self {
            Cone::Zero(e) => e.eval(x).abs(),
            Cone::Nonnegative(e) => -e.eval(x),
            Cone::SecondOrder { head, tail } => {
                let norm = tail.iter().map(|e| e.eval(x).powi(2)).sum::<f64>().sqrt();
                norm - head.eval(x)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub kind: ConstraintKind,
    pub cone: Cone,
}

// ---------------------------------------------------------------------------
// Program
// ---------------------------------------------------------------------------

/// minimize c'x subject to every constraint's cone membership.
#[derive(Debug, Clone, PartialEq)]
pub struct ConicProgram {
    pub layout: VariableLayout,
    pub objective: Vec<(usize, f64)>,
    pub constraints: Vec<Constraint>,
}

impl ConicProgram {
    pub fn new(layout: VariableLayout) -> Self {
        Self { layout, objective: Vec::new(), constraints: Vec::new() }
    }

    pub fn num_variables(&self) -> usize {
        self.layout.len()
    }

    pub fn num_rows(&self) -> usize {
        self.constraints.iter().map(|c| c.cone.dim()).sum()
    }

    pub fn push(&mut self, kind: ConstraintKind, cone: Cone) {
        self.constraints.push(Constraint { kind, cone });
    }

    pub fn count(&self, kind: ConstraintKind) -> usize {
        self.constraints.iter().filter(|c| c.kind == kind).count()
    }

    pub fn objective_value(&self, x: &[f64]) -> f64 {
        self.objective.iter().map(|&(col, c)| c * x[col]).sum()
    }

    /// Largest constraint violation at `x`, clipped at zero.
    pub fn max_violation(&self, x: &[f64]) -> f64 {
        self.constraints
            .iter()
            .map(|c| c.cone.violation(x))
            .fold(0.0_f64, f64::max)
    }
}
