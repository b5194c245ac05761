pub mod builder;
pub mod extract;
pub mod gfold;
pub mod program;

pub use builder::{check_boundary_feasibility, GuidanceProblemBuilder};
pub use extract::TrajectoryExtractor;
pub use gfold::GfoldGuidance;
pub use program::{ConicProgram, ConstraintKind, Variable, VariableLayout};
