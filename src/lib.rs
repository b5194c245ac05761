//! Powered-descent trajectory generation.
//!
//! Two interchangeable [`trajectory::TrajectorySource`]s produce the same
//! time-indexed trajectory: a fuel-optimal convex guidance solve
//! ([`guidance::GfoldGuidance`]) and a fixed-thrust free-flight integrator
//! ([`sim::FreeflightSource`]). Axis convention: index 2 (`z`) is altitude.

pub mod control;
pub mod dynamics;
pub mod error;
pub mod guidance;
pub mod io;
pub mod playback;
pub mod scenario;
pub mod sim;
pub mod solver;
pub mod trajectory;

pub use error::{ControlError, GuidanceError, LoadError, ScenarioError};
pub use playback::{PlaybackInterpolator, PlaybackSample};
pub use scenario::{ScenarioConfig, ScenarioManifest};
pub use solver::{ClarabelSolver, ConvexSolver, SolveResult, SolveStatus};
pub use trajectory::{Termination, Trajectory, TrajectorySource};
