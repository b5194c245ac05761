pub mod event;
pub mod freeflight;
pub mod runner;

pub use freeflight::{step, FreeflightConfig, PhysicsState};
pub use runner::{run_freeflight, FreeflightRun, FreeflightSource};
