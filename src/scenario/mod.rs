pub mod config;
pub mod manifest;
pub mod presets;

pub use config::{OperationalConstraints, ScenarioBuilder, ScenarioConfig};
pub use manifest::{load_manifest, FreeflightSettings, ScenarioManifest, SAFE_LANDING_SPEED};
