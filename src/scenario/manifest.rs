use std::path::Path;

use serde::{Deserialize, Serialize};

use super::config::{positive, ScenarioConfig};
use crate::error::{LoadError, ScenarioError};

// ---------------------------------------------------------------------------
// Free-flight run settings
// ---------------------------------------------------------------------------

/// Safe-landing threshold on touchdown vertical speed, m/s.
pub const SAFE_LANDING_SPEED: f64 = 2.0;

/// Settings for the fixed-thrust free-flight mode. Vehicle mass, gravity and
/// max thrust come from the accompanying [`ScenarioConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeflightSettings {
    pub burn_duration: f64,        // s, engine on while elapsed < burn_duration
    #[serde(default = "default_tick")]
    pub tick: f64,                 // s, integrator step
    #[serde(default)]
    pub ground_height: f64,        // m
    #[serde(default = "default_safe_speed")]
    pub safe_landing_speed: f64,   // m/s
    #[serde(default = "default_max_time")]
    pub max_time: f64,             // s, hard stop for batch runs
}

fn default_tick() -> f64 {
    0.1
}

fn default_safe_speed() -> f64 {
    SAFE_LANDING_SPEED
}

fn default_max_time() -> f64 {
    600.0
}

impl FreeflightSettings {
    /// Reject settings that would stall the integrator or mislabel touchdown.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        positive("tick", self.tick)?;
        positive("max_time", self.max_time)?;
        positive("safe_landing_speed", self.safe_landing_speed)?;
        if !self.burn_duration.is_finite() {
            return Err(ScenarioError::NonFinite { field: "burn_duration" });
        }
        if self.burn_duration < 0.0 {
            return Err(ScenarioError::Negative { field: "burn_duration", value: self.burn_duration });
        }
        if !self.ground_height.is_finite() {
            return Err(ScenarioError::NonFinite { field: "ground_height" });
        }
        Ok(())
    }
}

impl Default for FreeflightSettings {
    fn default() -> Self {
        Self {
            burn_duration: 0.0,
            tick: default_tick(),
            ground_height: 0.0,
            safe_landing_speed: SAFE_LANDING_SPEED,
            max_time: default_max_time(),
        }
    }
}

// ---------------------------------------------------------------------------
// Scenario manifest (TOML or YAML on disk)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioManifest {
    pub name: String,
    pub guidance: ScenarioConfig,
    #[serde(default)]
    pub freeflight: Option<FreeflightSettings>,
}

impl ScenarioManifest {
    /// Validate the guidance scenario and, when present, the free-flight settings.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        self.guidance.validate()?;
        if let Some(settings) = &self.freeflight {
            settings.validate()?;
        }
        Ok(())
    }

    /// Free-flight settings, falling back to defaults when the manifest has none.
    pub fn freeflight_settings(&self) -> FreeflightSettings {
        self.freeflight.clone().unwrap_or_default()
    }
}

/// Parse a manifest from TOML text and validate it.
pub fn parse_toml(contents: &str) -> Result<ScenarioManifest, LoadError> {
    let manifest: ScenarioManifest = toml::from_str(contents)?;
    manifest.validate()?;
    Ok(manifest)
}

/// Parse a manifest from YAML text and validate it.
pub fn parse_yaml(contents: &str) -> Result<ScenarioManifest, LoadError> {
    let manifest: ScenarioManifest = serde_yaml::from_str(contents)?;
    manifest.validate()?;
    Ok(manifest)
}

/// Load a manifest, choosing the format from the file extension.
pub fn load_manifest<P: AsRef<Path>>(path: P) -> Result<ScenarioManifest, LoadError> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    let contents = std::fs::read_to_string(path)?;
    let manifest = match ext.as_str() {
        "toml" => parse_toml(&contents)?,
        "yaml" | "yml" => parse_yaml(&contents)?,
        other => return Err(LoadError::Extension(other.to_string())),
    };
    log::debug!("loaded scenario '{}' from {}", manifest.name, path.display());
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScenarioError;
    use std::io::Write;

    const TOML_SCENARIO: &str = r#"
name = "Unit Drop"

[guidance]
steps = 2
step_duration = 1.0
gravity = 0.0
mass = 1.0
max_thrust = 10.0
min_altitude = 0.0
initial_position = [0.0, 0.0, 10.0]
initial_velocity = [0.0, 0.0, 0.0]
target_position = [0.0, 0.0, 0.0]

[guidance.constraints]
upward_thrust_only = false

[freeflight]
burn_duration = 10.0
"#;

    #[test]
    fn parses_toml_with_defaults() {
        let m = parse_toml(TOML_SCENARIO).unwrap();
        assert_eq!(m.name, "Unit Drop");
        assert_eq!(m.guidance.steps, 2);
        assert_eq!(m.guidance.initial_position.z, 10.0);
        assert_eq!(m.guidance.glide_slope, None);
        assert!(!m.guidance.constraints.upward_thrust_only);
        assert!(m.guidance.constraints.monotonic_descent);

        let ff = m.freeflight_settings();
        assert_eq!(ff.burn_duration, 10.0);
        assert_eq!(ff.tick, 0.1);
        assert_eq!(ff.safe_landing_speed, SAFE_LANDING_SPEED);
    }

    #[test]
    fn parses_yaml() {
        let yaml = r#"
name: Yaml Hop
guidance:
  steps: 10
  step_duration: 0.5
  gravity: 1.62
  mass: 500.0
  max_thrust: 3000.0
  min_altitude: 0.0
  glide_slope: 1.0
  initial_position: [5.0, 0.0, 50.0]
  initial_velocity: [0.0, 0.0, -1.0]
  target_position: [0.0, 0.0, 0.0]
"#;
        let m = parse_yaml(yaml).unwrap();
        assert_eq!(m.guidance.glide_slope, Some(1.0));
        assert!(m.freeflight.is_none());
    }

    #[test]
    fn invalid_scenario_is_rejected_on_load() {
        let bad = TOML_SCENARIO.replace("steps = 2", "steps = 0");
        match parse_toml(&bad) {
            Err(LoadError::Invalid(ScenarioError::StepCount(0))) => {}
            other => panic!("expected StepCount error, got {:?}", other),
        }
    }

    #[test]
    fn malformed_freeflight_settings_are_rejected_on_load() {
        let cases = [
            ("burn_duration = 10.0", "burn_duration = 10.0\ntick = 0.0", "tick"),
            ("burn_duration = 10.0", "burn_duration = 10.0\ntick = nan", "tick"),
            ("burn_duration = 10.0", "burn_duration = 10.0\nmax_time = -5.0", "max_time"),
            ("burn_duration = 10.0", "burn_duration = 10.0\nsafe_landing_speed = -1.0", "safe_landing_speed"),
        ];
        for (from, to, field) in cases {
            match parse_toml(&TOML_SCENARIO.replace(from, to)) {
                Err(LoadError::Invalid(ScenarioError::NonPositive { field: f, .. })) => assert_eq!(f, field),
                other => panic!("{}: expected NonPositive, got {:?}", field, other),
            }
        }

        let negative_burn = TOML_SCENARIO.replace("burn_duration = 10.0", "burn_duration = -1.0");
        assert!(matches!(
            parse_toml(&negative_burn),
            Err(LoadError::Invalid(ScenarioError::Negative { field: "burn_duration", .. }))
        ));
    }

    #[test]
    fn freeflight_settings_validate_each_field() {
        assert!(FreeflightSettings::default().validate().is_ok());

        let bad = |edit: fn(&mut FreeflightSettings)| {
            let mut s = FreeflightSettings::default();
            edit(&mut s);
            s.validate().unwrap_err()
        };
        assert_eq!(bad(|s| s.tick = 0.0), ScenarioError::NonPositive { field: "tick", value: 0.0 });
        assert_eq!(bad(|s| s.max_time = -1.0), ScenarioError::NonPositive { field: "max_time", value: -1.0 });
        assert_eq!(
            bad(|s| s.safe_landing_speed = 0.0),
            ScenarioError::NonPositive { field: "safe_landing_speed", value: 0.0 }
        );
        assert_eq!(bad(|s| s.burn_duration = f64::INFINITY), ScenarioError::NonFinite { field: "burn_duration" });
        assert_eq!(bad(|s| s.ground_height = f64::NAN), ScenarioError::NonFinite { field: "ground_height" });
    }

    #[test]
    fn load_manifest_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drop.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(TOML_SCENARIO.as_bytes()).unwrap();
        let m = load_manifest(&path).unwrap();
        assert_eq!(m.guidance.max_thrust, 10.0);

        let other = dir.path().join("drop.json");
        std::fs::write(&other, "{}").unwrap();
        assert!(matches!(load_manifest(&other), Err(LoadError::Extension(_))));
    }
}
