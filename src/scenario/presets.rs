use nalgebra::Vector3;

use super::config::{OperationalConstraints, ScenarioConfig};
use super::manifest::{FreeflightSettings, ScenarioManifest, SAFE_LANDING_SPEED};

pub const MARS_GRAVITY: f64 = 3.7114;
pub const MOON_GRAVITY: f64 = 1.62;

/// Names accepted by [`by_name`].
pub const PRESET_NAMES: [&str; 3] = ["mars-descent", "lunar-hop", "simple-drop"];

pub fn by_name(name: &str) -> Option<ScenarioManifest> {
    match name {
        "mars-descent" => Some(mars_descent()),
        "lunar-hop" => Some(lunar_hop()),
        "simple-drop" => Some(simple_drop()),
        _ => None,
    }
}

/// Mars powered descent from 1.5 km with a lateral divert ("Ares").
pub fn mars_descent() -> ScenarioManifest {
    ScenarioManifest {
        name: "Ares Powered Descent".into(),
        guidance: ScenarioConfig {
            steps: 60,
            step_duration: 1.0,
            gravity: MARS_GRAVITY,
            mass: 1905.0,
            max_thrust: 16_573.0,   // 6 x 3.1 kN canted 27 deg
            min_altitude: 0.0,
            glide_slope: Some(80.0_f64.to_radians()),
            initial_position: Vector3::new(400.0, 300.0, 1500.0),
            initial_velocity: Vector3::new(-20.0, 10.0, -60.0),
            target_position: Vector3::zeros(),
            constraints: OperationalConstraints::default(),
        },
        freeflight: Some(FreeflightSettings {
            burn_duration: 20.0,
            tick: 0.1,
            ground_height: 0.0,
            safe_landing_speed: SAFE_LANDING_SPEED,
            max_time: 600.0,
        }),
    }
}

/// Short lunar hop onto a nearby pad.
pub fn lunar_hop() -> ScenarioManifest {
    ScenarioManifest {
        name: "Lunar Hop".into(),
        guidance: ScenarioConfig {
            steps: 40,
            step_duration: 0.5,
            gravity: MOON_GRAVITY,
            mass: 2000.0,
            max_thrust: 9000.0,
            min_altitude: 0.0,
            glide_slope: Some(70.0_f64.to_radians()),
            initial_position: Vector3::new(-50.0, 20.0, 200.0),
            initial_velocity: Vector3::new(2.0, 0.0, -8.0),
            target_position: Vector3::zeros(),
            constraints: OperationalConstraints::default(),
        },
        freeflight: Some(FreeflightSettings {
            burn_duration: 6.0,
            ..FreeflightSettings::default()
        }),
    }
}

/// Heavy lander dropped from 25 m with a 10 s full-thrust burn.
pub fn simple_drop() -> ScenarioManifest {
    ScenarioManifest {
        name: "Simple Drop".into(),
        guidance: ScenarioConfig {
            steps: 10,
            step_duration: 1.0,
            gravity: 3.72,
            mass: 25_000.0,
            max_thrust: 800_000.0,
            min_altitude: 0.0,
            glide_slope: None,
            initial_position: Vector3::new(0.0, 0.0, 25.0),
            initial_velocity: Vector3::zeros(),
            target_position: Vector3::zeros(),
            constraints: OperationalConstraints::default(),
        },
        freeflight: Some(FreeflightSettings {
            burn_duration: 10.0,
            tick: 0.1,
            ground_height: 0.0,
            safe_landing_speed: SAFE_LANDING_SPEED,
            max_time: 600.0,
        }),
    }
}
