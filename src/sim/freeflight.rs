use nalgebra::Vector3;
use serde::Serialize;

use crate::scenario::{FreeflightSettings, ScenarioConfig};

// ---------------------------------------------------------------------------
// Free-flight state: running -> crashed | landed (both absorbing)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhysicsState {
    pub time: f64,               // s since start
    pub pos: Vector3<f64>,       // m, z = altitude
    pub vel: Vector3<f64>,       // m/s
    pub thrust: Vector3<f64>,    // N, applied over the tick that produced this state
    pub engine_on: bool,
    pub has_crashed: bool,
    pub has_landed_safely: bool,
}

impl PhysicsState {
    pub fn new(pos: Vector3<f64>, vel: Vector3<f64>) -> Self {
        Self {
            time: 0.0,
            pos,
            vel,
            thrust: Vector3::zeros(),
            engine_on: false,
            has_crashed: false,
            has_landed_safely: false,
        }
    }

    pub fn from_scenario(scenario: &ScenarioConfig) -> Self {
        Self::new(scenario.initial_position, scenario.initial_velocity)
    }

    pub fn is_terminal(&self) -> bool {
        self.has_crashed || self.has_landed_safely
    }
}

// ---------------------------------------------------------------------------
// Fixed-thrust vehicle parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct FreeflightConfig {
    pub gravity: f64,              // m/s^2
    pub mass: f64,                 // kg
    pub max_thrust: f64,           // N, vertical while the engine burns
    pub burn_duration: f64,        // s
    pub safe_landing_speed: f64,   // m/s
}

impl FreeflightConfig {
    pub fn from_scenario(scenario: &ScenarioConfig, settings: &FreeflightSettings) -> Self {
        Self {
            gravity: scenario.gravity,
            mass: scenario.mass,
            max_thrust: scenario.max_thrust,
            burn_duration: settings.burn_duration,
            safe_landing_speed: settings.safe_landing_speed,
        }
    }
}

// ---------------------------------------------------------------------------
// One tick of semi-implicit Euler with ground contact
// ---------------------------------------------------------------------------

/// Advance `state` by `dt`. A terminal state is returned unchanged.
///
/// Velocity is updated first from this tick's acceleration, then position
/// from the new velocity. Horizontal axes are unforced.
pub fn step(state: &PhysicsState, config: &FreeflightConfig, dt: f64, ground_height: f64) -> PhysicsState {
    if state.is_terminal() {
        return state.clone();
    }

    let engine_on = state.time < config.burn_duration;
    let thrust = if engine_on {
        Vector3::new(0.0, 0.0, config.max_thrust)
    } else {
        Vector3::zeros()
    };
    let accel_z = thrust.z / config.mass - config.gravity;

    let mut vel = state.vel;
    vel.z += accel_z * dt;
    let pos = state.pos + vel * dt;

    let mut next = PhysicsState {
        time: state.time + dt,
        pos,
        vel,
        thrust,
        engine_on,
        has_crashed: false,
        has_landed_safely: false,
    };

    if next.pos.z <= ground_height && next.vel.z < 0.0 {
        next.pos.z = ground_height;
        if next.vel.z.abs() < config.safe_landing_speed {
            next.has_landed_safely = true;
            next.vel = Vector3::zeros();
        } else {
            next.has_crashed = true;
        }
    }
    next
}
