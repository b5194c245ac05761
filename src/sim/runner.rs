use crate::error::GuidanceError;
use crate::scenario::{FreeflightSettings, ScenarioConfig};
use crate::sim::event::{default_detectors, FlightEvent};
use crate::sim::freeflight::{step, FreeflightConfig, PhysicsState};
use crate::trajectory::{Termination, Trajectory, TrajectorySource};

// ---------------------------------------------------------------------------
// Batch free-flight run
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FreeflightRun {
    pub states: Vec<PhysicsState>,
    pub events: Vec<FlightEvent>,
    pub trajectory: Trajectory,
}

impl FreeflightRun {
    pub fn final_state(&self) -> &PhysicsState {
        // states always holds at least the initial state
        &self.states[self.states.len() - 1]
    }
}

/// Tick the integrator from `initial` until a terminal flag is set or
/// `settings.max_time` elapses.
pub fn run_freeflight(
    initial: PhysicsState,
    config: &FreeflightConfig,
    settings: &FreeflightSettings,
) -> FreeflightRun {
    let dt = settings.tick;
    let max_ticks = if dt > 0.0 { (settings.max_time / dt).ceil() as usize } else { 0 };

    let mut detectors = default_detectors();
    let mut states = Vec::with_capacity(max_ticks.min(100_000) + 1);
    let mut events = Vec::new();
    let mut state = initial;
    states.push(state.clone());

    for _ in 0..max_ticks {
        if state.is_terminal() {
            break;
        }
        let next = step(&state, config, dt, settings.ground_height);
        for det in detectors.iter_mut() {
            if let Some(kind) = det.check(&state, &next) {
                log::debug!("t={:.2}s event {:?}", next.time, kind);
                events.push(FlightEvent { time: next.time, kind, state: next.clone() });
            }
        }
        states.push(next.clone());
        state = next;
    }

    let termination = if state.has_landed_safely {
        Termination::LandedSafely
    } else if state.has_crashed {
        Termination::Crashed
    } else {
        Termination::TimedOut
    };
    log::info!(
        "free flight ended at t={:.2}s: {:?} ({} ticks)",
        state.time,
        termination,
        states.len() - 1
    );

    let trajectory = to_trajectory(&states, dt, termination);
    FreeflightRun { states, events, trajectory }
}

/// Sample k's thrust is what drove the tick from k to k+1.
fn to_trajectory(states: &[PhysicsState], dt: f64, termination: Termination) -> Trajectory {
    let positions = states.iter().map(|s| s.pos).collect();
    let velocities = states.iter().map(|s| s.vel).collect();
    let thrusts: Vec<_> = states.iter().skip(1).map(|s| s.thrust).collect();
    let fuel_used = thrusts.iter().map(|f| f.norm()).sum::<f64>() * dt;
    Trajectory { step: dt, positions, velocities, thrusts, fuel_used, termination }
}

// ---------------------------------------------------------------------------
// Free flight as a trajectory source
// ---------------------------------------------------------------------------

pub struct FreeflightSource {
    pub settings: FreeflightSettings,
}

impl FreeflightSource {
    pub fn new(settings: FreeflightSettings) -> Self {
        Self { settings }
    }
}

impl TrajectorySource for FreeflightSource {
    /// Crashing is a valid outcome reported in `termination`, not an error.
    fn produce(&mut self, scenario: &ScenarioConfig) -> Result<Trajectory, GuidanceError> {
        scenario.validate()?;
        self.settings.validate()?;
        let config = FreeflightConfig::from_scenario(scenario, &self.settings);
        let run = run_freeflight(PhysicsState::from_scenario(scenario), &config, &self.settings);
        Ok(run.trajectory)
    }

    fn name(&self) -> &str {
        "free flight"
    }
}
