use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::error::{ControlError, GuidanceError};
use crate::scenario::{FreeflightSettings, ScenarioConfig};
use crate::sim::freeflight::{step, FreeflightConfig, PhysicsState};
use crate::solver::SolveStatus;
use crate::trajectory::Trajectory;

// ---------------------------------------------------------------------------
// Scenario controller: one scenario, one solve in flight, latest wins
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ScenarioStatus {
    Idle,
    Solving,
    Ready,
    /// Carries the underlying reason, never a generic message.
    Failed(String),
    Flying,
    Landed,
    Crashed,
}

impl fmt::Display for ScenarioStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioStatus::Idle => write!(f, "idle"),
            ScenarioStatus::Solving => write!(f, "solving"),
            ScenarioStatus::Ready => write!(f, "ready"),
            ScenarioStatus::Failed(reason) => write!(f, "error: {}", reason),
            ScenarioStatus::Flying => write!(f, "flying"),
            ScenarioStatus::Landed => write!(f, "landed"),
            ScenarioStatus::Crashed => write!(f, "crashed"),
        }
    }
}

/// Proof of a solve request. Only the latest ticket may commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolveTicket(u64);

impl SolveTicket {
    pub fn id(&self) -> u64 {
        self.0
    }
}

struct Flight {
    state: PhysicsState,
    config: FreeflightConfig,
    ground_height: f64,
}

pub struct ScenarioController {
    scenario: ScenarioConfig,
    generation: u64,
    in_flight: Option<u64>,
    status: ScenarioStatus,
    trajectory: Option<Trajectory>,
    flight: Option<Flight>,
}

impl ScenarioController {
    pub fn new(scenario: ScenarioConfig) -> Self {
        Self {
            scenario,
            generation: 0,
            in_flight: None,
            status: ScenarioStatus::Idle,
            trajectory: None,
            flight: None,
        }
    }

    pub fn scenario(&self) -> &ScenarioConfig {
        &self.scenario
    }

    pub fn status(&self) -> &ScenarioStatus {
        &self.status
    }

    pub fn trajectory(&self) -> Option<&Trajectory> {
        self.trajectory.as_ref()
    }

    pub fn physics_state(&self) -> Option<&PhysicsState> {
        self.flight.as_ref().map(|f| &f.state)
    }

    pub fn is_solving(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Replace the scenario. Discards the current trajectory and supersedes
    /// any solve in flight.
    pub fn set_scenario(&mut self, scenario: ScenarioConfig) {
        self.scenario = scenario;
        self.reset();
    }

    /// Drop all results and supersede any pending solve.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.in_flight = None;
        self.trajectory = None;
        self.flight = None;
        self.status = ScenarioStatus::Idle;
    }

    /// Request a solve. Fails if one is already pending for this scenario.
    pub fn begin_solve(&mut self) -> Result<SolveTicket, ControlError> {
        if let Some(id) = self.in_flight {
            return Err(ControlError::SolveInFlight(id));
        }
        self.generation += 1;
        self.in_flight = Some(self.generation);
        self.flight = None;
        self.status = ScenarioStatus::Solving;
        Ok(SolveTicket(self.generation))
    }

    /// Commit a finished solve. Returns false, leaving state untouched, when
    /// the ticket was superseded.
    pub fn commit(&mut self, ticket: SolveTicket, result: Result<Trajectory, GuidanceError>) -> bool {
        if self.in_flight != Some(ticket.0) {
            log::warn!(
                "discarding stale solve result (ticket {}, current generation {})",
                ticket.0,
                self.generation
            );
            return false;
        }
        self.in_flight = None;
        match result {
            Ok(trajectory) => {
                self.trajectory = Some(trajectory);
                self.status = ScenarioStatus::Ready;
            }
            Err(err) => {
                self.trajectory = None;
                self.status = ScenarioStatus::Failed(err.to_string());
            }
        }
        true
    }

    /// Start a fixed-thrust free flight from the scenario's initial state.
    pub fn start_freeflight(&mut self, settings: &FreeflightSettings) -> Result<(), GuidanceError> {
        self.scenario.validate()?;
        settings.validate()?;
        self.generation += 1;
        self.in_flight = None;
        self.trajectory = None;
        self.flight = Some(Flight {
            state: PhysicsState::from_scenario(&self.scenario),
            config: FreeflightConfig::from_scenario(&self.scenario, settings),
            ground_height: settings.ground_height,
        });
        self.status = ScenarioStatus::Flying;
        Ok(())
    }

    /// Advance the free flight by one tick. Terminal states stay frozen.
    pub fn tick(&mut self, dt: f64) -> Result<&PhysicsState, ControlError> {
        let flight = self.flight.as_mut().ok_or(ControlError::NotFlying)?;
        if !flight.state.is_terminal() {
            flight.state = step(&flight.state, &flight.config, dt, flight.ground_height);
            if flight.state.has_landed_safely {
                log::info!("landed safely at t={:.2}s", flight.state.time);
                self.status = ScenarioStatus::Landed;
            } else if flight.state.has_crashed {
                log::info!("crashed at t={:.2}s, {:.1} m/s", flight.state.time, flight.state.vel.norm());
                self.status = ScenarioStatus::Crashed;
            }
        }
        Ok(&flight.state)
    }
}

// ---------------------------------------------------------------------------
// Worker-side solve wrapper
// ---------------------------------------------------------------------------

/// Run a solve job so that it always yields a committable result. A panic
/// inside the job becomes a solver error instead of a lost ticket.
pub fn run_solve_job<F>(job: F) -> Result<Trajectory, GuidanceError>
where
    F: FnOnce() -> Result<Trajectory, GuidanceError>,
{
    panic::catch_unwind(AssertUnwindSafe(job)).unwrap_or_else(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        log::error!("solve job panicked: {}", reason);
        Err(GuidanceError::SolveFailure {
            status: SolveStatus::SolverError(format!("panic: {}", reason)),
        })
    })
}
