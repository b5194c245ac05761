use crate::sim::freeflight::PhysicsState;

// ---------------------------------------------------------------------------
// Flight events
// ---------------------------------------------------------------------------

/// Kinds of free-flight events.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    EngineCutoff,
    Apogee,
    Touchdown { speed: f64 },
    Crash { speed: f64 },
}

/// A discrete event that occurred during a run.
#[derive(Debug, Clone)]
pub struct FlightEvent {
    pub time: f64,
    pub kind: EventKind,
    pub state: PhysicsState,
}

/// Passive detectors inspect consecutive states and report events.
pub trait EventDetector {
    fn check(&mut self, prev: &PhysicsState, current: &PhysicsState) -> Option<EventKind>;
}

/// Engine transitions from burning to off.
pub struct EngineCutoffDetector;

impl EventDetector for EngineCutoffDetector {
    fn check(&mut self, prev: &PhysicsState, current: &PhysicsState) -> Option<EventKind> {
        if prev.engine_on && !current.engine_on {
            Some(EventKind::EngineCutoff)
        } else {
            None
        }
    }
}

/// Vertical velocity goes from rising to falling.
pub struct ApogeeDetector;

impl EventDetector for ApogeeDetector {
    fn check(&mut self, prev: &PhysicsState, current: &PhysicsState) -> Option<EventKind> {
        if prev.vel.z > 0.0 && current.vel.z <= 0.0 && !current.is_terminal() {
            Some(EventKind::Apogee)
        } else {
            None
        }
    }
}

/// Ground contact, classified as touchdown or crash. Fires once.
pub struct TouchdownDetector;

impl EventDetector for TouchdownDetector {
    fn check(&mut self, prev: &PhysicsState, current: &PhysicsState) -> Option<EventKind> {
        if prev.is_terminal() {
            return None;
        }
        // a safe landing zeroes velocity, so the impact speed comes from prev
        if current.has_landed_safely {
            Some(EventKind::Touchdown { speed: prev.vel.z.abs() })
        } else if current.has_crashed {
            Some(EventKind::Crash { speed: current.vel.norm() })
        } else {
            None
        }
    }
}

/// Default detector set for a free-flight run.
pub fn default_detectors() -> Vec<Box<dyn EventDetector>> {
    vec![
        Box::new(EngineCutoffDetector),
        Box::new(ApogeeDetector),
        Box::new(TouchdownDetector),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn make_state(alt: f64, vz: f64) -> PhysicsState {
        PhysicsState::new(Vector3::new(0.0, 0.0, alt), Vector3::new(0.0, 0.0, vz))
    }

    #[test]
    fn cutoff_detected() {
        let mut prev = make_state(50.0, 10.0);
        prev.engine_on = true;
        let curr = make_state(51.0, 9.0);
        assert_eq!(EngineCutoffDetector.check(&prev, &curr), Some(EventKind::EngineCutoff));
        assert_eq!(EngineCutoffDetector.check(&curr, &curr), None);
    }

    #[test]
    fn apogee_detected() {
        let prev = make_state(500.0, 1.0);
        let curr = make_state(500.1, -0.5);
        assert_eq!(ApogeeDetector.check(&prev, &curr), Some(EventKind::Apogee));
    }

    #[test]
    fn touchdown_fires_once() {
        let prev = make_state(0.1, -1.5);
        let mut curr = make_state(0.0, 0.0);
        curr.has_landed_safely = true;
        let mut det = TouchdownDetector;
        assert_eq!(det.check(&prev, &curr), Some(EventKind::Touchdown { speed: 1.5 }));
        assert_eq!(det.check(&curr, &curr), None);
    }

    #[test]
    fn crash_reports_impact_speed() {
        let prev = make_state(1.0, -20.0);
        let mut curr = make_state(0.0, -20.5);
        curr.has_crashed = true;
        assert_eq!(TouchdownDetector.check(&prev, &curr), Some(EventKind::Crash { speed: 20.5 }));
    }
}
