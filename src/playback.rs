use nalgebra::Vector3;

use crate::trajectory::Trajectory;

// ---------------------------------------------------------------------------
// Continuous playback over a discrete trajectory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSample {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub thrust: Vector3<f64>,
}

/// Position is interpolated linearly between bracketing samples; velocity
/// and thrust hold the lower sample's value. Time is clamped to the
/// trajectory, never extrapolated.
pub struct PlaybackInterpolator<'a> {
    trajectory: &'a Trajectory,
}

impl<'a> PlaybackInterpolator<'a> {
    pub fn new(trajectory: &'a Trajectory) -> Self {
        Self { trajectory }
    }

    /// Largest valid playback time, in sample-index units.
    pub fn end(&self) -> f64 {
        self.trajectory.positions.len().saturating_sub(1) as f64
    }

    /// Sample at playback time `t`, measured in steps (t = k is sample k).
    pub fn sample(&self, t: f64) -> PlaybackSample {
        let traj = self.trajectory;
        let Some(last) = traj.positions.len().checked_sub(1) else {
            return PlaybackSample {
                position: Vector3::zeros(),
                velocity: Vector3::zeros(),
                thrust: Vector3::zeros(),
            };
        };

        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, last as f64) };
        let i = (t.floor() as usize).min(last);
        let frac = t - i as f64;

        let position = if i == last || frac == 0.0 {
            traj.positions[i]
        } else {
            traj.positions[i].lerp(&traj.positions[i + 1], frac)
        };
        let velocity = traj.velocities.get(i).copied().unwrap_or_else(Vector3::zeros);
        let thrust = match traj.thrusts.len() {
            0 => Vector3::zeros(),
            n => traj.thrusts[i.min(n - 1)],
        };
        PlaybackSample { position, velocity, thrust }
    }

    /// Sample at `seconds` of mission time.
    pub fn sample_at_seconds(&self, seconds: f64) -> PlaybackSample {
        let step = self.trajectory.step;
        if step > 0.0 {
            self.sample(seconds / step)
        } else {
            self.sample(0.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trajectory::Termination;
    use approx::assert_relative_eq;

    fn ramp() -> Trajectory {
        Trajectory {
            step: 2.0,
            positions: vec![
                Vector3::new(0.0, 0.0, 30.0),
                Vector3::new(1.0, 0.0, 20.0),
                Vector3::new(1.0, 2.0, 0.0),
            ],
            velocities: vec![
                Vector3::new(0.0, 0.0, -5.0),
                Vector3::new(0.0, 0.0, -10.0),
                Vector3::zeros(),
            ],
            thrusts: vec![Vector3::new(0.0, 0.0, 100.0), Vector3::new(0.0, 0.0, 300.0)],
            fuel_used: 800.0,
            termination: Termination::Planned,
        }
    }

    #[test]
    fn exact_at_integer_times() {
        let traj = ramp();
        let p = PlaybackInterpolator::new(&traj);
        for k in 0..3 {
            let s = p.sample(k as f64);
            assert_eq!(s.position, traj.positions[k]);
            assert_eq!(s.velocity, traj.velocities[k]);
        }
    }

    #[test]
    fn position_blends_velocity_and_thrust_hold() {
        let traj = ramp();
        let s = PlaybackInterpolator::new(&traj).sample(0.25);
        assert_relative_eq!(s.position, Vector3::new(0.25, 0.0, 27.5), epsilon = 1e-12);
        assert_eq!(s.velocity, traj.velocities[0]);
        assert_eq!(s.thrust, traj.thrusts[0]);

        let s = PlaybackInterpolator::new(&traj).sample(1.5);
        assert_relative_eq!(s.position, Vector3::new(1.0, 1.0, 10.0), epsilon = 1e-12);
        assert_eq!(s.thrust, traj.thrusts[1]);
    }

    #[test]
    fn clamps_both_ends() {
        let traj = ramp();
        let p = PlaybackInterpolator::new(&traj);
        assert_eq!(p.sample(-3.0).position, traj.positions[0]);
        assert_eq!(p.sample(f64::NAN).position, traj.positions[0]);
        let end = p.sample(99.0);
        assert_eq!(end.position, traj.positions[2]);
        assert_eq!(end.velocity, traj.velocities[2]);
        // thrust clamps to the last control sample
        assert_eq!(end.thrust, traj.thrusts[1]);
        assert_eq!(p.end(), 2.0);
    }

    #[test]
    fn repeated_sampling_is_stable() {
        let traj = ramp();
        let p = PlaybackInterpolator::new(&traj);
        let a = p.sample(1.37);
        for _ in 0..10 {
            assert_eq!(p.sample(1.37), a);
        }
        assert_eq!(p.sample_at_seconds(3.0), p.sample(1.5));
    }

    #[test]
    fn empty_trajectory_samples_zero() {
        let traj = Trajectory {
            step: 1.0,
            positions: vec![],
            velocities: vec![],
            thrusts: vec![],
            fuel_used: 0.0,
            termination: Termination::Planned,
        };
        let s = PlaybackInterpolator::new(&traj).sample(0.5);
        assert_eq!(s.position, Vector3::zeros());
    }
}
