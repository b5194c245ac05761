use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;

use crate::trajectory::{Termination, Trajectory};

/// Summary statistics computed from a descent trajectory.
#[derive(Debug, Clone, Serialize)]
pub struct TrajectorySummary {
    pub scenario: String,
    pub source: String,
    pub termination: Termination,
    pub steps: usize,
    pub duration_s: f64,
    pub fuel_used_ns: f64,
    pub peak_thrust_n: f64,
    pub max_speed_ms: f64,
    pub min_altitude_m: f64,
    pub touchdown_speed_ms: f64,
}

impl TrajectorySummary {
    /// Compute summary from trajectory data.
    pub fn from_trajectory(scenario: &str, source: &str, trajectory: &Trajectory) -> Self {
        let max_speed_ms = trajectory
            .velocities
            .iter()
            .map(|v| v.norm())
            .fold(0.0_f64, f64::max);

        // Speed entering the last sample; a safe landing zeroes the final velocity.
        let n = trajectory.velocities.len();
        let touchdown_speed_ms = match trajectory.termination {
            Termination::LandedSafely if n >= 2 => trajectory.velocities[n - 2].norm(),
            _ => trajectory.final_velocity().map_or(0.0, |v| v.norm()),
        };

        TrajectorySummary {
            scenario: scenario.to_string(),
            source: source.to_string(),
            termination: trajectory.termination,
            steps: trajectory.steps(),
            duration_s: trajectory.duration(),
            fuel_used_ns: trajectory.fuel_used,
            peak_thrust_n: trajectory.peak_thrust(),
            max_speed_ms,
            min_altitude_m: trajectory.min_altitude(),
            touchdown_speed_ms,
        }
    }
}

/// Write summary as pretty-printed JSON to a writer.
pub fn write_summary<W: Write>(writer: &mut W, summary: &TrajectorySummary) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, summary)?;
    writeln!(writer)
}

/// Write summary JSON to a file.
pub fn write_summary_file<P: AsRef<Path>>(path: P, summary: &TrajectorySummary) -> io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    write_summary(&mut file, summary)
}
