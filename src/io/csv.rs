use std::io::{self, Write};
use std::path::Path;

use crate::trajectory::Trajectory;

/// Write trajectory data to CSV format, one row per sample.
///
/// Columns: k, time, pos_x, pos_y, pos_z, vel_x, vel_y, vel_z,
///          thrust_x, thrust_y, thrust_z, thrust_norm
///
/// The final sample has no thrust of its own; its thrust columns are empty.
pub fn write_trajectory<W: Write>(writer: &mut W, trajectory: &Trajectory) -> io::Result<()> {
    writeln!(
        writer,
        "k,time,pos_x,pos_y,pos_z,vel_x,vel_y,vel_z,\
         thrust_x,thrust_y,thrust_z,thrust_norm"
    )?;

    for (k, (p, v)) in trajectory.positions.iter().zip(&trajectory.velocities).enumerate() {
        write!(
            writer,
            "{},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4},",
            k,
            trajectory.time_at(k),
            p.x, p.y, p.z,
            v.x, v.y, v.z,
        )?;
        match trajectory.thrusts.get(k) {
            Some(f) => writeln!(writer, "{:.3},{:.3},{:.3},{:.3}", f.x, f.y, f.z, f.norm())?,
            None => writeln!(writer, ",,,")?,
        }
    }

    Ok(())
}

/// Write trajectory to a CSV file at the given path.
pub fn write_trajectory_file<P: AsRef<Path>>(path: P, trajectory: &Trajectory) -> io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    write_trajectory(&mut file, trajectory)
}
