use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use landing_sim::io::{csv, json, TrajectorySummary};
use landing_sim::scenario::{load_manifest, presets, ScenarioManifest};
use landing_sim::sim::FreeflightSource;
use landing_sim::solver::{ClarabelSolver, SolverOptions};
use landing_sim::guidance::GfoldGuidance;
use landing_sim::{Trajectory, TrajectorySource};

#[derive(Parser, Debug)]
#[command(name = "landing-sim", about = "Powered-descent guidance and landing simulation")]
struct Cli {
    /// Log at debug level (RUST_LOG still takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Solve the fuel-optimal descent as a convex program
    Plan {
        #[command(flatten)]
        common: CommonArgs,
        /// Interior-point iteration cap
        #[arg(long, default_value_t = 200)]
        max_iter: u32,
        /// Print solver progress
        #[arg(long)]
        solver_verbose: bool,
    },
    /// Fixed-thrust burn then free fall, until touchdown or crash
    Drop {
        #[command(flatten)]
        common: CommonArgs,
        /// Override the burn duration, s
        #[arg(long)]
        burn: Option<f64>,
        /// Override the integrator tick, s
        #[arg(long)]
        tick: Option<f64>,
    },
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Scenario manifest (.toml, .yaml)
    #[arg(long, conflicts_with = "preset")]
    scenario: Option<PathBuf>,
    /// Built-in scenario: mars-descent, lunar-hop, simple-drop
    #[arg(long)]
    preset: Option<String>,
    /// Write the trajectory as CSV
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Write a JSON summary
    #[arg(long)]
    json: Option<PathBuf>,
}

impl CommonArgs {
    fn manifest(&self, default_preset: &str) -> Result<ScenarioManifest> {
        if let Some(path) = &self.scenario {
            return load_manifest(path).with_context(|| format!("loading {}", path.display()));
        }
        let name = self.preset.as_deref().unwrap_or(default_preset);
        presets::by_name(name).ok_or_else(|| {
            anyhow!("unknown preset '{}' (available: {})", name, presets::PRESET_NAMES.join(", "))
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    match cli.command {
        Command::Plan { common, max_iter, solver_verbose } => {
            let manifest = common.manifest("mars-descent")?;
            let solver = ClarabelSolver::new(SolverOptions {
                max_iter,
                verbose: solver_verbose,
                ..SolverOptions::default()
            });
            let mut source = GfoldGuidance::new(&solver);
            run(&manifest, &mut source, &common)
        }
        Command::Drop { common, burn, tick } => {
            let manifest = common.manifest("simple-drop")?;
            let mut settings = manifest.freeflight_settings();
            if let Some(b) = burn {
                settings.burn_duration = b;
            }
            if let Some(t) = tick {
                if !(t > 0.0) {
                    bail!("tick must be positive, got {}", t);
                }
                settings.tick = t;
            }
            let mut source = FreeflightSource::new(settings);
            run(&manifest, &mut source, &common)
        }
    }
}

fn run(manifest: &ScenarioManifest, source: &mut dyn TrajectorySource, common: &CommonArgs) -> Result<()> {
    let name = source.name().to_string();
    let trajectory = source
        .produce(&manifest.guidance)
        .map_err(|e| anyhow!("{} failed for '{}': {}", name, manifest.name, e))?;

    let summary = TrajectorySummary::from_trajectory(&manifest.name, &name, &trajectory);
    print_report(manifest, &summary, &trajectory);

    if let Some(path) = &common.csv {
        csv::write_trajectory_file(path, &trajectory)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("  Exported trajectory: {}", path.display());
    }
    if let Some(path) = &common.json {
        json::write_summary_file(path, &summary)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("  Exported summary:    {}", path.display());
    }
    Ok(())
}

fn print_report(manifest: &ScenarioManifest, summary: &TrajectorySummary, trajectory: &Trajectory) {
    let s = &manifest.guidance;

    println!();
    println!("====================================================================");
    println!("  LANDING SIMULATION: {} ({})", manifest.name, summary.source);
    println!("====================================================================");
    println!();
    println!("  Scenario");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  Mass:          {:>8.1} kg    Max thrust:   {:>8.0} N",
        s.mass, s.max_thrust
    );
    println!(
        "  Gravity:       {:>8.3} m/s^2 T/W:          {:>8.2}",
        s.gravity,
        s.thrust_to_weight()
    );
    println!(
        "  Start:   [{:>8.1}, {:>8.1}, {:>8.1}] m   v0 [{:>6.1}, {:>6.1}, {:>6.1}] m/s",
        s.initial_position.x, s.initial_position.y, s.initial_position.z,
        s.initial_velocity.x, s.initial_velocity.y, s.initial_velocity.z,
    );
    println!(
        "  Target:  [{:>8.1}, {:>8.1}, {:>8.1}] m",
        s.target_position.x, s.target_position.y, s.target_position.z
    );
    println!();

    println!("  Trajectory");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  {:>5}  {:>7}  {:>9}  {:>9}  {:>9}  {:>10}",
        "k", "t (s)", "alt (m)", "range (m)", "vz (m/s)", "|F| (N)"
    );
    println!("  {}", "─".repeat(60));

    let n = trajectory.positions.len();
    let sample_interval = (n / 25).max(1);
    for (k, (p, v)) in trajectory.positions.iter().zip(&trajectory.velocities).enumerate() {
        if k % sample_interval != 0 && k != n - 1 {
            continue;
        }
        let range = (p - s.target_position).xy().norm();
        let thrust = trajectory.thrusts.get(k).map_or(0.0, |f| f.norm());
        println!(
            "  {:>5}  {:>7.2}  {:>9.1}  {:>9.1}  {:>9.2}  {:>10.0}",
            k,
            trajectory.time_at(k),
            p.z,
            range,
            v.z,
            thrust
        );
    }
    println!();

    println!("  Summary");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!("  Outcome:        {:?}", summary.termination);
    println!("  Duration:       {:>10.1} s   ({} steps)", summary.duration_s, summary.steps);
    println!("  Fuel (impulse): {:>10.0} N*s", summary.fuel_used_ns);
    println!("  Peak thrust:    {:>10.0} N", summary.peak_thrust_n);
    println!("  Max speed:      {:>10.1} m/s", summary.max_speed_ms);
    println!("  Touchdown:      {:>10.2} m/s", summary.touchdown_speed_ms);
    println!("====================================================================");
    println!();
}
