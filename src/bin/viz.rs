use std::sync::mpsc::{self, Receiver, Sender};

use eframe::egui;
use egui_plot::{Line, Plot, PlotPoints, Points};

use landing_sim::control::{run_solve_job, ScenarioController, ScenarioStatus, SolveTicket};
use landing_sim::guidance::GfoldGuidance;
use landing_sim::scenario::{presets, ScenarioManifest};
use landing_sim::sim::PhysicsState;
use landing_sim::solver::ClarabelSolver;
use landing_sim::{GuidanceError, PlaybackInterpolator, Trajectory};

type SolveMessage = (SolveTicket, Result<Trajectory, GuidanceError>);

fn main() -> eframe::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let app = LandingViz::new(presets::mars_descent());
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1200.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native("Powered Descent Viewer", options, Box::new(|_| Ok(Box::new(app))))
}

struct LandingViz {
    manifest: ScenarioManifest,
    preset: String,
    controller: ScenarioController,
    solver: ClarabelSolver,
    tx: Sender<SolveMessage>,
    rx: Receiver<SolveMessage>,
    cursor: f64, // playback time, s
    playing: bool,
    tick_accum: f64,
    trail: Vec<PhysicsState>,
}

impl LandingViz {
    fn new(manifest: ScenarioManifest) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            controller: ScenarioController::new(manifest.guidance.clone()),
            preset: presets::PRESET_NAMES[0].to_string(),
            manifest,
            solver: ClarabelSolver::default(),
            tx,
            rx,
            cursor: 0.0,
            playing: false,
            tick_accum: 0.0,
            trail: Vec::new(),
        }
    }

    fn load_preset(&mut self, name: &str) {
        if let Some(manifest) = presets::by_name(name) {
            self.controller.set_scenario(manifest.guidance.clone());
            self.manifest = manifest;
            self.trail.clear();
            self.cursor = 0.0;
        }
    }

    fn request_solve(&mut self) {
        // the button is disabled while a solve is pending, so this only
        // fails on a double click within one frame
        let Ok(ticket) = self.controller.begin_solve() else { return };
        let tx = self.tx.clone();
        let solver = self.solver.clone();
        let scenario = self.controller.scenario().clone();
        std::thread::spawn(move || {
            let result = run_solve_job(|| GfoldGuidance::new(&solver).plan(&scenario));
            if tx.send((ticket, result)).is_err() {
                log::debug!("viewer closed before solve {} finished", ticket.id());
            }
        });
        self.cursor = 0.0;
        self.trail.clear();
    }

    fn start_drop(&mut self) {
        let settings = self.manifest.freeflight_settings();
        if self.controller.start_freeflight(&settings).is_ok() {
            self.trail = self.controller.physics_state().cloned().into_iter().collect();
            self.tick_accum = 0.0;
        }
    }

    fn poll(&mut self, dt: f64) {
        while let Ok((ticket, result)) = self.rx.try_recv() {
            if self.controller.commit(ticket, result) {
                self.playing = true;
            }
        }

        if matches!(self.controller.status(), ScenarioStatus::Flying) {
            let tick = self.manifest.freeflight_settings().tick;
            self.tick_accum += dt;
            while self.tick_accum >= tick {
                self.tick_accum -= tick;
                match self.controller.tick(tick) {
                    Ok(state) => self.trail.push(state.clone()),
                    Err(_) => break,
                }
                if !matches!(self.controller.status(), ScenarioStatus::Flying) {
                    break;
                }
            }
        }

        if self.playing {
            if let Some(t) = self.controller.trajectory() {
                self.cursor = (self.cursor + dt).min(t.duration());
                if self.cursor >= t.duration() {
                    self.playing = false;
                }
            }
        }
    }
}

impl eframe::App for LandingViz {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let dt = ctx.input(|i| i.stable_dt) as f64;
        self.poll(dt);

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.heading(format!("Scenario: {}", self.manifest.name));
            ui.horizontal(|ui| {
                let mut chosen = self.preset.clone();
                egui::ComboBox::from_label("Preset")
                    .selected_text(chosen.clone())
                    .show_ui(ui, |ui| {
                        for name in presets::PRESET_NAMES {
                            ui.selectable_value(&mut chosen, name.to_string(), name);
                        }
                    });
                if chosen != self.preset {
                    self.preset = chosen;
                    let name = self.preset.clone();
                    self.load_preset(&name);
                }

                let busy = self.controller.is_solving();
                if ui.add_enabled(!busy, egui::Button::new("Solve G-FOLD")).clicked() {
                    self.request_solve();
                }
                if ui.add_enabled(!busy, egui::Button::new("Free flight")).clicked() {
                    self.start_drop();
                }
                ui.checkbox(&mut self.playing, "Play");
            });

            let status = self.controller.status().to_string();
            match self.controller.status() {
                ScenarioStatus::Failed(_) | ScenarioStatus::Crashed => {
                    ui.colored_label(egui::Color32::RED, status);
                }
                _ => {
                    ui.label(status);
                }
            }

            if let Some(t) = self.controller.trajectory() {
                let duration = t.duration();
                ui.label(format!(
                    "Impulse: {:.0} N*s  |  Peak thrust: {:.0} N  |  Horizon: {:.1} s",
                    t.fuel_used,
                    t.peak_thrust(),
                    duration
                ));
                ui.add(egui::Slider::new(&mut self.cursor, 0.0..=duration).text("t (s)"));
            }
        });

        // Both sources render through the same (time, pos, vel, |F|) series.
        let series: Vec<[f64; 6]> = match (self.controller.trajectory(), self.trail.is_empty()) {
            (Some(t), _) => t
                .positions
                .iter()
                .zip(&t.velocities)
                .enumerate()
                .map(|(k, (p, v))| {
                    let f = t.thrusts.get(k).map_or(0.0, |f| f.norm());
                    [t.time_at(k), p.z, v.norm(), f, p.x, p.y]
                })
                .collect(),
            (None, false) => self
                .trail
                .iter()
                .map(|s| [s.time, s.pos.z, s.vel.norm(), s.thrust.norm(), s.pos.x, s.pos.y])
                .collect(),
            (None, true) => Vec::new(),
        };

        let marker = match self.controller.trajectory() {
            Some(t) => {
                let sample = PlaybackInterpolator::new(t).sample_at_seconds(self.cursor);
                let p = sample.position;
                Some([self.cursor, p.z, sample.velocity.norm(), sample.thrust.norm(), p.x, p.y])
            }
            None => self
                .trail
                .last()
                .map(|s| [s.time, s.pos.z, s.vel.norm(), s.thrust.norm(), s.pos.x, s.pos.y]),
        };

        let flying = matches!(self.controller.status(), ScenarioStatus::Flying);
        if self.playing || self.controller.is_solving() || flying {
            ctx.request_repaint();
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            let available = ui.available_size();
            let half_w = available.x / 2.0 - 8.0;
            let half_h = available.y / 2.0 - 8.0;

            let panel = |ui: &mut egui::Ui, id: &str, title: &str, x_label: &str, xi: usize, yi: usize, equal: bool| {
                ui.vertical(|ui| {
                    ui.label(title);
                    let points: PlotPoints = series.iter().map(|r| [r[xi], r[yi]]).collect();
                    let mut plot = Plot::new(id).width(half_w).height(half_h).x_axis_label(x_label);
                    if equal {
                        plot = plot.data_aspect(1.0);
                    }
                    plot.show(ui, |plot_ui| {
                        plot_ui.line(Line::new(title, points));
                        if let Some(m) = marker {
                            let here: PlotPoints = std::iter::once([m[xi], m[yi]]).collect();
                            plot_ui.points(Points::new("now", here).radius(4.0));
                        }
                    });
                });
            };

            ui.horizontal(|ui| {
                panel(ui, "altitude", "Altitude (m)", "Time (s)", 0, 1, false);
                panel(ui, "speed", "Speed (m/s)", "Time (s)", 0, 2, false);
            });
            ui.horizontal(|ui| {
                panel(ui, "thrust", "Thrust (N)", "Time (s)", 0, 3, false);
                panel(ui, "track", "Ground Track (m)", "East (m)", 4, 5, true);
            });
        });
    }
}
