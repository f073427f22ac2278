//! Interactive 2D fluid / ecology field viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns the simulation state
//! (fluid solver, ecology solver, configuration) and implements
//! [`eframe::App`] to render the simulated fields and control the
//! simulation through an egui UI.

use eframe::App;
use glam::Vec2;
use rand::Rng;
use rand::rng;
use sim_core::{
    config::{EcologyConfig, FluidConfig},
    ecology::EcologySolver,
    fluid::{FluidSolver, SplatRequest},
};

/// Which simulated field the central panel displays.
///
/// One entry per exposed field, plus `Presence` which shows
/// `1 - soil quality` (how strongly an area is being trampled).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldLayer {
    Velocity,
    Pressure,
    SoilQuality,
    Presence,
    SoilAttractivity,
    Growth1,
    Growth2,
    Growth3,
    Growth4,
    Decay1,
    Decay2,
    Decay3,
    Decay4,
}

impl FieldLayer {
    pub const ALL: [FieldLayer; 13] = [
        FieldLayer::Velocity,
        FieldLayer::Pressure,
        FieldLayer::SoilQuality,
        FieldLayer::Presence,
        FieldLayer::SoilAttractivity,
        FieldLayer::Growth1,
        FieldLayer::Growth2,
        FieldLayer::Growth3,
        FieldLayer::Growth4,
        FieldLayer::Decay1,
        FieldLayer::Decay2,
        FieldLayer::Decay3,
        FieldLayer::Decay4,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FieldLayer::Velocity => "Velocity",
            FieldLayer::Pressure => "Pressure",
            FieldLayer::SoilQuality => "Soil quality",
            FieldLayer::Presence => "Presence",
            FieldLayer::SoilAttractivity => "Attractivity",
            FieldLayer::Growth1 => "Growth 1",
            FieldLayer::Growth2 => "Growth 2",
            FieldLayer::Growth3 => "Growth 3",
            FieldLayer::Growth4 => "Growth 4",
            FieldLayer::Decay1 => "Decay 1",
            FieldLayer::Decay2 => "Decay 2",
            FieldLayer::Decay3 => "Decay 3",
            FieldLayer::Decay4 => "Decay 4",
        }
    }
}

/// Maps a signed value into `0..=1` with 0 at mid-gray.
fn signed_to_unit(value: f32, gain: f32) -> f32 {
    0.5 + 0.5 * (value * gain).clamp(-1.0, 1.0)
}

/// Quantizes a unit value to a color byte.
fn unit_to_byte(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0) as u8
}

/// Maps a pointer position inside `rect` to simulation UV space.
///
/// The vertical axis is flipped: screen y grows downward, simulation v
/// grows upward, matching how the field texture is drawn.
fn pointer_to_uv(rect: egui::Rect, pos: egui::Pos2) -> Option<Vec2> {
    if !rect.contains(pos) || rect.width() <= 0.0 || rect.height() <= 0.0 {
        return None;
    }
    let u = (pos.x - rect.left()) / rect.width();
    let v = 1.0 - (pos.y - rect.top()) / rect.height();
    Some(Vec2::new(u, v))
}

/// Main application state for the interactive viewer.
///
/// [`Viewer`] glues together:
/// - The simulation core: [`FluidSolver`], [`EcologySolver`] and their
///   configurations.
/// - UI state (selected layer, display gain, run/step timing).
/// - eframe/egui callbacks for drawing and user interaction.
///
/// The typical per-frame update is:
/// 1. Handle UI interactions (drags over the field become splats).
/// 2. If `running`, step the fluid every frame and the ecology on its
///    fixed-timestep cadence.
/// 3. Render the selected field layer as a heatmap texture.
///
/// ### Fields
/// - `fluid` / `ecology` - The live solvers; rebuilt on apply/reset.
/// - `fluid_cfg` / `ecology_cfg` - Editable copies of the
///   configurations, applied through the validating constructors.
/// - `config_error` - Last rejection from an apply attempt, if any.
///
/// - `layer` - Field currently displayed.
/// - `display_gain` - Multiplier applied to values before shading.
/// - `texture` - Cached egui texture the heatmap is uploaded into.
///
/// - `running` - Whether the simulation is auto-advancing.
/// - `eco_timer` - Accumulated wall time toward the next ecology step.
/// - `last_step_dt` - Delta time of the last fluid step (display only).
/// - `mean_soil_quality` - Cached average for the status bar.
///
/// - `last_mouse_uv` - Previous drag position, for displacement splats.
/// - `pending_splat` - Splat to inject on the next fluid step.
/// - `rng` - Random number generator for the "Stir" button.
pub struct Viewer {
    fluid: FluidSolver,
    ecology: EcologySolver,
    fluid_cfg: FluidConfig,
    ecology_cfg: EcologyConfig,
    config_error: Option<String>,

    layer: FieldLayer,
    display_gain: f32,
    texture: Option<egui::TextureHandle>,

    running: bool,
    eco_timer: f32,
    last_step_dt: f32,
    mean_soil_quality: f64,

    last_mouse_uv: Option<Vec2>,
    pending_splat: Option<SplatRequest>,
    rng: rand::rngs::ThreadRng,
}

impl Viewer {
    /// Creates a viewer with default fluid and ecology configurations.
    ///
    /// ### Returns
    /// A fully-initialized [`Viewer`] ready to be passed to
    /// `eframe::run_native`, or the configuration error if the default
    /// parameters were rejected.
    pub fn new() -> Result<Self, sim_core::config::ConfigError> {
        let fluid_cfg = FluidConfig::default();
        let ecology_cfg = EcologyConfig::default();
        let fluid = FluidSolver::new(&fluid_cfg)?;
        let ecology = EcologySolver::new(&ecology_cfg)?;

        Ok(Self {
            fluid,
            ecology,
            fluid_cfg,
            ecology_cfg,
            config_error: None,
            layer: FieldLayer::SoilQuality,
            display_gain: 1.0,
            texture: None,
            running: false,
            eco_timer: 0.0,
            last_step_dt: 0.0,
            mean_soil_quality: 0.0,
            last_mouse_uv: None,
            pending_splat: None,
            rng: rng(),
        })
    }

    /// Rebuilds both solvers from the edited configurations.
    ///
    /// On validation failure nothing is replaced and the error message
    /// is shown in the config panel. The ecology grid always follows
    /// the fluid grid so the two solvers can never disagree on
    /// resolution.
    fn apply_configs(&mut self) {
        self.ecology_cfg.width = self.fluid_cfg.width;
        self.ecology_cfg.height = self.fluid_cfg.height;

        match (
            FluidSolver::new(&self.fluid_cfg),
            EcologySolver::new(&self.ecology_cfg),
        ) {
            (Ok(fluid), Ok(ecology)) => {
                self.fluid = fluid;
                self.ecology = ecology;
                self.config_error = None;
                self.running = false;
                self.eco_timer = 0.0;
                self.last_step_dt = 0.0;
                self.mean_soil_quality = 0.0;
                self.last_mouse_uv = None;
                self.pending_splat = None;
                self.texture = None;
            }
            (fluid, ecology) => {
                let error = fluid.err().or(ecology.err());
                self.config_error = error.map(|e| e.to_string());
            }
        }
    }

    /// Discards edits and restarts from the currently applied
    /// configurations with zeroed fields.
    fn reset(&mut self) {
        self.fluid_cfg = *self.fluid.config();
        self.ecology_cfg = *self.ecology.config();
        self.apply_configs();
    }

    /// Advances one frame worth of simulation: the fluid steps every
    /// call, the ecology only when its fixed timestep has elapsed.
    fn step_frame(&mut self, frame_dt: f32) {
        let splat = self.pending_splat.take();
        self.fluid.step(splat.as_ref(), frame_dt);
        self.last_step_dt = frame_dt;

        let fixed = self.ecology.config().delta_time;
        if fixed > 0.0 {
            self.eco_timer += frame_dt;
            if self.eco_timer < fixed {
                return;
            }
            self.eco_timer = 0.0;
        }
        self.ecology
            .step(self.fluid.velocity(), self.fluid.pressure(), frame_dt);
        self.refresh_mean_quality();
    }

    /// Single manual step: forces both solvers to advance once.
    fn step_once(&mut self) {
        let dt = self.ecology.config().step_dt(1.0 / 60.0);
        let splat = self.pending_splat.take();
        self.fluid.step(splat.as_ref(), dt);
        self.ecology
            .step(self.fluid.velocity(), self.fluid.pressure(), dt);
        self.last_step_dt = dt;
        self.eco_timer = 0.0;
        self.refresh_mean_quality();
    }

    /// Queues a random splat somewhere around the middle of the grid.
    fn stir(&mut self) {
        let uv = Vec2::new(
            self.rng.random_range(0.3..=0.7),
            self.rng.random_range(0.3..=0.7),
        );
        let angle = self.rng.random_range(0.0..std::f32::consts::TAU);
        self.pending_splat = Some(SplatRequest {
            uv,
            force: Vec2::from_angle(angle) * 0.01,
        });
    }

    fn refresh_mean_quality(&mut self) {
        let slice = self.ecology.soil_quality().as_slice();
        self.mean_soil_quality = slice.iter().sum::<f64>() / slice.len() as f64;
    }

    /// Shades one cell of the selected layer as an RGB triple.
    fn shade_cell(&self, x: usize, y: usize) -> [u8; 3] {
        let gain = self.display_gain;
        match self.layer {
            FieldLayer::Velocity => {
                let v = self.fluid.velocity().get(x, y);
                [
                    unit_to_byte(signed_to_unit(v.x, gain)),
                    unit_to_byte(signed_to_unit(v.y, gain)),
                    0,
                ]
            }
            FieldLayer::Pressure => {
                let c = unit_to_byte(signed_to_unit(self.fluid.pressure().get(x, y), gain));
                [c, c, c]
            }
            FieldLayer::SoilQuality => {
                let c = unit_to_byte(self.ecology.soil_quality().get(x, y) as f32 * gain);
                [c, c, c]
            }
            FieldLayer::Presence => {
                let c =
                    unit_to_byte((1.0 - self.ecology.soil_quality().get(x, y) as f32) * gain);
                [c, c, c]
            }
            FieldLayer::SoilAttractivity => {
                let a = self.ecology.attractivity().get(x, y);
                [
                    unit_to_byte(signed_to_unit(a.x, gain)),
                    unit_to_byte(a.y * gain),
                    0,
                ]
            }
            FieldLayer::Growth1 | FieldLayer::Growth2 | FieldLayer::Growth3
            | FieldLayer::Growth4 => {
                let lanes = self.ecology.growth_cycles().get(x, y);
                let lane = match self.layer {
                    FieldLayer::Growth1 => lanes.x,
                    FieldLayer::Growth2 => lanes.y,
                    FieldLayer::Growth3 => lanes.z,
                    _ => lanes.w,
                };
                let c = unit_to_byte(lane * gain);
                [0, c, 0]
            }
            FieldLayer::Decay1 | FieldLayer::Decay2 | FieldLayer::Decay3
            | FieldLayer::Decay4 => {
                let lanes = self.ecology.decay_cycles().get(x, y);
                let lane = match self.layer {
                    FieldLayer::Decay1 => lanes.x,
                    FieldLayer::Decay2 => lanes.y,
                    FieldLayer::Decay3 => lanes.z,
                    _ => lanes.w,
                };
                let c = unit_to_byte(lane * gain);
                [c, 0, 0]
            }
        }
    }

    /// Renders the selected layer into an RGB image, bottom row last so
    /// simulation v points up on screen.
    fn render_layer_image(&self) -> egui::ColorImage {
        let grid = self.fluid.velocity().grid();
        let mut rgb = Vec::with_capacity(grid.len() * 3);
        for image_y in 0..grid.height {
            let y = grid.height - 1 - image_y;
            for x in 0..grid.width {
                rgb.extend_from_slice(&self.shade_cell(x, y));
            }
        }
        egui::ColorImage::from_rgb([grid.width, grid.height], &rgb)
    }

    /// Helper to draw a labeled `f32` [`egui::DragValue`].
    fn labeled_drag_f32(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut f32,
        range: std::ops::RangeInclusive<f32>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Helper to draw a labeled `usize` [`egui::DragValue`].
    fn labeled_drag_usize(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut usize,
        range: std::ops::RangeInclusive<usize>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Helper to draw a labeled `u32` [`egui::DragValue`].
    fn labeled_drag_u32(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut u32,
        range: std::ops::RangeInclusive<u32>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Builds the top panel UI (run controls, stepping, display gain).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .button(if self.running { "⏸ Pause" } else { "▶ Run" })
                    .clicked()
                {
                    self.running = !self.running;
                }

                if ui.button("Step").clicked() {
                    self.step_once();
                }

                if ui.button("Stir").clicked() {
                    self.stir();
                }

                if ui.button("Reset").clicked() {
                    self.reset();
                }

                ui.separator();
                ui.add(
                    egui::Slider::new(&mut self.display_gain, 0.01..=2000.0)
                        .logarithmic(true)
                        .text("Gain"),
                );
            });
        });
    }

    /// Builds the bottom status bar (grid size, timing, soil average).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("dt last = {:.4} s", self.last_step_dt));
                ui.separator();
                let grid = self.fluid.velocity().grid();
                ui.label(format!("grid = {}x{}", grid.width, grid.height));
                ui.label(format!("mean soil quality = {:.3}", self.mean_soil_quality));
            });
        });
    }

    /// Builds the right-hand configuration panel for both solvers.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(240.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    ui.heading("Fluid");
                    Self::labeled_drag_usize(ui, "width:", &mut self.fluid_cfg.width, 64..=1024, 8.0);
                    Self::labeled_drag_usize(
                        ui,
                        "height:",
                        &mut self.fluid_cfg.height,
                        64..=1024,
                        8.0,
                    );
                    Self::labeled_drag_f32(
                        ui,
                        "fixed dt:",
                        &mut self.fluid_cfg.delta_time,
                        0.0..=1.0,
                        0.001,
                    );
                    Self::labeled_drag_f32(
                        ui,
                        "dissipation:",
                        &mut self.fluid_cfg.dissipation_duration,
                        0.0..=600.0,
                        1.0,
                    );
                    Self::labeled_drag_u32(
                        ui,
                        "pressure iters:",
                        &mut self.fluid_cfg.pressure_iterations,
                        1..=100,
                        1.0,
                    );

                    ui.separator();
                    ui.label("Splat");
                    Self::labeled_drag_f32(
                        ui,
                        "radius (uv):",
                        &mut self.fluid_cfg.splat_radius_uv,
                        0.001..=0.5,
                        0.001,
                    );
                    Self::labeled_drag_f32(
                        ui,
                        "strength:",
                        &mut self.fluid_cfg.splat_strength,
                        0.0..=50.0,
                        0.1,
                    );
                    Self::labeled_drag_f32(
                        ui,
                        "force scale:",
                        &mut self.fluid_cfg.force_scale,
                        0.0..=500.0,
                        1.0,
                    );

                    ui.separator();
                    ui.heading("Ecology");
                    Self::labeled_drag_f32(
                        ui,
                        "time speed:",
                        &mut self.ecology_cfg.time_speed,
                        0.0..=100.0,
                        0.1,
                    );
                    Self::labeled_drag_f32(
                        ui,
                        "fixed dt:",
                        &mut self.ecology_cfg.delta_time,
                        0.0..=1.0,
                        0.001,
                    );
                    Self::labeled_drag_f32(
                        ui,
                        "velocity strength:",
                        &mut self.ecology_cfg.velocity_strength,
                        0.0..=10.0,
                        0.01,
                    );
                    Self::labeled_drag_f32(
                        ui,
                        "pressure strength:",
                        &mut self.ecology_cfg.pressure_strength,
                        0.0..=50.0,
                        0.1,
                    );
                    Self::labeled_drag_f32(
                        ui,
                        "recovery (s):",
                        &mut self.ecology_cfg.recovery_duration,
                        0.0..=3600.0,
                        1.0,
                    );
                    Self::labeled_drag_f32(
                        ui,
                        "min delta:",
                        &mut self.ecology_cfg.attractivity_min_delta,
                        0.0..=0.01,
                        0.0001,
                    );
                    Self::labeled_drag_f32(
                        ui,
                        "margin:",
                        &mut self.ecology_cfg.threshold_margin,
                        0.0..=0.1,
                        0.001,
                    );

                    for (i, category) in self.ecology_cfg.categories.iter_mut().enumerate() {
                        ui.separator();
                        ui.label(format!("Plant category {}", i + 1));
                        Self::labeled_drag_f32(
                            ui,
                            "threshold:",
                            &mut category.threshold,
                            0.0..=1.0,
                            0.01,
                        );
                        Self::labeled_drag_f32(
                            ui,
                            "growth (s):",
                            &mut category.growth_duration,
                            0.0..=3600.0,
                            1.0,
                        );
                        Self::labeled_drag_f32(
                            ui,
                            "decay (s):",
                            &mut category.decay_duration,
                            0.0..=3600.0,
                            1.0,
                        );
                    }

                    ui.separator();
                    if ui.button("Apply & restart").clicked() {
                        self.apply_configs();
                    }
                    if let Some(error) = &self.config_error {
                        ui.colored_label(egui::Color32::LIGHT_RED, error.as_str());
                    }
                });
            });
    }

    /// Builds the small floating toolbar for choosing the field layer.
    fn ui_toolbar(&mut self, ctx: &egui::Context) {
        egui::Area::new("layer_toolbar".into())
            .anchor(egui::Align2::LEFT_TOP, egui::vec2(10.0, 60.0))
            .movable(false)
            .show(ctx, |ui| {
                egui::Frame::new()
                    .fill(egui::Color32::from_rgba_unmultiplied(0, 0, 0, 32))
                    .show(ui, |ui| {
                        ui.vertical(|ui| {
                            for layer in FieldLayer::ALL {
                                if ui
                                    .selectable_label(self.layer == layer, layer.label())
                                    .clicked()
                                {
                                    self.layer = layer;
                                }
                            }
                        });
                    });
            });
    }

    /// Builds the central panel: the field heatmap plus mouse stirring.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            // Dragging over the field acts as the tracked input source:
            // position maps to UV, frame-to-frame displacement becomes
            // the injected force.
            if response.dragged()
                && let Some(pos) = response.interact_pointer_pos()
                && let Some(uv) = pointer_to_uv(rect, pos)
            {
                let delta = self.last_mouse_uv.map_or(Vec2::ZERO, |last| uv - last);
                self.pending_splat = Some(SplatRequest { uv, force: delta });
                self.last_mouse_uv = Some(uv);
            } else {
                self.last_mouse_uv = None;
            }

            let image = self.render_layer_image();
            if let Some(texture) = &mut self.texture {
                texture.set(image, egui::TextureOptions::NEAREST);
            } else {
                self.texture =
                    Some(ctx.load_texture("field_layer", image, egui::TextureOptions::NEAREST));
            }
            if let Some(texture) = &self.texture {
                painter.image(
                    texture.id(),
                    rect,
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
            }

            // Auto-run simulation if requested.
            if self.running {
                let dt = ctx.input(|i| i.stable_dt).min(0.1);
                self.step_frame(dt);
                ctx.request_repaint();
            }
        });
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
        self.ui_toolbar(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_rect() -> egui::Rect {
        egui::Rect::from_min_size(egui::Pos2::new(100.0, 50.0), egui::vec2(400.0, 200.0))
    }

    #[test]
    fn pointer_maps_to_uv_with_flipped_v() {
        let rect = test_rect();

        let center = pointer_to_uv(rect, rect.center()).unwrap();
        assert!((center - Vec2::splat(0.5)).length() < 1e-5);

        // Top-left corner of the rect is (0, 1) in UV space.
        let corner = pointer_to_uv(rect, rect.min).unwrap();
        assert!((corner - Vec2::new(0.0, 1.0)).length() < 1e-5);

        assert!(pointer_to_uv(rect, egui::Pos2::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn signed_shading_centers_zero_at_mid_gray() {
        assert_eq!(unit_to_byte(signed_to_unit(0.0, 1.0)), 127);
        assert_eq!(unit_to_byte(signed_to_unit(10.0, 1.0)), 255);
        assert_eq!(unit_to_byte(signed_to_unit(-10.0, 1.0)), 0);
    }

    #[test]
    fn layer_labels_are_unique() {
        let labels: Vec<&str> = FieldLayer::ALL.iter().map(|l| l.label()).collect();
        let mut deduped = labels.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), labels.len());
    }

    #[test]
    fn manual_step_advances_soil_recovery() {
        let mut viewer = Viewer::new().unwrap();
        assert_eq!(viewer.mean_soil_quality, 0.0);

        viewer.step_once();
        viewer.step_once();

        assert!(viewer.mean_soil_quality > 0.0);
    }

    #[test]
    fn reset_zeroes_fields_and_stops_running() {
        let mut viewer = Viewer::new().unwrap();
        viewer.running = true;
        viewer.stir();
        viewer.step_once();
        assert!(viewer.mean_soil_quality > 0.0);

        viewer.reset();

        assert!(!viewer.running);
        assert_eq!(viewer.mean_soil_quality, 0.0);
        assert!(viewer.pending_splat.is_none());
        assert!(
            viewer
                .ecology
                .soil_quality()
                .as_slice()
                .iter()
                .all(|q| *q == 0.0)
        );
    }

    #[test]
    fn invalid_edits_are_rejected_and_keep_the_solvers() {
        let mut viewer = Viewer::new().unwrap();
        let grid_before = viewer.fluid.velocity().grid();

        viewer.fluid_cfg.width = 63;
        viewer.apply_configs();

        assert!(viewer.config_error.is_some());
        assert_eq!(viewer.fluid.velocity().grid(), grid_before);
    }

    #[test]
    fn applying_valid_edits_rebuilds_on_the_new_grid() {
        let mut viewer = Viewer::new().unwrap();

        viewer.fluid_cfg.width = 128;
        viewer.fluid_cfg.height = 64;
        viewer.apply_configs();

        assert!(viewer.config_error.is_none());
        let grid = viewer.fluid.velocity().grid();
        assert_eq!((grid.width, grid.height), (128, 64));
        // The ecology grid follows the fluid grid.
        assert_eq!(viewer.ecology.soil_quality().grid(), grid);
    }

    #[test]
    fn stir_queues_a_splat_inside_the_grid() {
        let mut viewer = Viewer::new().unwrap();
        viewer.stir();

        let splat = viewer.pending_splat.expect("stir should queue a splat");
        assert!((0.0..=1.0).contains(&splat.uv.x));
        assert!((0.0..=1.0).contains(&splat.uv.y));
        assert!(splat.force.length() > 0.0);
    }
}
