//! Derived ecological fields driven by the fluid state.
//!
//! One [`EcologySolver::step`] runs the fixed pass sequence:
//! 1. Soil quality — recovery toward 1 against disturbance from the
//!    fluid's velocity magnitude and pressure.
//! 2. Life cycles — four independently thresholded growth/decay
//!    accumulators per cell, gated by a hysteresis band so quality
//!    hovering near a threshold cannot make a category flicker.
//! 3. Soil attractivity — a noise-gated derivative of soil quality.
//!
//! Soil quality is computed and stored in `f64`: with a long recovery
//! duration and a 1/60 s timestep the per-step increment is on the
//! order of 1e-4, which a half-precision store would round away and
//! stall recovery indefinitely. The cycle and attractivity fields carry
//! bounded values and stay in `f32` lanes.

use glam::{Vec2, Vec4};
use rayon::prelude::*;

use crate::config::{ConfigError, EcologyConfig};
use crate::field::{Field, FieldPair};
use crate::types::CATEGORY_COUNT;

/// Owns the soil-quality, growth/decay-cycle and attractivity fields.
///
/// The solver borrows the fluid's velocity and pressure fronts for the
/// duration of one [`EcologySolver::step`] call only; nothing upstream
/// is retained across steps, so fluid buffer swaps can never leave this
/// solver reading a stale buffer.
pub struct EcologySolver {
    config: EcologyConfig,
    soil_quality: FieldPair<f64>,
    growth_cycles: FieldPair<Vec4>,
    decay_cycles: FieldPair<Vec4>,
    attractivity: FieldPair<Vec2>,
}

impl EcologySolver {
    /// Validates the configuration and allocates zeroed fields.
    ///
    /// ### Errors
    /// Returns a [`ConfigError`] without allocating anything if the
    /// grid dimensions, thresholds or margin are out of range.
    pub fn new(config: &EcologyConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let grid = config.grid();
        tracing::debug!(
            width = grid.width,
            height = grid.height,
            "allocating ecology fields"
        );
        Ok(Self {
            config: *config,
            soil_quality: FieldPair::zeroed(grid),
            growth_cycles: FieldPair::zeroed(grid),
            decay_cycles: FieldPair::zeroed(grid),
            attractivity: FieldPair::zeroed(grid),
        })
    }

    pub fn config(&self) -> &EcologyConfig {
        &self.config
    }

    /// Current soil quality in `0..=1`, 1 being fully recovered.
    pub fn soil_quality(&self) -> &Field<f64> {
        self.soil_quality.front()
    }

    /// Current growth accumulators, one lane per category, in `0..=1`.
    pub fn growth_cycles(&self) -> &Field<Vec4> {
        self.growth_cycles.front()
    }

    /// Current decay accumulators, one lane per category, in `0..=1`.
    pub fn decay_cycles(&self) -> &Field<Vec4> {
        self.decay_cycles.front()
    }

    /// Current attractivity: `x` is the gated quality delta of the last
    /// step, `y` the quality value it was measured against.
    pub fn attractivity(&self) -> &Field<Vec2> {
        self.attractivity.front()
    }

    /// Advances every derived field by one step.
    ///
    /// ### Parameters
    /// - `velocity` - The fluid's current velocity front.
    /// - `pressure` - The fluid's current pressure front.
    /// - `external_dt` - Wall delta time, used only when no fixed
    ///   timestep is configured.
    ///
    /// ### Panics
    /// Panics if the fluid fields are not sized to this solver's grid;
    /// mismatched resolutions are a caller contract violation, not a
    /// runtime condition to recover from.
    pub fn step(&mut self, velocity: &Field<Vec2>, pressure: &Field<f32>, external_dt: f32) {
        let grid = self.soil_quality.grid();
        assert_eq!(velocity.grid(), grid, "velocity field does not match ecology grid");
        assert_eq!(pressure.grid(), grid, "pressure field does not match ecology grid");

        let dt = self.config.step_dt(external_dt);

        self.update_soil_quality(velocity, pressure, dt);
        self.update_life_cycles(dt);
        self.update_attractivity();
    }

    /// Frees all fields. Equivalent to dropping the solver.
    pub fn release(self) {
        let grid = self.soil_quality.grid();
        tracing::debug!(width = grid.width, height = grid.height, "releasing ecology fields");
    }

    /// Pass 1: quality recovers toward 1 at the configured rate and is
    /// pushed down by the local fluid disturbance, clamped to `0..=1`.
    fn update_soil_quality(&mut self, velocity: &Field<Vec2>, pressure: &Field<f32>, dt: f32) {
        let grid = self.soil_quality.grid();
        let recovery_rate = self.config.recovery_rate();
        let velocity_strength = self.config.velocity_strength;
        let pressure_strength = self.config.pressure_strength;
        let dt = dt as f64;

        let (src, dst) = self.soil_quality.split();
        dst.as_mut_slice()
            .par_chunks_mut(grid.width)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, out) in row.iter_mut().enumerate() {
                    let disturbance = (velocity_strength * velocity.get(x, y).length()
                        + pressure_strength * pressure.get(x, y))
                        as f64;
                    let quality = src.get(x, y);
                    *out = (quality + (recovery_rate - disturbance) * dt).clamp(0.0, 1.0);
                }
            });
        self.soil_quality.swap();
    }

    /// Pass 2: per-category growth and decay accumulators.
    ///
    /// Above `threshold + margin` conditions favor the category being
    /// present: growth ramps toward 1 and decay toward 0. Below
    /// `threshold - margin` the targets are book-ended: growth toward 0
    /// and decay toward 1. Inside the deadband both hold, which is what
    /// keeps quality noise around a threshold from flickering a
    /// category in and out.
    fn update_life_cycles(&mut self, dt: f32) {
        let grid = self.soil_quality.grid();
        let thresholds = self.config.thresholds();
        let margin = self.config.threshold_margin;
        let growth_steps = self.config.growth_speeds() * dt;
        let decay_steps = self.config.decay_speeds() * dt;
        let width = grid.width;

        let soil = self.soil_quality.front();
        let (growth_src, growth_dst) = self.growth_cycles.split();
        let (decay_src, decay_dst) = self.decay_cycles.split();

        growth_dst
            .as_mut_slice()
            .par_chunks_mut(width)
            .zip(decay_dst.as_mut_slice().par_chunks_mut(width))
            .enumerate()
            .for_each(|(y, (growth_row, decay_row))| {
                for x in 0..width {
                    let quality = soil.get(x, y) as f32;
                    let growth = growth_src.get(x, y);
                    let decay = decay_src.get(x, y);
                    let mut new_growth = growth;
                    let mut new_decay = decay;

                    for lane in 0..CATEGORY_COUNT {
                        if quality >= thresholds[lane] + margin {
                            new_growth[lane] = move_towards(growth[lane], 1.0, growth_steps[lane]);
                            new_decay[lane] = move_towards(decay[lane], 0.0, decay_steps[lane]);
                        } else if quality < thresholds[lane] - margin {
                            new_growth[lane] = move_towards(growth[lane], 0.0, growth_steps[lane]);
                            new_decay[lane] = move_towards(decay[lane], 1.0, decay_steps[lane]);
                        }
                    }

                    growth_row[x] = new_growth;
                    decay_row[x] = new_decay;
                }
            });

        self.growth_cycles.swap();
        self.decay_cycles.swap();
    }

    /// Pass 3: attractivity is the per-step quality delta, zeroed when
    /// smaller than the configured epsilon so recovered, quiet soil
    /// does not jitter between "attractive" and "not".
    fn update_attractivity(&mut self) {
        let grid = self.soil_quality.grid();
        let min_delta = self.config.attractivity_min_delta;

        let soil = self.soil_quality.front();
        let (src, dst) = self.attractivity.split();
        dst.as_mut_slice()
            .par_chunks_mut(grid.width)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, out) in row.iter_mut().enumerate() {
                    let quality = soil.get(x, y) as f32;
                    let delta = quality - src.get(x, y).y;
                    let signal = if delta.abs() < min_delta { 0.0 } else { delta };
                    *out = Vec2::new(signal, quality);
                }
            });
        self.attractivity.swap();
    }
}

/// Moves `current` toward `target` by at most `max_delta`, landing on
/// the target exactly instead of oscillating around it.
#[inline]
fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    let remaining = target - current;
    if remaining.abs() <= max_delta {
        target
    } else {
        current + remaining.signum() * max_delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CategoryConfig;
    use crate::field::Grid;

    const DT: f32 = 1.0 / 60.0;

    fn quiet_fluid(grid: Grid) -> (Field<Vec2>, Field<f32>) {
        (Field::zeroed(grid), Field::zeroed(grid))
    }

    fn small_config() -> EcologyConfig {
        EcologyConfig {
            width: 64,
            height: 64,
            ..EcologyConfig::default()
        }
    }

    /// Config whose soil quality never changes on its own, so tests can
    /// pin quality by writing the front buffer directly.
    fn pinned_soil_config() -> EcologyConfig {
        let mut cfg = small_config();
        cfg.recovery_duration = 0.0; // infinite: rate 0
        cfg
    }

    #[test]
    fn recovery_is_monotonic_and_converges_within_duration() {
        let config = small_config();
        let mut solver = EcologySolver::new(&config).unwrap();
        let (velocity, pressure) = quiet_fluid(config.grid());

        // recovery_duration = 120 s at 60 steps per second.
        let steps = (config.recovery_duration / DT).round() as usize;
        let mut previous = 0.0f64;
        for _ in 0..steps {
            solver.step(&velocity, &pressure, DT);
            let quality = solver.soil_quality().get(17, 42);
            assert!(quality <= 1.0, "quality overshot: {quality}");
            if previous < 1.0 {
                assert!(quality > previous, "recovery stalled at {quality}");
            }
            previous = quality;
        }

        assert!((previous - 1.0).abs() < 1e-3, "final quality {previous}");
    }

    #[test]
    fn disturbance_drives_soil_quality_down() {
        let config = small_config();
        let mut solver = EcologySolver::new(&config).unwrap();
        solver.soil_quality.front_mut().fill(0.5);

        let grid = config.grid();
        let velocity = Field::zeroed(grid);
        let mut pressure = Field::zeroed(grid);
        pressure.fill(1.0);

        solver.step(&velocity, &pressure, DT);

        let expected = 0.5
            + (config.recovery_rate() - config.pressure_strength as f64) * DT as f64;
        let quality = solver.soil_quality().get(3, 3);
        assert!((quality - expected).abs() < 1e-9, "quality {quality}");
        assert!(quality < 0.5);
    }

    #[test]
    fn soil_quality_clamps_at_zero_under_heavy_disturbance() {
        let config = small_config();
        let mut solver = EcologySolver::new(&config).unwrap();

        let grid = config.grid();
        let mut velocity = Field::zeroed(grid);
        velocity.fill(Vec2::new(100.0, 0.0));
        let mut pressure = Field::zeroed(grid);
        pressure.fill(100.0);

        for _ in 0..5 {
            solver.step(&velocity, &pressure, DT);
        }

        assert_eq!(solver.soil_quality().get(10, 10), 0.0);
    }

    #[test]
    fn cycles_grow_above_band_and_decay_below() {
        let config = pinned_soil_config();
        let mut solver = EcologySolver::new(&config).unwrap();
        let (velocity, pressure) = quiet_fluid(config.grid());

        // Category 0: threshold 0.1. Quality 0.5 is far above the band.
        solver.soil_quality.front_mut().fill(0.5);
        solver.decay_cycles.front_mut().fill(Vec4::splat(1.0));
        solver.step(&velocity, &pressure, DT);

        let growth = solver.growth_cycles().get(5, 5);
        let decay = solver.decay_cycles().get(5, 5);
        let growth_step = config.growth_speeds().x * DT;
        let decay_step = config.decay_speeds().x * DT;
        assert!((growth.x - growth_step).abs() < 1e-7, "growth.x {}", growth.x);
        assert!((decay.x - (1.0 - decay_step)).abs() < 1e-6, "decay.x {}", decay.x);

        // Category 3: threshold 0.9. Quality 0.5 is far below the band.
        assert_eq!(growth.w, 0.0);
        assert!((decay.w - 1.0).abs() < 1e-6);
    }

    #[test]
    fn growth_saturates_at_one_and_decay_at_zero() {
        let mut config = pinned_soil_config();
        // Fast ramps so saturation is reached in few steps.
        config.categories[0] = CategoryConfig {
            threshold: 0.1,
            growth_duration: 0.05,
            decay_duration: 0.05,
        };
        let mut solver = EcologySolver::new(&config).unwrap();
        let (velocity, pressure) = quiet_fluid(config.grid());

        solver.soil_quality.front_mut().fill(1.0);
        solver.decay_cycles.front_mut().fill(Vec4::new(1.0, 0.0, 0.0, 0.0));

        for _ in 0..10 {
            solver.step(&velocity, &pressure, DT);
        }

        assert_eq!(solver.growth_cycles().get(0, 0).x, 1.0);
        assert_eq!(solver.decay_cycles().get(0, 0).x, 0.0);
    }

    #[test]
    fn quality_inside_deadband_freezes_both_accumulators() {
        let mut config = pinned_soil_config();
        config.categories[0].threshold = 0.5;
        config.threshold_margin = 0.02;
        let mut solver = EcologySolver::new(&config).unwrap();
        let (velocity, pressure) = quiet_fluid(config.grid());

        // Settle above the band first so both accumulators are moving.
        solver.soil_quality.front_mut().fill(0.6);
        for _ in 0..20 {
            solver.step(&velocity, &pressure, DT);
        }
        let settled_growth = solver.growth_cycles().get(8, 8).x;
        let settled_decay = solver.decay_cycles().get(8, 8).x;
        assert!(settled_growth > 0.0);

        // Oscillate quality inside [T - M, T + M): nothing may move.
        for step in 0..40 {
            let q = if step % 2 == 0 { 0.51 } else { 0.49 };
            solver.soil_quality.front_mut().fill(q);
            solver.step(&velocity, &pressure, DT);

            assert_eq!(solver.growth_cycles().get(8, 8).x, settled_growth);
            assert_eq!(solver.decay_cycles().get(8, 8).x, settled_decay);
        }
    }

    #[test]
    fn attractivity_reports_gated_quality_delta() {
        let config = small_config();
        let mut solver = EcologySolver::new(&config).unwrap();
        let (velocity, pressure) = quiet_fluid(config.grid());

        // Recovery at 120 s and 1/60 s steps moves quality by ~1.4e-4
        // per step, above the default 1e-4 gate.
        solver.step(&velocity, &pressure, DT);
        solver.step(&velocity, &pressure, DT);

        let attractivity = solver.attractivity().get(2, 9);
        assert!(attractivity.x > 0.0, "recovering soil should attract");
        let quality = solver.soil_quality().get(2, 9) as f32;
        assert!((attractivity.y - quality).abs() < 1e-6);
    }

    #[test]
    fn attractivity_gate_suppresses_small_deltas() {
        let mut config = small_config();
        config.attractivity_min_delta = 1e-2; // far above the per-step delta
        let mut solver = EcologySolver::new(&config).unwrap();
        let (velocity, pressure) = quiet_fluid(config.grid());

        for _ in 0..10 {
            solver.step(&velocity, &pressure, DT);
        }

        assert_eq!(solver.attractivity().get(30, 30).x, 0.0);
    }

    #[test]
    #[should_panic(expected = "does not match ecology grid")]
    fn mismatched_fluid_dimensions_panic() {
        let config = small_config();
        let mut solver = EcologySolver::new(&config).unwrap();

        let wrong = Grid::new(128, 128);
        let velocity = Field::zeroed(wrong);
        let pressure = Field::zeroed(wrong);
        solver.step(&velocity, &pressure, DT);
    }

    #[test]
    fn construction_rejects_invalid_config() {
        let mut config = small_config();
        config.threshold_margin = 0.5;
        assert!(EcologySolver::new(&config).is_err());
    }

    #[test]
    fn move_towards_lands_exactly_on_target() {
        assert_eq!(move_towards(0.95, 1.0, 0.1), 1.0);
        assert_eq!(move_towards(0.5, 1.0, 0.1), 0.6);
        assert_eq!(move_towards(0.5, 0.0, 0.2), 0.3);
        assert_eq!(move_towards(1.0, 1.0, 0.0), 1.0);
    }
}
