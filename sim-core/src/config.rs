use glam::Vec4;
use thiserror::Error;

use crate::field::Grid;
use crate::types::{CATEGORY_COUNT, DURATION_EPSILON};

/// Smallest and largest supported grid dimension.
pub const GRID_DIMENSION_RANGE: (usize, usize) = (64, 1024);

/// Supported range for the Jacobi pressure iteration count.
pub const PRESSURE_ITERATION_RANGE: (u32, u32) = (1, 100);

/// Largest allowed hysteresis margin around category thresholds.
pub const THRESHOLD_MARGIN_MAX: f32 = 0.1;

/// Rejection reasons for solver construction. Configuration is
/// validated before any field is allocated, so a failed construction
/// leaves no partial state behind.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    #[error("grid dimension {value} outside supported range {min}..={max}")]
    GridDimension { value: usize, min: usize, max: usize },
    #[error("pressure iteration count {value} outside supported range {min}..={max}")]
    PressureIterations { value: u32, min: u32, max: u32 },
    #[error("category {index} threshold {value} outside 0..=1")]
    Threshold { index: usize, value: f32 },
    #[error("threshold margin {value} outside 0..={max}")]
    ThresholdMargin { value: f32, max: f32 },
}

fn validate_grid(width: usize, height: usize) -> Result<(), ConfigError> {
    let (min, max) = GRID_DIMENSION_RANGE;
    for value in [width, height] {
        if value < min || value > max {
            return Err(ConfigError::GridDimension { value, min, max });
        }
    }
    Ok(())
}

/// Converts a duration in seconds to a per-second rate, treating
/// durations at or below [`DURATION_EPSILON`] as infinite (rate 0).
#[inline]
fn rate_from_duration(time_speed: f32, duration: f32) -> f32 {
    if duration <= DURATION_EPSILON {
        0.0
    } else {
        time_speed / duration
    }
}

/// Parameters of the fluid solver.
///
/// Plain data, immutable for the lifetime of a [`crate::fluid::FluidSolver`]
/// instance. Changing the resolution requires constructing a new solver.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FluidConfig {
    pub width: usize,
    pub height: usize,
    /// Fixed simulation timestep in seconds; 0 means "use the external
    /// delta passed to `step`".
    pub delta_time: f32,
    /// Seconds for velocity to fully dissipate; at or below
    /// [`DURATION_EPSILON`] velocity never dissipates.
    pub dissipation_duration: f32,
    pub pressure_iterations: u32,
    /// Splat falloff radius in UV units.
    pub splat_radius_uv: f32,
    pub splat_strength: f32,
    /// Scale applied to the input displacement when injecting force.
    pub force_scale: f32,
}

impl Default for FluidConfig {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            delta_time: 1.0 / 60.0,
            dissipation_duration: 60.0,
            pressure_iterations: 40,
            splat_radius_uv: 0.03,
            splat_strength: 5.0,
            force_scale: 50.0,
        }
    }
}

impl FluidConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_grid(self.width, self.height)?;
        let (min, max) = PRESSURE_ITERATION_RANGE;
        if self.pressure_iterations < min || self.pressure_iterations > max {
            return Err(ConfigError::PressureIterations {
                value: self.pressure_iterations,
                min,
                max,
            });
        }
        Ok(())
    }

    pub fn grid(&self) -> Grid {
        Grid::new(self.width, self.height)
    }

    /// Velocity decay rate per second. The fluid step is not bound to
    /// the ecology time speed.
    pub fn dissipation_rate(&self) -> f32 {
        rate_from_duration(1.0, self.dissipation_duration)
    }

    /// The timestep a step should integrate with: the fixed timestep
    /// when one is configured, the external delta otherwise.
    pub fn step_dt(&self, external_dt: f32) -> f32 {
        if self.delta_time > 0.0 {
            self.delta_time
        } else {
            external_dt
        }
    }
}

/// Threshold and timing of one plant category.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CategoryConfig {
    /// Soil quality level this category needs to establish, in 0..=1.
    pub threshold: f32,
    /// Seconds for the growth accumulator to go 0 -> 1.
    pub growth_duration: f32,
    /// Seconds for the decay accumulator to go 0 -> 1.
    pub decay_duration: f32,
}

/// Parameters of the ecology solver.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EcologyConfig {
    pub width: usize,
    pub height: usize,
    /// Global multiplier on recovery, growth and decay rates.
    pub time_speed: f32,
    /// Fixed simulation timestep in seconds; 0 means "use the external
    /// delta passed to `step`".
    pub delta_time: f32,
    /// Weight of fluid velocity magnitude in the disturbance term.
    pub velocity_strength: f32,
    /// Weight of fluid pressure in the disturbance term.
    pub pressure_strength: f32,
    /// Seconds for soil quality to recover 0 -> 1 with no disturbance.
    pub recovery_duration: f32,
    /// Per-step quality changes smaller than this are reported as zero
    /// attractivity to suppress noise.
    pub attractivity_min_delta: f32,
    /// Hysteresis half-band around every category threshold, in 0..=0.1.
    pub threshold_margin: f32,
    pub categories: [CategoryConfig; CATEGORY_COUNT],
}

impl Default for EcologyConfig {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            time_speed: 1.0,
            delta_time: 1.0 / 60.0,
            velocity_strength: 0.1,
            pressure_strength: 4.0,
            recovery_duration: 120.0,
            attractivity_min_delta: 1e-4,
            threshold_margin: 0.02,
            categories: [
                CategoryConfig {
                    threshold: 0.1,
                    growth_duration: 60.0,
                    decay_duration: 3.0,
                },
                CategoryConfig {
                    threshold: 0.3,
                    growth_duration: 120.0,
                    decay_duration: 3.0,
                },
                CategoryConfig {
                    threshold: 0.6,
                    growth_duration: 180.0,
                    decay_duration: 3.0,
                },
                CategoryConfig {
                    threshold: 0.9,
                    growth_duration: 300.0,
                    decay_duration: 3.0,
                },
            ],
        }
    }
}

impl EcologyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_grid(self.width, self.height)?;
        for (index, category) in self.categories.iter().enumerate() {
            if !(0.0..=1.0).contains(&category.threshold) {
                return Err(ConfigError::Threshold {
                    index,
                    value: category.threshold,
                });
            }
        }
        if !(0.0..=THRESHOLD_MARGIN_MAX).contains(&self.threshold_margin) {
            return Err(ConfigError::ThresholdMargin {
                value: self.threshold_margin,
                max: THRESHOLD_MARGIN_MAX,
            });
        }
        Ok(())
    }

    pub fn grid(&self) -> Grid {
        Grid::new(self.width, self.height)
    }

    /// Soil recovery rate per second, scaled by the time speed.
    pub fn recovery_rate(&self) -> f64 {
        rate_from_duration(self.time_speed, self.recovery_duration) as f64
    }

    /// Per-category growth rates, one lane per category.
    pub fn growth_speeds(&self) -> Vec4 {
        Vec4::from_array(
            self.categories
                .map(|c| rate_from_duration(self.time_speed, c.growth_duration)),
        )
    }

    /// Per-category decay rates, one lane per category.
    pub fn decay_speeds(&self) -> Vec4 {
        Vec4::from_array(
            self.categories
                .map(|c| rate_from_duration(self.time_speed, c.decay_duration)),
        )
    }

    /// Per-category thresholds, one lane per category.
    pub fn thresholds(&self) -> Vec4 {
        Vec4::from_array(self.categories.map(|c| c.threshold))
    }

    /// See [`FluidConfig::step_dt`].
    pub fn step_dt(&self, external_dt: f32) -> f32 {
        if self.delta_time > 0.0 {
            self.delta_time
        } else {
            external_dt
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configs_validate() {
        assert_eq!(FluidConfig::default().validate(), Ok(()));
        assert_eq!(EcologyConfig::default().validate(), Ok(()));
    }

    #[test]
    fn grid_dimensions_outside_range_are_rejected() {
        let mut cfg = FluidConfig::default();
        cfg.width = 63;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::GridDimension { value: 63, .. })
        ));

        let mut cfg = EcologyConfig::default();
        cfg.height = 2048;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::GridDimension { value: 2048, .. })
        ));
    }

    #[test]
    fn pressure_iterations_outside_range_are_rejected() {
        let mut cfg = FluidConfig::default();
        cfg.pressure_iterations = 0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::PressureIterations { value: 0, .. })
        ));

        cfg.pressure_iterations = 101;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn threshold_and_margin_ranges_are_enforced() {
        let mut cfg = EcologyConfig::default();
        cfg.categories[2].threshold = 1.2;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Threshold { index: 2, .. })
        ));

        let mut cfg = EcologyConfig::default();
        cfg.threshold_margin = 0.2;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::ThresholdMargin { .. })
        ));
    }

    #[test]
    fn degenerate_durations_yield_exactly_zero_rates() {
        let mut fluid = FluidConfig::default();
        fluid.dissipation_duration = 0.0;
        assert_eq!(fluid.dissipation_rate(), 0.0);

        let mut eco = EcologyConfig::default();
        eco.recovery_duration = 0.0;
        eco.categories[0].growth_duration = 0.0;
        eco.categories[3].decay_duration = 1e-7;

        assert_eq!(eco.recovery_rate(), 0.0);
        let growth = eco.growth_speeds();
        let decay = eco.decay_speeds();
        assert_eq!(growth.x, 0.0);
        assert_eq!(decay.w, 0.0);
        assert!(growth.is_finite());
        assert!(decay.is_finite());
    }

    #[test]
    fn positive_durations_follow_time_speed() {
        let mut eco = EcologyConfig::default();
        eco.time_speed = 2.0;
        eco.recovery_duration = 100.0;

        assert!((eco.recovery_rate() - 0.02).abs() < 1e-9);
        assert!((eco.growth_speeds().y - 2.0 / 120.0).abs() < 1e-6);
    }

    #[test]
    fn fixed_timestep_overrides_external_delta() {
        let mut cfg = FluidConfig::default();
        cfg.delta_time = 0.5;
        assert_eq!(cfg.step_dt(0.016), 0.5);

        cfg.delta_time = 0.0;
        assert_eq!(cfg.step_dt(0.016), 0.016);
    }
}
