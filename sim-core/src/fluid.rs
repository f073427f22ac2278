//! Grid-based 2D fluid solver.
//!
//! One [`FluidSolver::step`] runs the fixed pass sequence:
//! 1. Advect velocity — semi-Lagrangian backtrace along the velocity
//!    field itself, with optional dissipation decay.
//! 2. Inject force — a Gaussian-falloff splat at the input position,
//!    applied in place to the freshly advected buffer.
//! 3. Divergence — central differences of the new velocity.
//! 4. Pressure — Jacobi relaxation of the Poisson equation with
//!    Neumann (clamped-neighbor) boundaries.
//! 5. Projection — subtract the pressure gradient, leaving the
//!    velocity field divergence-free.
//!
//! Velocity is stored in UV units per second; kernels convert to cell
//! units where they need to. Every pass reads a front buffer and writes
//! a back buffer, swapping only when the pass has written every cell,
//! so a pass never observes its own output.

use glam::Vec2;
use rayon::prelude::*;

use crate::config::{ConfigError, FluidConfig};
use crate::field::{Field, FieldPair};

/// A per-step force injection request at a point on the grid.
///
/// Present only while an input source is projected onto the simulation
/// plane; an absent splat means a zero-force step, which is the normal
/// idle case rather than an error.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SplatRequest {
    /// Splat center in UV space, inside `[0, 1]^2`.
    pub uv: Vec2,
    /// Raw input displacement for this step; the kernel scales it by
    /// the configured force scale and splat strength.
    pub force: Vec2,
}

/// Owns the velocity, pressure and divergence fields and advances them
/// one step at a time.
///
/// Construction allocates and zeroes every buffer; dropping (or the
/// explicit [`FluidSolver::release`]) frees them. A released solver
/// cannot be stepped again; resolution changes require a new instance.
pub struct FluidSolver {
    config: FluidConfig,
    velocity: FieldPair<Vec2>,
    pressure: FieldPair<f32>,
    divergence: FieldPair<f32>,
}

impl FluidSolver {
    /// Validates the configuration and allocates zeroed fields.
    ///
    /// ### Errors
    /// Returns a [`ConfigError`] without allocating anything if the
    /// grid dimensions or iteration count are out of range.
    pub fn new(config: &FluidConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let grid = config.grid();
        tracing::debug!(
            width = grid.width,
            height = grid.height,
            iterations = config.pressure_iterations,
            "allocating fluid fields"
        );
        Ok(Self {
            config: *config,
            velocity: FieldPair::zeroed(grid),
            pressure: FieldPair::zeroed(grid),
            divergence: FieldPair::zeroed(grid),
        })
    }

    pub fn config(&self) -> &FluidConfig {
        &self.config
    }

    /// The current velocity field, in UV units per second.
    pub fn velocity(&self) -> &Field<Vec2> {
        self.velocity.front()
    }

    /// The current pressure field.
    pub fn pressure(&self) -> &Field<f32> {
        self.pressure.front()
    }

    /// Advances the simulation by one step.
    ///
    /// Uses the configured fixed timestep when one is set, otherwise
    /// `external_dt`. The pass order is fixed; each pass consumes the
    /// fully completed output of the previous one.
    ///
    /// ### Parameters
    /// - `splat` - Optional force injection for this step.
    /// - `external_dt` - Wall delta time in seconds, used only when no
    ///   fixed timestep is configured.
    pub fn step(&mut self, splat: Option<&SplatRequest>, external_dt: f32) {
        let dt = self.config.step_dt(external_dt);

        // Pass 1: advect front -> back, then splat in place on the
        // back buffer. Both belong to the same write pass, so there is
        // exactly one swap.
        {
            let (src, dst) = self.velocity.split();
            advect_velocity(src, dst, dt, self.config.dissipation_rate());
        }
        if let Some(splat) = splat {
            inject_splat(self.velocity.back_mut(), splat, &self.config);
        }
        self.velocity.swap();

        // Pass 2: divergence of the advected + splatted velocity.
        {
            let velocity = self.velocity.front();
            let (_, dst) = self.divergence.split();
            compute_divergence(velocity, dst);
        }
        self.divergence.swap();

        // Pass 3: Jacobi pressure relaxation, iterating from zero so
        // the solve depends only on this step's divergence.
        self.pressure.front_mut().fill(0.0);
        for _ in 0..self.config.pressure_iterations {
            let divergence = self.divergence.front();
            let (src, dst) = self.pressure.split();
            jacobi_pressure(src, divergence, dst);
            self.pressure.swap();
        }

        // Pass 4: subtract the pressure gradient. Velocity has now been
        // swapped exactly twice this step, so the front buffer identity
        // is the same one the next step (and any held field handle)
        // started from.
        {
            let pressure = self.pressure.front();
            let (src, dst) = self.velocity.split();
            subtract_pressure_gradient(src, pressure, dst);
        }
        self.velocity.swap();
    }

    /// Frees all fields. Equivalent to dropping the solver; stepping
    /// after release is unrepresentable because the solver is consumed.
    pub fn release(self) {
        let grid = self.velocity.grid();
        tracing::debug!(width = grid.width, height = grid.height, "releasing fluid fields");
    }
}

/// Semi-Lagrangian advection of the velocity field along itself.
///
/// For every cell, the velocity is traced backward by `dt` and the
/// front buffer is sampled bilinearly at that position (clamped at the
/// boundary). The backtrace makes the pass unconditionally stable for
/// any timestep, unlike forward integration. When a dissipation rate is
/// set, the sampled value additionally decays by `1 - rate * dt`.
fn advect_velocity(src: &Field<Vec2>, dst: &mut Field<Vec2>, dt: f32, dissipation_rate: f32) {
    let grid = src.grid();
    let decay = (1.0 - dissipation_rate * dt).max(0.0);
    let cells_per_uv = Vec2::new(grid.width as f32, grid.height as f32);

    dst.as_mut_slice()
        .par_chunks_mut(grid.width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, out) in row.iter_mut().enumerate() {
                let pos = Vec2::new(x as f32, y as f32);
                let v = src.get(x, y);
                // Velocity is UV/s; the backtrace happens in cell units.
                let source_pos = pos - v * cells_per_uv * dt;
                *out = src.sample_bilinear(source_pos) * decay;
            }
        });
}

/// Adds a radial Gaussian impulse around the splat position.
///
/// The impulse is `force * force_scale * splat_strength`, weighted per
/// cell by `exp(-(d/r)^2)` with `d` the UV distance to the splat
/// center. Cells beyond three radii are left untouched; the falloff is
/// below 1.3e-4 there.
fn inject_splat(dst: &mut Field<Vec2>, splat: &SplatRequest, config: &FluidConfig) {
    let grid = dst.grid();
    let radius = config.splat_radius_uv.max(1e-4);
    let impulse = splat.force * config.force_scale * config.splat_strength;

    let center = grid.uv_to_cell(splat.uv);
    let extent_x = (3.0 * radius * grid.width as f32).ceil() as i32;
    let extent_y = (3.0 * radius * grid.height as f32).ceil() as i32;
    let cx = center.x.round() as i32;
    let cy = center.y.round() as i32;
    let x0 = (cx - extent_x).clamp(0, grid.width as i32 - 1) as usize;
    let x1 = (cx + extent_x).clamp(0, grid.width as i32 - 1) as usize;
    let y0 = (cy - extent_y).clamp(0, grid.height as i32 - 1) as usize;
    let y1 = (cy + extent_y).clamp(0, grid.height as i32 - 1) as usize;

    for y in y0..=y1 {
        for x in x0..=x1 {
            let offset_uv = grid.cell_center_uv(x, y) - splat.uv;
            let falloff = (-offset_uv.length_squared() / (radius * radius)).exp();
            let v = dst.get(x, y);
            dst.set(x, y, v + impulse * falloff);
        }
    }
}

/// Discrete divergence of the velocity field via central differences.
///
/// Neighbor reads are clamped at the boundary, replicating the edge
/// cell instead of sampling outside the grid.
fn compute_divergence(velocity: &Field<Vec2>, dst: &mut Field<f32>) {
    let grid = velocity.grid();
    dst.as_mut_slice()
        .par_chunks_mut(grid.width)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as i32;
            for (x, out) in row.iter_mut().enumerate() {
                let x = x as i32;
                let left = velocity.get_clamped(x - 1, y).x;
                let right = velocity.get_clamped(x + 1, y).x;
                let bottom = velocity.get_clamped(x, y - 1).y;
                let top = velocity.get_clamped(x, y + 1).y;
                *out = 0.5 * ((right - left) + (top - bottom));
            }
        });
}

/// One Jacobi iteration of the pressure Poisson solve.
///
/// Each cell becomes the average of its four neighbors minus the local
/// divergence term. Out-of-grid neighbors clamp to the nearest interior
/// cell, which is the discrete Neumann (zero-gradient) condition.
fn jacobi_pressure(pressure: &Field<f32>, divergence: &Field<f32>, dst: &mut Field<f32>) {
    let grid = pressure.grid();
    dst.as_mut_slice()
        .par_chunks_mut(grid.width)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as i32;
            for (x, out) in row.iter_mut().enumerate() {
                let x = x as i32;
                let left = pressure.get_clamped(x - 1, y);
                let right = pressure.get_clamped(x + 1, y);
                let bottom = pressure.get_clamped(x, y - 1);
                let top = pressure.get_clamped(x, y + 1);
                let div = divergence.get(x as usize, y as usize);
                *out = (left + right + bottom + top - div) * 0.25;
            }
        });
}

/// Subtracts the discrete pressure gradient from the velocity,
/// producing the divergence-free field for this step.
fn subtract_pressure_gradient(velocity: &Field<Vec2>, pressure: &Field<f32>, dst: &mut Field<Vec2>) {
    let grid = velocity.grid();
    dst.as_mut_slice()
        .par_chunks_mut(grid.width)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as i32;
            for (x, out) in row.iter_mut().enumerate() {
                let x = x as i32;
                let left = pressure.get_clamped(x - 1, y);
                let right = pressure.get_clamped(x + 1, y);
                let bottom = pressure.get_clamped(x, y - 1);
                let top = pressure.get_clamped(x, y + 1);
                let gradient = Vec2::new(right - left, top - bottom) * 0.5;
                *out = velocity.get(x as usize, y as usize) - gradient;
            }
        });
}
