//! Projection of a tracked world position onto the simulation plane.
//!
//! The simulation reads its input as UV coordinates on the plane the
//! fields are mapped to. [`InputProjector`] turns a world-space point
//! into that UV space and keeps just enough state (the previous UV) to
//! report the per-step displacement that drives force injection.

use glam::{Affine3A, Vec2, Vec3};

use crate::fluid::SplatRequest;

/// The world placement and extents of the simulation plane.
///
/// `bounds_center` and `bounds_size` describe the plane mesh in its
/// local space; the plane is assumed to lie in the local XZ plane with
/// both UV axes inverted relative to the local axes.
#[derive(Clone, Copy, Debug)]
pub struct PlaneSurface {
    pub world_from_local: Affine3A,
    pub bounds_center: Vec3,
    pub bounds_size: Vec3,
}

impl PlaneSurface {
    /// Projects a world position onto the plane's UV space.
    ///
    /// ### Returns
    /// The UV coordinates in `[0, 1]^2`, or `None` when the point falls
    /// outside the plane bounds on either axis.
    pub fn world_to_uv(&self, world_position: Vec3) -> Option<Vec2> {
        let local = self
            .world_from_local
            .inverse()
            .transform_point3(world_position);
        let position = local - self.bounds_center;

        // World axes are inverted relative to the UV convention.
        let u = -position.x / self.bounds_size.x + 0.5;
        let v = -position.z / self.bounds_size.z + 0.5;

        if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
            return None;
        }
        Some(Vec2::new(u, v))
    }
}

/// Tracks an input source across steps and produces splat requests.
///
/// The only state carried is the previous projected UV, used to derive
/// the per-step displacement. The state must be cleared with
/// [`InputProjector::reset`] whenever the input source is disabled or
/// re-enabled, so a re-appearing source does not report a huge jump.
#[derive(Debug, Default)]
pub struct InputProjector {
    last_uv: Option<Vec2>,
}

impl InputProjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets the previously projected UV.
    pub fn reset(&mut self) {
        self.last_uv = None;
    }

    /// Projects the tracked position and reports its displacement.
    ///
    /// The previous UV is always replaced by the current projection
    /// result, including `None` when the point left the plane, so the
    /// first contact after re-entry reports a zero displacement.
    ///
    /// ### Returns
    /// `Some((uv, delta_uv))` while the point projects onto the plane;
    /// `delta_uv` is zero on first contact.
    pub fn project(
        &mut self,
        world_position: Vec3,
        plane: &PlaneSurface,
    ) -> Option<(Vec2, Vec2)> {
        let uv = plane.world_to_uv(world_position);
        let result = uv.map(|uv| {
            let delta = self.last_uv.map_or(Vec2::ZERO, |last| uv - last);
            (uv, delta)
        });
        self.last_uv = uv;
        result
    }

    /// Like [`InputProjector::project`], packaged as the fluid solver's
    /// splat input. The displacement is passed through unscaled; the
    /// force scale and splat strength are applied by the splat kernel.
    pub fn splat_request(
        &mut self,
        world_position: Vec3,
        plane: &PlaneSurface,
    ) -> Option<SplatRequest> {
        self.project(world_position, plane)
            .map(|(uv, delta)| SplatRequest { uv, force: delta })
    }
}
