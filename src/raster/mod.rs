//! Micro-rasterization of surfels into an integrator's cube map.
//!
//! - [`sphere_outside_cone`] - trig-free culling predicate
//! - [`render_disk`] - one disk, approximate square footprint
//! - [`render_disk_exact`] - one disk, exact outline (near surfels)
//! - [`micro_rasterize`] - level-of-detail traversal of a [`PointOctree`]
//!
//! [`PointOctree`]: crate::octree::PointOctree

mod cull;
mod disk;
mod exact;
mod traverse;

pub use cull::sphere_outside_cone;
pub use disk::render_disk;
pub use exact::render_disk_exact;
pub use traverse::{micro_rasterize, MAX_STACK_DEPTH};

use glam::Vec3;

/// Solid angle (steradians) above which a disk is rendered exactly.
pub const DEFAULT_EXACT_SOLID_ANGLE: f32 = 0.05;

/// Normals with a squared length below this are treated as unoriented and
/// the disk contributes nothing.
pub const MIN_NORMAL_LENGTH2: f32 = 1e-12;

/// Cone of interest about the shading normal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cone {
    /// Unit cone axis.
    pub axis: Vec3,
    pub cos_angle: f32,
    pub sin_angle: f32,
}

impl Cone {
    /// Cone of half-angle `angle` (radians, `0..=π`) about the unit vector `axis`.
    pub fn new(axis: Vec3, angle: f32) -> Self {
        Self {
            axis,
            cos_angle: angle.cos(),
            sin_angle: angle.sin().max(0.0),
        }
    }
}

/// Tunables for disk rendering.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RasterOptions {
    /// Disks subtending more than this solid angle take the exact path.
    pub exact_solid_angle: f32,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            exact_solid_angle: DEFAULT_EXACT_SOLID_ANGLE,
        }
    }
}
