//! Math type re-exports and the bounding box used by the surfel hierarchy.
//!
//! Vector types come from `glam`; everything in the crate is single precision.

pub use glam::{Vec2, Vec3};

use bytemuck::{Pod, Zeroable};
use std::fmt;

/// 3D axis-aligned bounding box with single precision.
#[derive(Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct BBox3f {
    pub min: Vec3,
    pub max: Vec3,
}

impl BBox3f {
    /// Empty bounding box (inverted, will expand on first point).
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Create a new bounding box from min and max points.
    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Check if this box is empty (has no volume).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Expand this box to include a point.
    #[inline]
    pub fn expand_by_point(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Expand this box to include a sphere of radius `r` around `p`.
    #[inline]
    pub fn expand_by_sphere(&mut self, p: Vec3, r: f32) {
        let r = Vec3::splat(r.abs());
        self.min = self.min.min(p - r);
        self.max = self.max.max(p + r);
    }

    /// Get the center of the box.
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the size (extents) of the box.
    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Radius of the sphere through the box corners.
    #[inline]
    pub fn bounding_radius(&self) -> f32 {
        self.size().length() * 0.5
    }

    /// Inflate the shorter sides so all three extents equal the longest one,
    /// keeping the center fixed.
    pub fn to_cube(&self) -> Self {
        let half = Vec3::splat(self.size().max_element() * 0.5);
        let c = self.center();
        Self::new(c - half, c + half)
    }

    /// Octant index of `p` relative to `center`: `4*(z>cz) + 2*(y>cy) + (x>cx)`.
    #[inline]
    pub fn octant_of(p: Vec3, center: Vec3) -> usize {
        4 * (p.z > center.z) as usize + 2 * (p.y > center.y) as usize + (p.x > center.x) as usize
    }

    /// Sub-box for octant `i`, split at the box center.
    pub fn octant(&self, i: usize) -> Self {
        debug_assert!(i < 8);
        let c = self.center();
        let pick = |bit: usize, lo: f32, mid: f32, hi: f32| {
            if (i & bit) == 0 { (lo, mid) } else { (mid, hi) }
        };
        let (x0, x1) = pick(1, self.min.x, c.x, self.max.x);
        let (y0, y1) = pick(2, self.min.y, c.y, self.max.y);
        let (z0, z1) = pick(4, self.min.z, c.z, self.max.z);
        Self::new(Vec3::new(x0, y0, z0), Vec3::new(x1, y1, z1))
    }
}

impl Default for BBox3f {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for BBox3f {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BBox3f({:?} - {:?})", self.min, self.max)
    }
}
