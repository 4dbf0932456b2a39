//! Sphere-versus-cone culling.

use glam::Vec3;

/// True if a sphere of radius `r` centered at `p` (relative to the cone apex)
/// lies entirely outside the cone of half-angle θ about the unit axis `n`.
///
/// `plen2` is `|p|²`. The test is equivalent to
/// `angle(p, n) > θ + asin(r/|p|)` but uses no trig and no square roots.
/// A sphere containing the apex, or one whose angular radius plus θ reaches
/// 180°, is never outside.
#[inline]
pub fn sphere_outside_cone(p: Vec3, plen2: f32, r: f32, n: Vec3, cos_cone: f32, sin_cone: f32) -> bool {
    let r2 = r * r;
    let x = plen2 - r2;
    if x < 0.0 {
        return false;
    }
    // θ > 90° and sin(sphere angle) >= sin(θ): the sum is at least 180°.
    if cos_cone < 0.0 && r2 >= sin_cone * sin_cone * plen2 {
        return false;
    }
    // Outside iff dot(p, n) < |p| cos(θ + sphere angle)
    //            = cos θ sqrt(x) - r sin θ.
    let lhs = p.dot(n) + r * sin_cone;
    let rhs2 = cos_cone * cos_cone * x;
    if cos_cone >= 0.0 {
        lhs < 0.0 || lhs * lhs < rhs2
    } else {
        lhs < 0.0 && lhs * lhs > rhs2
    }
}
