//! Exact disk rendering for surfels close to the shading point.
//!
//! Each face is handled on its own. A disk that stays in front of a face's
//! plane projects to an ellipse, which is scan-converted from its implicit
//! quadratic. A disk that crosses the plane through the shading point has no
//! bounded projection there, so each pixel ray is intersected with it
//! instead. Either way every pixel is sampled at its center with full
//! coverage.

use std::ops::Range;

use glam::Vec3;

use super::sphere_outside_cone;
use crate::integrator::Integrator;
use crate::microbuf::Face;

/// cos/sin of the half-angle of the cone through a face's corners.
const FACE_CONE_COS: f32 = 0.577_350_26;
const FACE_CONE_SIN: f32 = 0.816_496_6;

/// Render a disk (center `p` relative to the shading point, unit normal `n`,
/// radius `r`) by sampling every pixel center it covers on every face.
pub fn render_disk_exact<I: Integrator>(integrator: &mut I, p: Vec3, n: Vec3, r: f32) {
    let plen2 = p.length_squared();
    let r2 = r * r;
    for face in Face::ALL {
        if sphere_outside_cone(p, plen2, r, face.normal(), FACE_CONE_COS, FACE_CONE_SIN) {
            continue;
        }
        let p_f = face.dot_normal(p);
        let n_f = face.dot_normal(n);
        integrator.set_face(face);
        // Extent of the disk along the face normal is r·sqrt(1 - n_f²).
        if (1.0 - n_f * n_f) * r2 >= p_f * p_f {
            trace_face(integrator, face, p, n, r2);
        } else if p_f > 0.0 {
            rasterize_ellipse(integrator, face, p, n, plen2, r2);
        }
    }
}

/// Intersect each pixel ray of `face` with the disk.
fn trace_face<I: Integrator>(integrator: &mut I, face: Face, p: Vec3, n: Vec3, r2: f32) {
    let res = integrator.res();
    let p_dot_n = p.dot(n);
    for iv in 0..res {
        for iu in 0..res {
            let d = integrator.microbuf().face_directions(face)[iv * res + iu];
            let denom = d.dot(n);
            if denom == 0.0 {
                continue;
            }
            let t = p_dot_n / denom;
            if t <= 0.0 {
                continue;
            }
            if (t * d - p).length_squared() < r2 {
                integrator.add_sample(iu, iv, t, 1.0);
            }
        }
    }
}

/// Scan-convert the disk's projection onto `face`.
///
/// With `q = (u, v, 1)` in the face's canonical frame, the ray `s·q` meets the
/// disk plane at `s = k / (q·n)` where `k = p·n`. The hit lies inside the disk
/// iff `qᵀMq < 0` for
/// `M = I - (p'nᵀ + np'ᵀ) + ((|p|² - r²)/k²) nnᵀ`, `p' = p/k`.
fn rasterize_ellipse<I: Integrator>(integrator: &mut I, face: Face, p: Vec3, n: Vec3, plen2: f32, r2: f32) {
    let pc = face.canonical_coords(p);
    let nc = face.canonical_coords(n);
    let k = pc.dot(nc);
    if k == 0.0 {
        return;
    }
    let pp = pc / k;
    let s = (plen2 - r2) / (k * k);
    let m = |i: usize, j: usize| {
        let id = if i == j { 1.0 } else { 0.0 };
        id - (pp[i] * nc[j] + nc[i] * pp[j]) + s * nc[i] * nc[j]
    };

    // Q(u, v) = a u² + b uv + c v² + d u + e v + f
    let a = m(0, 0);
    let b = 2.0 * m(0, 1);
    let c = m(1, 1);
    let d = 2.0 * m(0, 2);
    let e = 2.0 * m(1, 2);
    let f = m(2, 2);

    let det = 4.0 * a * c - b * b;
    if det <= 0.0 || a <= 0.0 {
        return;
    }
    // Real v exists for a given u iff the v-discriminant is non-negative,
    // which bounds u between the roots of this quadratic (and likewise for v).
    let Some((u_min, u_max)) = solve_quadratic(-det, 2.0 * b * e - 4.0 * c * d, e * e - 4.0 * c * f) else {
        return;
    };
    let Some((v_min, v_max)) = solve_quadratic(-det, 2.0 * b * d - 4.0 * a * e, d * d - 4.0 * a * f) else {
        return;
    };

    let res = integrator.res();
    let half_res = 0.5 * res as f32;
    let del = 2.0 / res as f32;
    let us = pixel_span((u_min + 1.0) * half_res, (u_max + 1.0) * half_res, res);
    let vs = pixel_span((v_min + 1.0) * half_res, (v_max + 1.0) * half_res, res);

    for iv in vs {
        let v = (iv as f32 + 0.5) * del - 1.0;
        for iu in us.clone() {
            let u = (iu as f32 + 0.5) * del - 1.0;
            let q = a * u * u + b * u * v + c * v * v + d * u + e * v + f;
            if q >= 0.0 {
                continue;
            }
            let dir = Vec3::new(u, v, 1.0);
            let q_dot_n = dir.dot(nc);
            if q_dot_n == 0.0 {
                continue;
            }
            let t = k / q_dot_n;
            if t <= 0.0 {
                continue;
            }
            integrator.add_sample(iu, iv, t * dir.length(), 1.0);
        }
    }
}

/// Real roots of `a x² + b x + c`, smallest first. `a` must be nonzero.
fn solve_quadratic(a: f32, b: f32, c: f32) -> Option<(f32, f32)> {
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }
    let sq = disc.sqrt();
    let x0 = (-b - sq) / (2.0 * a);
    let x1 = (-b + sq) / (2.0 * a);
    Some((x0.min(x1), x0.max(x1)))
}

/// Pixels whose extent intersects the raster interval `[lo, hi]`, clipped to
/// the face.
fn pixel_span(lo: f32, hi: f32, res: usize) -> Range<usize> {
    let lo = lo.max(0.0).floor() as usize;
    let hi = hi.min(res as f32).max(0.0).ceil() as usize;
    lo..hi
}
