//! Approximate disk rendering.

use std::f32::consts::{PI, SQRT_2};

use glam::Vec3;
use smallvec::SmallVec;

use super::{render_disk_exact, sphere_outside_cone, Cone, RasterOptions, MIN_NORMAL_LENGTH2};
use crate::integrator::Integrator;
use crate::microbuf::Face;

/// Axis-aligned square footprint on one face, in raster units.
#[derive(Clone, Copy, Debug)]
struct FaceBound {
    face: Face,
    u0: f32,
    u1: f32,
    v0: f32,
    v1: f32,
}

impl FaceBound {
    fn around(face: Face, p: Vec3, half_width: f32, raster_scale: f32) -> Self {
        let uv = (face.coords(p) + 1.0) * raster_scale;
        Self {
            face,
            u0: uv.x - half_width,
            u1: uv.x + half_width,
            v0: uv.y - half_width,
            v1: uv.y + half_width,
        }
    }
}

/// Render one disk into `integrator`.
///
/// `p` is the disk center relative to the shading point, `n` its unit normal
/// and `r` its radius. Back-facing disks and disks outside `cone` are culled.
/// Disks subtending more than `opts.exact_solid_angle` go through
/// [`render_disk_exact`] with the radius widened by √2 to close cracks between
/// neighbours; the rest are drawn as a square of the disk's projected area
/// with box-filtered coverage, spilling onto up to two neighbouring faces.
pub fn render_disk<I: Integrator>(integrator: &mut I, cone: &Cone, p: Vec3, n: Vec3, r: f32, opts: &RasterOptions) {
    if n.length_squared() < MIN_NORMAL_LENGTH2 {
        return;
    }
    let dot_pn = p.dot(n);
    // Keeping back faces overestimates coverage at every silhouette because
    // compositing is order dependent.
    if dot_pn > 0.0 {
        return;
    }
    let plen2 = p.length_squared();
    if plen2 == 0.0 {
        return;
    }
    if sphere_outside_cone(p, plen2, r, cone.axis, cone.cos_angle, cone.sin_angle) {
        return;
    }

    let orig_area = PI * r * r;
    if orig_area > opts.exact_solid_angle * plen2 {
        render_disk_exact(integrator, p, n, SQRT_2 * r);
        return;
    }

    let face = Face::from_direction(p);
    let p_dot_face_n = face.dot_normal(p);
    if p_dot_face_n <= 0.0 {
        return;
    }
    let res = integrator.res();
    let raster_scale = 0.5 * res as f32;

    // Solid angle is A|p̂·n|/|p|²; on the unit-distance face plane that
    // stretches by 1/cos³ of the angle to the face normal.
    let proj_area = orig_area * dot_pn.abs() / (p_dot_face_n * p_dot_face_n * p_dot_face_n);
    let half_width = 0.5 * proj_area.sqrt() * raster_scale;

    let mut bounds: SmallVec<[FaceBound; 3]> = SmallVec::new();
    let b0 = FaceBound::around(face, p, half_width, raster_scale);
    bounds.push(b0);

    let res_f = res as f32;
    if b0.u0 < 0.0 || b0.u1 > res_f {
        let side = if b0.u0 < 0.0 { 0 } else { 1 };
        let nb = face.neighbour_u(side);
        if nb.dot_normal(p) > 0.0 {
            bounds.push(FaceBound::around(nb, p, half_width, raster_scale));
        }
    }
    if b0.v0 < 0.0 || b0.v1 > res_f {
        let side = if b0.v0 < 0.0 { 0 } else { 1 };
        let nb = face.neighbour_v(side);
        if nb.dot_normal(p) > 0.0 {
            bounds.push(FaceBound::around(nb, p, half_width, raster_scale));
        }
    }

    let plen = plen2.sqrt();
    for b in &bounds {
        integrator.set_face(b.face);
        let iu0 = b.u0.max(0.0).floor() as usize;
        let iu1 = b.u1.min(res_f).max(0.0).ceil() as usize;
        let iv0 = b.v0.max(0.0).floor() as usize;
        let iv1 = b.v1.min(res_f).max(0.0).ceil() as usize;
        for iv in iv0..iv1 {
            let v_overlap = (iv as f32 + 1.0).min(b.v1) - (iv as f32).max(b.v0);
            if v_overlap <= 0.0 {
                continue;
            }
            for iu in iu0..iu1 {
                let u_overlap = (iu as f32 + 1.0).min(b.u1) - (iu as f32).max(b.u0);
                if u_overlap <= 0.0 {
                    continue;
                }
                integrator.add_sample(iu, iv, plen, u_overlap * v_overlap);
            }
        }
    }
}
