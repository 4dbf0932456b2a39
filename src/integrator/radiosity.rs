//! One-bounce diffuse radiosity integrator.

use glam::{Vec3, Vec4};

use super::Integrator;
use crate::microbuf::{Face, MicroBuf};

const DEPTH: usize = 0;
const COVERAGE: usize = 1;
const COLOR: usize = 2;

/// Result of a radiosity reduction.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Indirect {
    /// Cone-weighted incoming radiosity.
    pub radiosity: Vec3,
    /// Occlusion over the same cone, from the coverage channel.
    pub occlusion: f32,
}

/// Accumulates nearest depth, coverage and RGB radiosity per pixel.
#[derive(Clone, Debug)]
pub struct RadiosityIntegrator {
    buf: MicroBuf,
    face: Face,
    /// Color of the surfel currently being rasterized.
    curr_rad: Vec3,
}

impl RadiosityIntegrator {
    /// Create an integrator with `face_res × face_res` pixels per cube face.
    pub fn new(face_res: usize) -> Self {
        Self {
            buf: MicroBuf::new(face_res, 5, &[f32::MAX, 0.0, 0.0, 0.0, 0.0]),
            face: Face::XPos,
            curr_rad: Vec3::ZERO,
        }
    }

    /// Cone-weighted average radiosity about `n`.
    pub fn radiosity(&self, n: Vec3, cone_angle: f32) -> Vec3 {
        self.buf.cone_integrate(n, cone_angle, Vec3::ZERO, |pix| {
            Vec3::new(pix[COLOR], pix[COLOR + 1], pix[COLOR + 2])
        })
    }

    /// Radiosity and occlusion over the same cone in one pass.
    pub fn radiosity_and_occlusion(&self, n: Vec3, cone_angle: f32) -> Indirect {
        let sum = self.buf.cone_integrate(n, cone_angle, Vec4::ZERO, |pix| {
            Vec4::new(pix[COLOR], pix[COLOR + 1], pix[COLOR + 2], pix[COVERAGE].min(1.0))
        });
        Indirect {
            radiosity: sum.truncate(),
            occlusion: sum.w,
        }
    }
}

impl Integrator for RadiosityIntegrator {
    type Output = Indirect;

    #[inline]
    fn microbuf(&self) -> &MicroBuf {
        &self.buf
    }

    fn clear(&mut self) {
        self.buf.reset();
        self.curr_rad = Vec3::ZERO;
    }

    #[inline]
    fn set_face(&mut self, face: Face) {
        self.face = face;
    }

    /// Front-to-back compositing: a pixel that already reached full
    /// coverage ignores every later (farther) sample.
    #[inline]
    fn add_sample(&mut self, iu: usize, iv: usize, distance: f32, coverage: f32) {
        let rad = self.curr_rad;
        let pix = self.buf.pixel_mut(self.face, iu, iv);
        if distance < pix[DEPTH] {
            pix[DEPTH] = distance;
        }
        let remaining = 1.0 - pix[COVERAGE];
        if remaining > 0.0 {
            let c = coverage.min(remaining);
            pix[COVERAGE] += c;
            pix[COLOR] += c * rad.x;
            pix[COLOR + 1] += c * rad.y;
            pix[COLOR + 2] += c * rad.z;
        }
    }

    /// Reads the first three floats as RGB; missing channels are zero.
    #[inline]
    fn set_point_data(&mut self, data: &[f32]) {
        let mut c = [0.0f32; 3];
        let n = data.len().min(3);
        c[..n].copy_from_slice(&data[..n]);
        self.curr_rad = Vec3::from_array(c);
    }

    fn reduce(&self, n: Vec3, cone_angle: f32) -> Indirect {
        self.radiosity_and_occlusion(n, cone_angle)
    }
}
