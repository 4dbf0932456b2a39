//! Ambient occlusion integrator.

use glam::Vec3;

use super::Integrator;
use crate::microbuf::{Face, MicroBuf};

/// Accumulates coverage in a single channel.
#[derive(Clone, Debug)]
pub struct OcclusionIntegrator {
    buf: MicroBuf,
    face: Face,
}

impl OcclusionIntegrator {
    /// Create an integrator with `face_res × face_res` pixels per cube face.
    pub fn new(face_res: usize) -> Self {
        Self {
            buf: MicroBuf::new(face_res, 1, &[0.0]),
            face: Face::XPos,
        }
    }

    /// Fraction of the cone about `n` that is covered, in `[0, 1]`.
    ///
    /// Pixels are weighted by `dot(dir, n) - cos(cone_angle)` times their
    /// solid angle, so the weight falls to zero at the cone boundary.
    pub fn occlusion(&self, n: Vec3, cone_angle: f32) -> f32 {
        self.buf.cone_integrate(n, cone_angle, 0.0f32, |pix| pix[0].min(1.0))
    }
}

impl Integrator for OcclusionIntegrator {
    type Output = f32;

    #[inline]
    fn microbuf(&self) -> &MicroBuf {
        &self.buf
    }

    fn clear(&mut self) {
        self.buf.reset();
    }

    #[inline]
    fn set_face(&mut self, face: Face) {
        self.face = face;
    }

    /// Coverage is summed rather than composited as `1-(1-a)(1-b)`: surfels
    /// tile surfaces rather than stacking as translucent layers.
    #[inline]
    fn add_sample(&mut self, iu: usize, iv: usize, _distance: f32, coverage: f32) {
        self.buf.pixel_mut(self.face, iu, iv)[0] += coverage;
    }

    #[inline]
    fn set_point_data(&mut self, _data: &[f32]) {}

    fn reduce(&self, n: Vec3, cone_angle: f32) -> f32 {
        self.occlusion(n, cone_angle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn fill_face(integ: &mut OcclusionIntegrator, face: Face, coverage: f32) {
        integ.set_face(face);
        let res = integ.res();
        for iv in 0..res {
            for iu in 0..res {
                integ.add_sample(iu, iv, 1.0, coverage);
            }
        }
    }

    #[test]
    fn test_empty_is_unoccluded() {
        let integ = OcclusionIntegrator::new(8);
        assert_eq!(integ.occlusion(Vec3::Z, FRAC_PI_2), 0.0);
    }

    #[test]
    fn test_coverage_adds_and_clamps() {
        let mut integ = OcclusionIntegrator::new(4);
        integ.set_face(Face::ZPos);
        integ.add_sample(1, 1, 1.0, 0.75);
        integ.add_sample(1, 1, 2.0, 0.75);
        assert_eq!(integ.microbuf().pixel(Face::ZPos, 1, 1)[0], 1.5);

        fill_face(&mut integ, Face::ZPos, 2.0);
        // Only +z is visible looking straight up with a narrow cone.
        let occ = integ.occlusion(Vec3::Z, 0.5);
        assert!((occ - 1.0).abs() < 1e-6, "{occ}");
    }

    #[test]
    fn test_hemisphere_half_covered() {
        let mut integ = OcclusionIntegrator::new(16);
        // Cover everything below the horizontal plane z = 0.
        fill_face(&mut integ, Face::ZNeg, 1.0);
        for face in [Face::XPos, Face::XNeg, Face::YPos, Face::YNeg] {
            integ.set_face(face);
            let res = integ.res();
            for iv in 0..res {
                for iu in 0..res {
                    if integ.microbuf().ray_direction(face, iu, iv).z < 0.0 {
                        integ.add_sample(iu, iv, 1.0, 1.0);
                    }
                }
            }
        }
        // Normal lies in the plane: half the hemisphere is blocked.
        let occ = integ.occlusion(Vec3::X, FRAC_PI_2);
        assert!((occ - 0.5).abs() < 0.02, "{occ}");
        // Normal facing away from the blocker: nothing blocked.
        assert_eq!(integ.occlusion(Vec3::Z, FRAC_PI_2), 0.0);
        // Facing into it: fully blocked.
        assert!((integ.occlusion(Vec3::NEG_Z, FRAC_PI_2) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_clear() {
        let mut integ = OcclusionIntegrator::new(4);
        fill_face(&mut integ, Face::XNeg, 1.0);
        assert!(integ.occlusion(Vec3::NEG_X, FRAC_PI_2) > 0.0);
        integ.clear();
        assert_eq!(integ.occlusion(Vec3::NEG_X, FRAC_PI_2), 0.0);
    }
}
