//! Integrators: stateful accumulators over a [`MicroBuf`].
//!
//! An integrator decides how a rasterized sample updates a pixel and how the
//! finished buffer reduces to a result. The rasterizer is generic over
//! [`Integrator`], so the per-pixel update is statically dispatched.
//!
//! - [`OcclusionIntegrator`] - single coverage channel, scalar occlusion
//! - [`RadiosityIntegrator`] - depth, coverage and RGB, front-to-back

mod occlusion;
mod radiosity;

pub use occlusion::OcclusionIntegrator;
pub use radiosity::{Indirect, RadiosityIntegrator};

use glam::Vec3;

use crate::microbuf::{Face, MicroBuf};

/// Capability set the rasterizer needs from an accumulator.
pub trait Integrator {
    /// Result of reducing the buffer.
    type Output;

    /// The underlying micro-buffer.
    fn microbuf(&self) -> &MicroBuf;

    /// Face resolution in pixels.
    #[inline]
    fn res(&self) -> usize {
        self.microbuf().res()
    }

    /// Reset every pixel to the empty state.
    fn clear(&mut self);

    /// Select the face that subsequent [`add_sample`](Self::add_sample) calls write to.
    fn set_face(&mut self, face: Face);

    /// Accumulate one sample into pixel `(iu, iv)` of the current face.
    fn add_sample(&mut self, iu: usize, iv: usize, distance: f32, coverage: f32);

    /// Stage per-surfel user data for the next samples.
    fn set_point_data(&mut self, data: &[f32]);

    /// Integrate the buffer over the cone of half-angle `cone_angle` about `n`.
    fn reduce(&self, n: Vec3, cone_angle: f32) -> Self::Output;
}
