//! Shading entry points: one occlusion or indirect-diffuse value per query.
//!
//! A shader owns one integrator and reuses it across queries, so a worker
//! thread should hold its own shader. Hierarchies are borrowed per call and
//! may be shared freely between shaders.
//!
//! ```no_run
//! use pointgi::prelude::*;
//!
//! # fn demo(tree: &PointOctree) -> pointgi::Result<()> {
//! let mut shader = OcclusionShader::new(Settings::default())?;
//! let ao = shader.shade(Some(tree), Vec3::ZERO, Vec3::Z);
//! # Ok(()) }
//! ```

use glam::Vec3;

use crate::integrator::{Indirect, Integrator, OcclusionIntegrator, RadiosityIntegrator};
use crate::octree::PointOctree;
use crate::raster::{micro_rasterize, RasterOptions, MIN_NORMAL_LENGTH2};
use crate::settings::Settings;
use crate::util::{Error, Result};

/// Query driver over one integrator kind.
#[derive(Clone, Debug)]
pub struct Shader<I> {
    settings: Settings,
    opts: RasterOptions,
    integrator: I,
}

/// Ambient occlusion lookups.
pub type OcclusionShader = Shader<OcclusionIntegrator>;

/// Indirect diffuse (plus occlusion) lookups.
pub type IndirectShader = Shader<RadiosityIntegrator>;

impl OcclusionShader {
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;
        let integrator = OcclusionIntegrator::new(settings.micro_buf_res);
        Ok(Self::with_integrator(settings, integrator))
    }
}

impl IndirectShader {
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;
        let integrator = RadiosityIntegrator::new(settings.micro_buf_res);
        Ok(Self::with_integrator(settings, integrator))
    }
}

impl<I> Shader<I>
where
    I: Integrator,
    I::Output: Default,
{
    fn with_integrator(settings: Settings, integrator: I) -> Self {
        Self {
            opts: settings.raster_options(),
            settings,
            integrator,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Integrator state after the last query.
    pub fn integrator(&self) -> &I {
        &self.integrator
    }

    /// Evaluate one query at `p` with normal `n` (need not be unit length).
    ///
    /// A missing hierarchy or a zero normal gives the neutral result.
    pub fn shade(&mut self, tree: Option<&PointOctree>, p: Vec3, n: Vec3) -> I::Output {
        let Some(tree) = tree else {
            return I::Output::default();
        };
        if n.length_squared() < MIN_NORMAL_LENGTH2 {
            return I::Output::default();
        }
        let n = n.normalize();
        let p = p + n * self.settings.bias;

        self.integrator.clear();
        micro_rasterize(
            &mut self.integrator,
            tree,
            p,
            n,
            self.settings.cone_angle,
            self.settings.max_solid_angle,
            &self.opts,
        );
        self.integrator.reduce(n, self.settings.cone_angle)
    }

    /// Evaluate a batch of queries, one result per point.
    pub fn shade_grid(&mut self, tree: Option<&PointOctree>, points: &[Vec3], normals: &[Vec3]) -> Result<Vec<I::Output>> {
        if points.len() != normals.len() {
            return Err(Error::other(format!(
                "{} points but {} normals",
                points.len(),
                normals.len()
            )));
        }
        Ok(points
            .iter()
            .zip(normals)
            .map(|(&p, &n)| self.shade(tree, p, n))
            .collect())
    }
}

impl IndirectShader {
    /// Indirect diffuse color only.
    pub fn radiosity(&mut self, tree: Option<&PointOctree>, p: Vec3, n: Vec3) -> Vec3 {
        let Indirect { radiosity, .. } = self.shade(tree, p, n);
        radiosity
    }
}
