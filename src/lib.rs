//! # pointgi
//!
//! Point-based ambient occlusion and one-bounce indirect diffuse.
//!
//! The scene is approximated by surfels (oriented disks). Per shading point,
//! every visible surfel, or an aggregate disk standing in for a distant
//! cluster of them, is rasterized into a tiny cube map around the point. The
//! cube map is then integrated over a cone about the shading normal.
//!
//! ## Modules
//!
//! - [`util`] - Errors and math types
//! - [`pointcloud`] - Flat surfel arrays
//! - [`octree`] - Surfel hierarchy with level-of-detail aggregates
//! - [`microbuf`] - Cube-map micro-buffer
//! - [`integrator`] - Occlusion and radiosity accumulators
//! - [`raster`] - Disk rasterization and hierarchy traversal
//! - [`cache`] - Filename-keyed hierarchy cache
//! - [`settings`] - Query settings
//! - [`shadeops`] - Per-query entry points
//!
//! ## Example
//!
//! ```no_run
//! use pointgi::prelude::*;
//!
//! # fn main() -> pointgi::Result<()> {
//! let mut b = PointArrayBuilder::new(3);
//! b.push_disk(Vec3::new(0.0, 0.0, 1.0), Vec3::NEG_Z, 0.5, &[1.0, 0.5, 0.2]);
//! let tree = PointOctree::build(&b.build()?);
//!
//! let mut shader = IndirectShader::new(Settings::default())?;
//! let ind = shader.shade(Some(&tree), Vec3::ZERO, Vec3::Z);
//! println!("occlusion {} radiosity {:?}", ind.occlusion, ind.radiosity);
//! # Ok(()) }
//! ```

pub mod util;
pub mod pointcloud;
pub mod octree;
pub mod microbuf;
pub mod integrator;
pub mod raster;
pub mod cache;
pub mod settings;
pub mod shadeops;

// Re-export commonly used types
pub use util::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{BBox3f, Error, Result, Vec3};
    pub use crate::pointcloud::{PointArray, PointArrayBuilder, Surfel};
    pub use crate::octree::{PointOctree, OctreeStats};
    pub use crate::microbuf::{Face, MicroBuf};
    pub use crate::integrator::{Indirect, Integrator, OcclusionIntegrator, RadiosityIntegrator};
    pub use crate::raster::{micro_rasterize, render_disk, RasterOptions};
    pub use crate::cache::{HierarchyCache, PointCloudLoader};
    pub use crate::settings::Settings;
    pub use crate::shadeops::{IndirectShader, OcclusionShader};
}
