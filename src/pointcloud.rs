//! Surfel point clouds.
//!
//! A point cloud is a flat `f32` array with a fixed stride per surfel:
//!
//! ```text
//! [P.x, P.y, P.z, N.x, N.y, N.z, radius, user data...]
//! ```
//!
//! The first three user floats, when present, are the surfel's color
//! (radiosity). Surfels are immutable once loaded.

use std::f32::consts::PI;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::util::{Error, Result};

/// Number of floats every surfel carries before its user data.
pub const SURFEL_HEADER_LEN: usize = 7;

/// Fixed leading part of a surfel record.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SurfelHeader {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub radius: f32,
}

/// Borrowed view of one surfel record.
#[derive(Debug, Clone, Copy)]
pub struct Surfel<'a> {
    data: &'a [f32],
}

impl<'a> Surfel<'a> {
    /// Wrap a raw record. The slice must hold at least the header.
    #[inline]
    pub fn new(data: &'a [f32]) -> Self {
        debug_assert!(data.len() >= SURFEL_HEADER_LEN);
        Self { data }
    }

    /// Typed view of the first seven floats.
    #[inline]
    pub fn header(&self) -> &'a SurfelHeader {
        bytemuck::from_bytes(bytemuck::cast_slice(&self.data[..SURFEL_HEADER_LEN]))
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.header().position)
    }

    #[inline]
    pub fn normal(&self) -> Vec3 {
        Vec3::from_array(self.header().normal)
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.header().radius
    }

    /// Area weight used by the hierarchy (`radius²`, the π is dropped).
    #[inline]
    pub fn area_weight(&self) -> f32 {
        let r = self.header().radius;
        r * r
    }

    /// Application data following the header.
    #[inline]
    pub fn user_data(&self) -> &'a [f32] {
        &self.data[SURFEL_HEADER_LEN..]
    }

    /// First three user floats as a color, zero-padded.
    pub fn color(&self) -> Vec3 {
        let user = self.user_data();
        let mut c = [0.0f32; 3];
        let n = user.len().min(3);
        c[..n].copy_from_slice(&user[..n]);
        Vec3::from_array(c)
    }

    /// The whole record.
    #[inline]
    pub fn raw(&self) -> &'a [f32] {
        self.data
    }
}

/// Validated, owned surfel array.
#[derive(Clone, Debug)]
pub struct PointArray {
    data: Vec<f32>,
    stride: usize,
}

impl PointArray {
    /// Take ownership of a flat array of surfels.
    ///
    /// Fails if the stride cannot hold the header, the length is not a whole
    /// number of surfels, or there are no surfels at all.
    pub fn new(data: Vec<f32>, stride: usize) -> Result<Self> {
        if stride < SURFEL_HEADER_LEN {
            return Err(Error::StrideTooSmall(stride));
        }
        if data.len() % stride != 0 {
            return Err(Error::InvalidStride { stride, len: data.len() });
        }
        if data.is_empty() {
            return Err(Error::EmptyPointCloud);
        }
        Ok(Self { data, stride })
    }

    /// Number of surfels.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len() / self.stride
    }

    /// Always false for a constructed array; kept for API symmetry.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Floats per surfel.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Floats of user data per surfel.
    #[inline]
    pub fn user_data_len(&self) -> usize {
        self.stride - SURFEL_HEADER_LEN
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Get surfel `i`.
    #[inline]
    pub fn surfel(&self, i: usize) -> Surfel<'_> {
        Surfel::new(&self.data[i * self.stride..(i + 1) * self.stride])
    }

    /// Iterate over all surfels.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = Surfel<'_>> + '_ {
        self.data.chunks_exact(self.stride).map(Surfel::new)
    }

    /// Sum of `radius²` over all surfels (total area / π).
    pub fn total_area_weight(&self) -> f32 {
        self.iter().map(|s| s.area_weight()).sum()
    }
}

/// Incremental construction of a [`PointArray`].
#[derive(Debug, Default)]
pub struct PointArrayBuilder {
    data: Vec<f32>,
    user_len: usize,
}

impl PointArrayBuilder {
    /// Builder for surfels carrying `user_len` floats of user data each.
    pub fn new(user_len: usize) -> Self {
        Self { data: Vec::new(), user_len }
    }

    /// Reserve room for `n` more surfels.
    pub fn with_capacity(mut self, n: usize) -> Self {
        self.data.reserve(n * (SURFEL_HEADER_LEN + self.user_len));
        self
    }

    /// Append a surfel from its surface area; radius is `sqrt(area/π)`.
    pub fn push(&mut self, position: Vec3, normal: Vec3, area: f32, user: &[f32]) -> &mut Self {
        self.push_disk(position, normal, (area / PI).sqrt(), user)
    }

    /// Append a surfel from its disk radius.
    ///
    /// User data is truncated or zero-padded to the builder's user length.
    pub fn push_disk(&mut self, position: Vec3, normal: Vec3, radius: f32, user: &[f32]) -> &mut Self {
        self.data.extend_from_slice(&position.to_array());
        self.data.extend_from_slice(&normal.to_array());
        self.data.push(radius);
        let n = user.len().min(self.user_len);
        self.data.extend_from_slice(&user[..n]);
        self.data.extend(std::iter::repeat(0.0).take(self.user_len - n));
        self
    }

    /// Number of surfels pushed so far.
    pub fn len(&self) -> usize {
        self.data.len() / (SURFEL_HEADER_LEN + self.user_len)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn build(self) -> Result<PointArray> {
        PointArray::new(self.data, SURFEL_HEADER_LEN + self.user_len)
    }
}
