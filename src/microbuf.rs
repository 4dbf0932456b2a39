//! Cube-map micro-buffer used as the raster target for one shading query.
//!
//! Six square faces of `res × res` pixels surround the shading point. Each
//! pixel holds `nchans` floats. Ray directions and relative solid-angle
//! weights are precomputed per pixel at construction.
//!
//! Face frames: every face is mapped onto the `+z` face's canonical frame by
//! [`Face::canonical_coords`], so face coordinates are `u = x'/z'`,
//! `v = y'/z'` in that frame, both in `[-1, 1]` on the face.

use glam::{Vec2, Vec3};

/// One of the six cube faces, positive axes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Face {
    XPos = 0,
    YPos = 1,
    ZPos = 2,
    XNeg = 3,
    YNeg = 4,
    ZNeg = 5,
}

/// Neighbours across the `u = -1` (side 0) and `u = +1` (side 1) edges.
const NEIGHBOUR_U: [[Face; 2]; 6] = [
    [Face::YNeg, Face::YPos], // XPos: u = y/x
    [Face::ZNeg, Face::ZPos], // YPos: u = z/y
    [Face::XNeg, Face::XPos], // ZPos: u = x/z
    [Face::ZNeg, Face::ZPos], // XNeg: u = z/-x
    [Face::XNeg, Face::XPos], // YNeg: u = x/-y
    [Face::YNeg, Face::YPos], // ZNeg: u = y/-z
];

/// Neighbours across the `v = -1` (side 0) and `v = +1` (side 1) edges.
const NEIGHBOUR_V: [[Face; 2]; 6] = [
    [Face::ZNeg, Face::ZPos],
    [Face::XNeg, Face::XPos],
    [Face::YNeg, Face::YPos],
    [Face::YNeg, Face::YPos],
    [Face::ZNeg, Face::ZPos],
    [Face::XNeg, Face::XPos],
];

impl Face {
    pub const COUNT: usize = 6;

    pub const ALL: [Face; 6] = [
        Face::XPos,
        Face::YPos,
        Face::ZPos,
        Face::XNeg,
        Face::YNeg,
        Face::ZNeg,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Face for an index in `0..6`. Out-of-range indices are a caller bug.
    #[inline]
    pub fn from_index(i: usize) -> Face {
        assert!(i < Self::COUNT, "face index {i} out of range");
        Self::ALL[i]
    }

    /// Face a direction points into.
    ///
    /// The largest absolute component wins; ties go to x, then y, then z.
    /// `p` must be nonzero.
    #[inline]
    pub fn from_direction(p: Vec3) -> Face {
        debug_assert!(p != Vec3::ZERO, "zero-length direction has no face");
        let a = p.abs();
        if a.x >= a.y && a.x >= a.z {
            if p.x > 0.0 { Face::XPos } else { Face::XNeg }
        } else if a.y >= a.z {
            if p.y > 0.0 { Face::YPos } else { Face::YNeg }
        } else if p.z > 0.0 {
            Face::ZPos
        } else {
            Face::ZNeg
        }
    }

    /// Outward unit normal.
    #[inline]
    pub fn normal(self) -> Vec3 {
        match self {
            Face::XPos => Vec3::X,
            Face::YPos => Vec3::Y,
            Face::ZPos => Vec3::Z,
            Face::XNeg => Vec3::NEG_X,
            Face::YNeg => Vec3::NEG_Y,
            Face::ZNeg => Vec3::NEG_Z,
        }
    }

    /// `dot(normal(), p)` without the multiplies.
    #[inline]
    pub fn dot_normal(self, p: Vec3) -> f32 {
        match self {
            Face::XPos => p.x,
            Face::YPos => p.y,
            Face::ZPos => p.z,
            Face::XNeg => -p.x,
            Face::YNeg => -p.y,
            Face::ZNeg => -p.z,
        }
    }

    /// Rotate `p` so this face plays the role of the `+z` face.
    ///
    /// Each mapping is an orthogonal permutation with sign, so dot products
    /// and lengths are preserved.
    #[inline]
    pub fn canonical_coords(self, p: Vec3) -> Vec3 {
        match self {
            Face::XPos => Vec3::new(p.y, p.z, p.x),
            Face::YPos => Vec3::new(p.z, p.x, p.y),
            Face::ZPos => p,
            Face::XNeg => Vec3::new(p.z, p.y, -p.x),
            Face::YNeg => Vec3::new(p.x, p.z, -p.y),
            Face::ZNeg => Vec3::new(p.y, p.x, -p.z),
        }
    }

    /// Project a direction onto this face's `[-1, 1]²` plane.
    ///
    /// The component along the face normal must be nonzero.
    #[inline]
    pub fn coords(self, p: Vec3) -> Vec2 {
        let p = self.canonical_coords(p);
        debug_assert!(p.z != 0.0, "direction parallel to face plane");
        let zinv = 1.0 / p.z;
        Vec2::new(p.x * zinv, p.y * zinv)
    }

    /// Unnormalized direction through face coordinates `(u, v)`.
    ///
    /// Inverse of [`Face::coords`].
    #[inline]
    pub fn ray_direction(self, u: f32, v: f32) -> Vec3 {
        match self {
            Face::XPos => Vec3::new(1.0, u, v),
            Face::YPos => Vec3::new(v, 1.0, u),
            Face::ZPos => Vec3::new(u, v, 1.0),
            Face::XNeg => Vec3::new(-1.0, v, u),
            Face::YNeg => Vec3::new(u, -1.0, v),
            Face::ZNeg => Vec3::new(v, u, -1.0),
        }
    }

    /// Face sharing the `u = -1` (`side == 0`) or `u = +1` (`side == 1`) edge.
    #[inline]
    pub fn neighbour_u(self, side: usize) -> Face {
        NEIGHBOUR_U[self.index()][side]
    }

    /// Face sharing the `v = -1` (`side == 0`) or `v = +1` (`side == 1`) edge.
    #[inline]
    pub fn neighbour_v(self, side: usize) -> Face {
        NEIGHBOUR_V[self.index()][side]
    }
}

/// Cube-map pixel store with precomputed directions and pixel weights.
#[derive(Clone, Debug)]
pub struct MicroBuf {
    res: usize,
    nchans: usize,
    face_size: usize,
    pixels: Vec<f32>,
    default_pixels: Vec<f32>,
    /// Unit ray direction per pixel, all faces.
    directions: Vec<Vec3>,
    /// Relative solid angle per pixel; identical for every face.
    pixel_sizes: Vec<f32>,
}

impl MicroBuf {
    /// Allocate a buffer of `face_res²` pixels per face, `nchans` floats per
    /// pixel, every pixel initialized from `default_pixel`.
    pub fn new(face_res: usize, nchans: usize, default_pixel: &[f32]) -> Self {
        assert!(face_res > 0, "micro-buffer resolution must be positive");
        assert_eq!(default_pixel.len(), nchans, "default pixel must have one value per channel");

        let npix = face_res * face_res;
        let face_size = npix * nchans;
        let mut default_pixels = Vec::with_capacity(Face::COUNT * face_size);
        for _ in 0..Face::COUNT * npix {
            default_pixels.extend_from_slice(default_pixel);
        }

        let del = 2.0 / face_res as f32;
        let coord = |i: usize| (0.5 + i as f32) * del - 1.0;

        let mut directions = Vec::with_capacity(Face::COUNT * npix);
        for face in Face::ALL {
            for iv in 0..face_res {
                for iu in 0..face_res {
                    directions.push(face.ray_direction(coord(iu), coord(iv)).normalize());
                }
            }
        }

        // Pixel area on the unit-distance plane, times cos of the angle to
        // the face normal, over squared distance.
        let del2 = del * del;
        let mut pixel_sizes = Vec::with_capacity(npix);
        for iv in 0..face_res {
            for iu in 0..face_res {
                let (u, v) = (coord(iu), coord(iv));
                let d2 = 1.0 + u * u + v * v;
                pixel_sizes.push(del2 / (d2 * d2.sqrt()));
            }
        }

        Self {
            res: face_res,
            nchans,
            face_size,
            pixels: default_pixels.clone(),
            default_pixels,
            directions,
            pixel_sizes,
        }
    }

    /// Face resolution in pixels.
    #[inline]
    pub fn res(&self) -> usize {
        self.res
    }

    #[inline]
    pub fn nchans(&self) -> usize {
        self.nchans
    }

    /// Floats per face.
    #[inline]
    pub fn face_size(&self) -> usize {
        self.face_size
    }

    /// Restore every pixel to the default.
    #[inline]
    pub fn reset(&mut self) {
        self.pixels.copy_from_slice(&self.default_pixels);
    }

    /// Swap in externally owned storage as the live pixels, returning the
    /// previous storage. The new buffer must have the full size.
    pub fn reset_with(&mut self, pixels: Vec<f32>) -> Vec<f32> {
        assert_eq!(pixels.len(), self.pixels.len(), "replacement buffer has wrong size");
        std::mem::replace(&mut self.pixels, pixels)
    }

    /// All live pixels, face-major.
    #[inline]
    pub fn pixels(&self) -> &[f32] {
        &self.pixels
    }

    /// Pixel block of one face.
    #[inline]
    pub fn face(&self, face: Face) -> &[f32] {
        let start = face.index() * self.face_size;
        &self.pixels[start..start + self.face_size]
    }

    #[inline]
    pub fn face_mut(&mut self, face: Face) -> &mut [f32] {
        let start = face.index() * self.face_size;
        &mut self.pixels[start..start + self.face_size]
    }

    /// Channels of pixel `(iu, iv)` on `face`.
    #[inline]
    pub fn pixel(&self, face: Face, iu: usize, iv: usize) -> &[f32] {
        debug_assert!(iu < self.res && iv < self.res);
        let start = face.index() * self.face_size + (iv * self.res + iu) * self.nchans;
        &self.pixels[start..start + self.nchans]
    }

    #[inline]
    pub fn pixel_mut(&mut self, face: Face, iu: usize, iv: usize) -> &mut [f32] {
        debug_assert!(iu < self.res && iv < self.res);
        let start = face.index() * self.face_size + (iv * self.res + iu) * self.nchans;
        &mut self.pixels[start..start + self.nchans]
    }

    /// Unit direction through the center of pixel `(iu, iv)` on `face`.
    #[inline]
    pub fn ray_direction(&self, face: Face, iu: usize, iv: usize) -> Vec3 {
        self.directions[(face.index() * self.res + iv) * self.res + iu]
    }

    /// Unit directions of one face, row-major.
    #[inline]
    pub fn face_directions(&self, face: Face) -> &[Vec3] {
        let npix = self.res * self.res;
        &self.directions[face.index() * npix..(face.index() + 1) * npix]
    }

    /// Relative solid angle of pixel `(iu, iv)` (same on every face).
    #[inline]
    pub fn pixel_size(&self, iu: usize, iv: usize) -> f32 {
        self.pixel_sizes[iv * self.res + iu]
    }

    /// Relative solid angles of one face, row-major.
    #[inline]
    pub fn pixel_sizes(&self) -> &[f32] {
        &self.pixel_sizes
    }

    /// Cone-weighted average of one channel over the whole cube.
    ///
    /// Each pixel is weighted by `(dot(dir, n) - cos(cone_angle)) * pixel_size`
    /// and pixels with a non-positive first factor are skipped. `value` maps a
    /// pixel to the quantity being integrated. Returns zero when no pixel lies
    /// inside the cone.
    pub fn cone_integrate<T, F>(&self, n: Vec3, cone_angle: f32, zero: T, mut value: F) -> T
    where
        T: std::ops::Add<Output = T> + std::ops::Mul<f32, Output = T> + Copy,
        F: FnMut(&[f32]) -> T,
    {
        let cos_cone = cone_angle.cos();
        let npix = self.res * self.res;
        let mut sum = zero;
        let mut total_weight = 0.0f32;
        for face in Face::ALL {
            let dirs = self.face_directions(face);
            let pixels = self.face(face);
            for i in 0..npix {
                let d = dirs[i].dot(n) - cos_cone;
                if d <= 0.0 {
                    continue;
                }
                let w = d * self.pixel_sizes[i];
                sum = sum + value(&pixels[i * self.nchans..(i + 1) * self.nchans]) * w;
                total_weight += w;
            }
        }
        if total_weight == 0.0 {
            zero
        } else {
            sum * (1.0 / total_weight)
        }
    }
}
