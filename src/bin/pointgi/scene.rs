//! Procedural surfel scenes for the CLI.

use glam::Vec3;
use pointgi::pointcloud::{PointArray, PointArrayBuilder};
use pointgi::Result;

/// Half-extent of the generated floor.
pub const FLOOR_EXTENT: f32 = 4.0;
/// Surfel spacing.
pub const SPACING: f32 = 0.05;

const FLOOR_COLOR: [f32; 3] = [0.5, 0.5, 0.5];
const WALL_COLOR: [f32; 3] = [0.9, 0.1, 0.1];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneKind {
    /// A square floor at `z = 0` facing up.
    Plane,
    /// The floor plus a wall at `x = 0` facing `+x`.
    Corner,
}

impl SceneKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "plane" => Some(Self::Plane),
            "corner" => Some(Self::Corner),
            _ => None,
        }
    }
}

/// Tile the scene with touching disks of area `SPACING²`.
pub fn build(kind: SceneKind) -> Result<PointArray> {
    let n = (2.0 * FLOOR_EXTENT / SPACING).round() as i32;
    let area = SPACING * SPACING;
    let mut b = PointArrayBuilder::new(3).with_capacity((n * n) as usize * 2);

    let x0 = match kind {
        SceneKind::Plane => -FLOOR_EXTENT,
        SceneKind::Corner => 0.0,
    };
    let nx = ((FLOOR_EXTENT - x0) / SPACING).round() as i32;
    for j in 0..n {
        for i in 0..nx {
            let p = Vec3::new(
                x0 + (i as f32 + 0.5) * SPACING,
                -FLOOR_EXTENT + (j as f32 + 0.5) * SPACING,
                0.0,
            );
            b.push(p, Vec3::Z, area, &FLOOR_COLOR);
        }
    }

    if kind == SceneKind::Corner {
        let nz = (FLOOR_EXTENT / SPACING).round() as i32;
        for j in 0..n {
            for k in 0..nz {
                let p = Vec3::new(
                    0.0,
                    -FLOOR_EXTENT + (j as f32 + 0.5) * SPACING,
                    (k as f32 + 0.5) * SPACING,
                );
                b.push(p, Vec3::X, area, &WALL_COLOR);
            }
        }
    }

    b.build()
}

/// `count` query points on the floor, walking away from `x = 0`.
pub fn query_points(count: usize) -> Vec<(Vec3, Vec3)> {
    let count = count.max(1);
    (0..count)
        .map(|i| {
            let x = SPACING + (i as f32 / count as f32) * (FLOOR_EXTENT * 0.5);
            (Vec3::new(x, 0.0, 0.0), Vec3::Z)
        })
        .collect()
}
