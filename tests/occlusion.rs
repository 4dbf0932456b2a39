//! End-to-end occlusion queries against procedural surfel clouds.

use std::f32::consts::{FRAC_PI_2, PI};

use pointgi::prelude::*;

/// Square floor at z = 0 of touching surfels facing up.
fn floor(extent: f32, spacing: f32) -> PointArray {
    let n = (2.0 * extent / spacing).round() as i32;
    let mut b = PointArrayBuilder::new(0);
    for j in 0..=n {
        for i in 0..=n {
            let p = Vec3::new(-extent + i as f32 * spacing, -extent + j as f32 * spacing, 0.0);
            b.push(p, Vec3::Z, spacing * spacing, &[]);
        }
    }
    b.build().unwrap()
}

/// Inward-facing sphere of `n` surfels (Fibonacci spiral).
fn inward_sphere(n: usize, radius: f32) -> PointArray {
    let golden = PI * (3.0 - 5.0f32.sqrt());
    let area = 4.0 * PI * radius * radius / n as f32;
    let mut b = PointArrayBuilder::new(0);
    for i in 0..n {
        let z = 1.0 - 2.0 * (i as f32 + 0.5) / n as f32;
        let rxy = (1.0 - z * z).sqrt();
        let phi = golden * i as f32;
        let dir = Vec3::new(rxy * phi.cos(), rxy * phi.sin(), z);
        b.push(dir * radius, -dir, area, &[]);
    }
    b.build().unwrap()
}

fn shader(res: usize) -> OcclusionShader {
    let settings = Settings {
        micro_buf_res: res,
        ..Default::default()
    };
    OcclusionShader::new(settings).unwrap()
}

#[test]
fn test_ground_plane_half_covers_sideways_hemisphere() {
    let tree = PointOctree::build(&floor(10.0, 0.2));
    let mut occ = shader(16);
    let p = Vec3::new(0.0, 0.0, 0.5);

    // Normal parallel to the floor: the lower half of the hemisphere is covered.
    let sideways = occ.shade(Some(&tree), p, Vec3::X);
    assert!((sideways - 0.5).abs() < 0.1, "sideways occlusion {sideways}");

    // Facing the floor: almost fully covered. Facing away: nothing.
    let down = occ.shade(Some(&tree), p, Vec3::NEG_Z);
    assert!(down > 0.85, "down occlusion {down}");
    let up = occ.shade(Some(&tree), p, Vec3::Z);
    assert_eq!(up, 0.0);
}

#[test]
fn test_enclosed_point_fully_occluded() {
    let tree = PointOctree::build(&inward_sphere(3000, 1.0));
    let settings = Settings {
        micro_buf_res: 12,
        max_solid_angle: 0.01,
        ..Default::default()
    };
    let mut occ = OcclusionShader::new(settings).unwrap();
    for n in [Vec3::X, Vec3::NEG_Y, Vec3::new(1.0, 1.0, 1.0)] {
        let ao = occ.shade(Some(&tree), Vec3::ZERO, n);
        assert!(ao > 0.85 && ao <= 1.0, "{n:?}: {ao}");
    }
}

#[test]
fn test_occlusion_falls_off_with_distance() {
    let tree = PointOctree::build(&floor(2.0, 0.1));
    let mut occ = shader(10);
    let mut last = 1.0;
    for h in [0.25f32, 1.0, 4.0, 16.0] {
        let ao = occ.shade(Some(&tree), Vec3::new(0.0, 0.0, h), Vec3::NEG_Z);
        assert!(ao < last, "h={h}: {ao} !< {last}");
        last = ao;
    }
    assert!(last < 0.1);
}

#[test]
fn test_single_surfel_traversal_matches_direct_render() {
    let pos = Vec3::new(-0.5, 0.2, 2.0);
    let nrm = Vec3::new(0.3, 0.0, -1.0).normalize();
    let mut b = PointArrayBuilder::new(0);
    b.push_disk(pos, nrm, 0.3, &[]);
    let tree = PointOctree::build(&b.build().unwrap());

    let opts = RasterOptions::default();
    let mut traversed = OcclusionIntegrator::new(10);
    micro_rasterize(&mut traversed, &tree, Vec3::ZERO, Vec3::Z, FRAC_PI_2, f32::MAX, &opts);

    let mut direct = OcclusionIntegrator::new(10);
    render_disk(&mut direct, &pointgi::raster::Cone::new(Vec3::Z, FRAC_PI_2), pos, nrm, 0.3, &opts);

    let a = traversed.occlusion(Vec3::Z, FRAC_PI_2);
    let b = direct.occlusion(Vec3::Z, FRAC_PI_2);
    assert!(b > 0.0);
    assert!((a - b).abs() < 1e-5, "{a} vs {b}");
}

#[test]
fn test_root_area_equals_leaf_area() {
    // Deterministic scatter with varying radii.
    let mut state = 0x2545_f491u32;
    let mut next = || {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        state as f32 / u32::MAX as f32
    };
    let mut b = PointArrayBuilder::new(0);
    for _ in 0..2000 {
        let p = Vec3::new(next(), next(), next()) * 10.0;
        let n = Vec3::new(next() - 0.5, next() - 0.5, next() - 0.5);
        b.push_disk(p, n, 0.01 + 0.1 * next(), &[]);
    }
    let points = b.build().unwrap();
    let tree = PointOctree::build(&points);

    let leaf_area: f32 = tree
        .nodes()
        .iter()
        .filter(|n| n.is_leaf())
        .flat_map(|n| tree.leaf_surfels(n))
        .map(|s| s.radius() * s.radius())
        .sum();
    let root = tree.node(tree.root());
    assert!((root.agg_r * root.agg_r - leaf_area).abs() < leaf_area * 1e-4);
    assert!((leaf_area - points.total_area_weight()).abs() < leaf_area * 1e-4);
}

#[test]
fn test_cached_hierarchy_shared_across_shaders() {
    let cache = HierarchyCache::new();
    let loader = |_: &std::path::Path| -> Result<PointArray> { Ok(floor(3.0, 0.2)) };
    let a = cache.get_or_load(std::path::Path::new("floor.ptc"), &loader);
    let b = cache.get_or_load(std::path::Path::new("floor.ptc"), &loader);

    let mut s1 = shader(8);
    let mut s2 = shader(8);
    let p = Vec3::new(0.3, 0.1, 1.0);
    assert_eq!(
        s1.shade(a.as_deref(), p, Vec3::NEG_Z),
        s2.shade(b.as_deref(), p, Vec3::NEG_Z)
    );

    // A failed lookup shades as unoccluded.
    let missing = |p: &std::path::Path| -> Result<PointArray> { Err(Error::FileNotFound(p.to_path_buf())) };
    let none = cache.get_or_load(std::path::Path::new("nope.ptc"), &missing);
    assert_eq!(s1.shade(none.as_deref(), p, Vec3::NEG_Z), 0.0);
}
