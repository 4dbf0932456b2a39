//! End-to-end indirect diffuse queries.

use std::f32::consts::PI;

use pointgi::prelude::*;

fn settings(res: usize) -> Settings {
    Settings {
        micro_buf_res: res,
        ..Default::default()
    }
}

/// Inward-facing sphere of uniformly colored surfels.
fn colored_sphere(n: usize, radius: f32, color: [f32; 3]) -> PointArray {
    let golden = PI * (3.0 - 5.0f32.sqrt());
    let area = 4.0 * PI * radius * radius / n as f32;
    let mut b = PointArrayBuilder::new(3);
    for i in 0..n {
        let z = 1.0 - 2.0 * (i as f32 + 0.5) / n as f32;
        let rxy = (1.0 - z * z).sqrt();
        let phi = golden * i as f32;
        let dir = Vec3::new(rxy * phi.cos(), rxy * phi.sin(), z);
        b.push(dir * radius, -dir, area, &color);
    }
    b.build().unwrap()
}

/// Grey floor at z = 0 (x >= 0) meeting a red wall at x = 0.
fn corner() -> PointArray {
    let s = 0.1;
    let mut b = PointArrayBuilder::new(3);
    for j in -20..20 {
        for i in 0..40 {
            let y = (j as f32 + 0.5) * s;
            b.push(Vec3::new((i as f32 + 0.5) * s, y, 0.0), Vec3::Z, s * s, &[0.5, 0.5, 0.5]);
            b.push(Vec3::new(0.0, y, (i as f32 + 0.5) * s), Vec3::X, s * s, &[1.0, 0.0, 0.0]);
        }
    }
    b.build().unwrap()
}

#[test]
fn test_enclosure_returns_its_color() {
    let color = [0.6, 0.3, 0.9];
    let tree = PointOctree::build(&colored_sphere(3000, 2.0, color));
    let mut shader = IndirectShader::new(settings(10)).unwrap();

    let ind = shader.shade(Some(&tree), Vec3::new(0.1, -0.2, 0.0), Vec3::Y);
    assert!(ind.occlusion > 0.8, "{}", ind.occlusion);
    // Radiosity is the color scaled by coverage.
    let expected = Vec3::from_array(color) * ind.occlusion;
    assert!((ind.radiosity - expected).length() < 1e-3, "{:?} vs {expected:?}", ind.radiosity);
}

#[test]
fn test_color_bleeds_from_nearby_wall() {
    let tree = PointOctree::build(&corner());
    let mut shader = IndirectShader::new(settings(12)).unwrap();

    let near = shader.shade(Some(&tree), Vec3::new(0.2, 0.0, 0.01), Vec3::Z);
    let far = shader.shade(Some(&tree), Vec3::new(3.0, 0.0, 0.01), Vec3::Z);
    // From the floor mostly the red wall is visible; grazing floor disks leak
    // a little grey above the horizon.
    assert!(near.radiosity.x > 0.0);
    assert!(near.radiosity.x > 4.0 * near.radiosity.y, "{:?}", near.radiosity);
    assert!((near.radiosity.y - near.radiosity.z).abs() < 1e-5);
    assert!(near.radiosity.x > far.radiosity.x);
    assert!(near.occlusion > far.occlusion);

    // Facing the wall sees more of it than facing up.
    let facing = shader.shade(Some(&tree), Vec3::new(0.5, 0.0, 1.0), Vec3::NEG_X);
    let up = shader.shade(Some(&tree), Vec3::new(0.5, 0.0, 1.0), Vec3::Z);
    assert!(facing.radiosity.x > up.radiosity.x);
}

#[test]
fn test_stacked_layers_never_exceed_full_coverage() {
    // Ten overlapping sheets in front of the query point, each a different shade.
    let mut b = PointArrayBuilder::new(3);
    for layer in 0..10 {
        let z = 1.0 + 0.1 * layer as f32;
        let shade = layer as f32 / 10.0;
        for j in -15..=15 {
            for i in -15..=15 {
                let p = Vec3::new(i as f32 * 0.1, j as f32 * 0.1, z);
                b.push_disk(p, Vec3::NEG_Z, 0.08, &[shade, shade, shade]);
            }
        }
    }
    let tree = PointOctree::build(&b.build().unwrap());
    let mut shader = IndirectShader::new(settings(10)).unwrap();
    let ind = shader.shade(Some(&tree), Vec3::ZERO, Vec3::Z);

    let buf = shader.integrator().microbuf();
    for pix in buf.pixels().chunks_exact(buf.nchans()) {
        assert!(pix[1] <= 1.0 + 1e-5, "coverage {}", pix[1]);
        assert!(pix[2] <= pix[1] + 1e-5);
    }
    assert!(ind.occlusion <= 1.0);
    // The nearest (black) sheet hides most of the others.
    assert!(ind.radiosity.x < 0.2 * ind.occlusion, "{:?}", ind);
}

#[test]
fn test_parallel_workers_agree() {
    use rayon::prelude::*;

    let tree = PointOctree::build(&corner());
    let proto = IndirectShader::new(settings(8)).unwrap();
    let queries: Vec<Vec3> = (0..32).map(|i| Vec3::new(0.1 + 0.1 * i as f32, 0.3, 0.05)).collect();

    let parallel: Vec<Indirect> = queries
        .par_iter()
        .map_init(|| proto.clone(), |s, &p| s.shade(Some(&tree), p, Vec3::Z))
        .collect();
    let mut serial = proto.clone();
    for (p, par) in queries.iter().zip(&parallel) {
        assert_eq!(serial.shade(Some(&tree), *p, Vec3::Z), *par);
    }
}

#[test]
fn test_coincident_surfels_at_query_point() {
    // Two oppositely facing surfels sitting exactly on the shading point.
    let p = Vec3::new(1.0, -2.0, 0.5);
    let mut b = PointArrayBuilder::new(3);
    b.push_disk(p, Vec3::Z, 0.1, &[1.0, 1.0, 1.0]);
    b.push_disk(p, Vec3::NEG_Z, 0.1, &[1.0, 0.0, 0.0]);
    let tree = PointOctree::build(&b.build().unwrap());

    let settings = Settings {
        cone_angle: PI,
        ..settings(8)
    };
    let mut shader = IndirectShader::new(settings).unwrap();
    let ind = shader.shade(Some(&tree), p, Vec3::Z);

    let buf = shader.integrator().microbuf();
    for pix in buf.pixels().chunks_exact(buf.nchans()) {
        assert!(pix[1] <= 1.0, "coverage {}", pix[1]);
    }
    assert!(ind.occlusion <= 1.0);
    assert_eq!(ind.radiosity, Vec3::ZERO);
}
