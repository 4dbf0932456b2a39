//! Level-of-detail traversal of the surfel hierarchy.

use std::f32::consts::PI;

use glam::Vec3;
use smallvec::SmallVec;

use super::{render_disk, sphere_outside_cone, Cone, RasterOptions};
use crate::integrator::Integrator;
use crate::octree::{Node, NodeId, PointOctree};

/// Capacity of the explicit traversal stack. A depth-first walk of a tree
/// capped at depth 24 with fan-out 8 never holds more than 24·7 + 1 entries.
pub const MAX_STACK_DEPTH: usize = 200;

/// Rasterize every part of `tree` visible from `p` into `integrator`.
///
/// `n` is the unit shading normal and `cone_angle` the half-angle of the cone
/// of interest about it. A node whose aggregate disk subtends less than
/// `max_solid_angle` steradians is drawn as that single disk; otherwise its
/// children (or, for a leaf, its surfels) are visited nearest first.
///
/// The integrator is not cleared first.
pub fn micro_rasterize<I: Integrator>(
    integrator: &mut I,
    tree: &PointOctree,
    p: Vec3,
    n: Vec3,
    cone_angle: f32,
    max_solid_angle: f32,
    opts: &RasterOptions,
) {
    let cone = Cone::new(n, cone_angle);
    let mut stack: SmallVec<[NodeId; MAX_STACK_DEPTH]> = SmallVec::new();
    stack.push(tree.root());
    while let Some(id) = stack.pop() {
        render_node(integrator, tree, tree.node(id), p, &cone, max_solid_angle, opts, &mut stack);
        debug_assert!(stack.len() <= MAX_STACK_DEPTH);
    }
}

#[allow(clippy::too_many_arguments)]
fn render_node<I: Integrator>(
    integrator: &mut I,
    tree: &PointOctree,
    node: &Node,
    p: Vec3,
    cone: &Cone,
    max_solid_angle: f32,
    opts: &RasterOptions,
    stack: &mut SmallVec<[NodeId; MAX_STACK_DEPTH]>,
) {
    let c = node.center - p;
    if sphere_outside_cone(c, c.length_squared(), node.bound_radius, cone.axis, cone.cos_angle, cone.sin_angle) {
        return;
    }

    let agg = node.agg_p - p;
    let solid_angle = PI * node.agg_r * node.agg_r / agg.length_squared();
    if solid_angle < max_solid_angle {
        integrator.set_point_data(&node.agg_col.to_array());
        render_disk(integrator, cone, agg, node.agg_n, node.agg_r, opts);
        return;
    }

    if node.is_leaf() {
        let mut order: SmallVec<[(f32, usize); 8]> = tree
            .leaf_surfels(node)
            .enumerate()
            .map(|(i, s)| ((s.position() - p).length_squared(), i))
            .collect();
        order.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));
        for &(_, i) in &order {
            let s = tree.leaf_surfel(node, i);
            integrator.set_point_data(s.user_data());
            render_disk(integrator, cone, s.position() - p, s.normal(), s.radius(), opts);
        }
        return;
    }

    let mut children: SmallVec<[(f32, NodeId); 8]> = node
        .children
        .iter()
        .flatten()
        .map(|&id| ((tree.node(id).center - p).length_squared(), id))
        .collect();
    children.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));
    // Nearest child on top.
    stack.extend(children.iter().rev().map(|&(_, id)| id));
}
