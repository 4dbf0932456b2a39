//! Surfel octree with level-of-detail aggregates.
//!
//! Nodes live in a flat arena addressed by [`NodeId`]; each node owns its
//! children exclusively and the tree is read-only once built, so one
//! hierarchy can be shared by any number of shading workers.
//!
//! Every node carries an aggregate disk summarizing its subtree:
//! area-weighted position, normal and color, and a radius whose square is the
//! summed `radius²` of all surfels below it.

use glam::Vec3;

use crate::pointcloud::{PointArray, Surfel};
use crate::util::BBox3f;

/// A node becomes a leaf at or below this many surfels.
pub const MAX_LEAF_POINTS: usize = 8;

/// A node becomes a leaf at this depth regardless of population.
pub const MAX_DEPTH: usize = 24;

/// Index of a node in the octree arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One cubic cell of the hierarchy.
#[derive(Clone, Debug)]
pub struct Node {
    pub bound: BBox3f,
    pub center: Vec3,
    /// Radius of the sphere through the cell corners.
    pub bound_radius: f32,
    /// Area-weighted mean position.
    pub agg_p: Vec3,
    /// Area-weighted mean normal, unit length (zero if no surfel is oriented).
    pub agg_n: Vec3,
    /// `sqrt` of the summed area weights.
    pub agg_r: f32,
    /// Area-weighted mean color.
    pub agg_col: Vec3,
    /// Children by octant, `4*(z>cz) + 2*(y>cy) + (x>cx)`.
    pub children: [Option<NodeId>; 8],
    first_point: u32,
    npoints: u32,
}

impl Node {
    fn new(bound: BBox3f) -> Self {
        Self {
            bound,
            center: bound.center(),
            bound_radius: bound.bounding_radius(),
            agg_p: Vec3::ZERO,
            agg_n: Vec3::ZERO,
            agg_r: 0.0,
            agg_col: Vec3::ZERO,
            children: [None; 8],
            first_point: 0,
            npoints: 0,
        }
    }

    /// Leaves store surfels directly; interior nodes store none.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.npoints > 0
    }

    /// Number of surfels stored in this node (zero for interior nodes).
    #[inline]
    pub fn npoints(&self) -> usize {
        self.npoints as usize
    }
}

/// Summary counts for a built hierarchy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OctreeStats {
    pub nodes: usize,
    pub leaves: usize,
    pub max_depth: usize,
    pub points: usize,
}

/// Read-only surfel hierarchy.
#[derive(Clone, Debug)]
pub struct PointOctree {
    nodes: Vec<Node>,
    /// Leaf surfels, copied in leaf order with normals normalized.
    data: Vec<f32>,
    stride: usize,
    root: NodeId,
}

/// Running area-weighted sums for one node.
#[derive(Default)]
struct Aggregate {
    sum_a: f32,
    sum_p: Vec3,
    sum_n: Vec3,
    sum_col: Vec3,
}

impl Aggregate {
    #[inline]
    fn add(&mut self, p: Vec3, n: Vec3, r: f32, col: Vec3) {
        let a = r * r;
        self.sum_a += a;
        self.sum_p += p * a;
        self.sum_n += n * a;
        self.sum_col += col * a;
    }

    fn store(&self, node: &mut Node) {
        if self.sum_a > 0.0 {
            let inv = 1.0 / self.sum_a;
            node.agg_p = self.sum_p * inv;
            node.agg_col = self.sum_col * inv;
        } else {
            node.agg_p = node.center;
            node.agg_col = Vec3::ZERO;
        }
        node.agg_n = self.sum_n.normalize_or_zero();
        node.agg_r = self.sum_a.sqrt();
    }
}

struct Builder<'a> {
    points: &'a PointArray,
    nodes: Vec<Node>,
    data: Vec<f32>,
}

impl Builder<'_> {
    fn make_tree(&mut self, depth: usize, indices: &[u32], bound: BBox3f) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(bound));
        let mut agg = Aggregate::default();

        if indices.len() <= MAX_LEAF_POINTS || depth >= MAX_DEPTH {
            let stride = self.points.stride();
            let first = self.data.len() / stride;
            for &i in indices {
                let s = self.points.surfel(i as usize);
                let n = s.normal().normalize_or_zero();
                let start = self.data.len();
                self.data.extend_from_slice(s.raw());
                self.data[start + 3..start + 6].copy_from_slice(&n.to_array());
                agg.add(s.position(), n, s.radius(), s.color());
            }
            let node = &mut self.nodes[id.index()];
            node.first_point = first as u32;
            node.npoints = indices.len() as u32;
            agg.store(node);
            return id;
        }

        let center = bound.center();
        let mut buckets: [Vec<u32>; 8] = Default::default();
        for &i in indices {
            let p = self.points.surfel(i as usize).position();
            buckets[BBox3f::octant_of(p, center)].push(i);
        }

        for (octant, bucket) in buckets.iter().enumerate() {
            if bucket.is_empty() {
                continue;
            }
            let child = self.make_tree(depth + 1, bucket, bound.octant(octant));
            let c = &self.nodes[child.index()];
            agg.add(c.agg_p, c.agg_n, c.agg_r, c.agg_col);
            self.nodes[id.index()].children[octant] = Some(child);
        }
        agg.store(&mut self.nodes[id.index()]);
        id
    }
}

impl PointOctree {
    /// Build the hierarchy over all surfels in `points`.
    ///
    /// The root cell is the bounding box of the surfel disks forced cubic, so
    /// octants split evenly and sibling aggregates stay compact.
    #[tracing::instrument(skip_all, fields(points = points.len()))]
    pub fn build(points: &PointArray) -> Self {
        let mut bound = BBox3f::EMPTY;
        for s in points.iter() {
            bound.expand_by_sphere(s.position(), s.radius());
        }
        let bound = bound.to_cube();

        let mut builder = Builder {
            points,
            nodes: Vec::new(),
            data: Vec::with_capacity(points.as_slice().len()),
        };
        let indices: Vec<u32> = (0..points.len() as u32).collect();
        let root = builder.make_tree(0, &indices, bound);

        tracing::debug!(nodes = builder.nodes.len(), "point octree built");
        Self {
            nodes: builder.nodes,
            data: builder.data,
            stride: points.stride(),
            root,
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// All nodes; the root is at index 0.
    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Floats per stored surfel.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Total surfel count.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len() / self.stride
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Surfel `i` of a leaf node.
    #[inline]
    pub fn leaf_surfel(&self, node: &Node, i: usize) -> Surfel<'_> {
        debug_assert!(i < node.npoints());
        let start = (node.first_point as usize + i) * self.stride;
        Surfel::new(&self.data[start..start + self.stride])
    }

    /// All surfels stored in a leaf (empty for interior nodes).
    pub fn leaf_surfels<'a>(&'a self, node: &Node) -> impl ExactSizeIterator<Item = Surfel<'a>> + 'a {
        let start = node.first_point as usize * self.stride;
        let end = start + node.npoints() * self.stride;
        self.data[start..end].chunks_exact(self.stride).map(Surfel::new)
    }

    /// Node, leaf and depth counts.
    pub fn stats(&self) -> OctreeStats {
        let mut stats = OctreeStats {
            nodes: self.nodes.len(),
            points: self.len(),
            ..Default::default()
        };
        let mut stack = vec![(self.root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let node = self.node(id);
            stats.max_depth = stats.max_depth.max(depth);
            if node.is_leaf() {
                stats.leaves += 1;
            }
            stack.extend(node.children.iter().flatten().map(|&c| (c, depth + 1)));
        }
        stats
    }
}
