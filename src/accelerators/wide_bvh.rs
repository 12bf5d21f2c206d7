//! A K-ary bounding volume hierarchy (K = 4 or 8) with lane-packed child
//! boxes and leaf triangle/line batches. Interior nodes are widened from a
//! binary SAH build by repeatedly splitting the largest pending partition;
//! traversal pops the nearest child first and prunes against the best hit
//! found so far.

// std
use std::sync::Arc;
// others
use typed_arena::Arena;
// spica
use crate::core::base::Float;
use crate::core::geometry::{
    bnd3_union_bnd3f, bnd3_union_pnt3f, Bounds3f, Point3f, Ray, XYZEnum,
};
use crate::core::interaction::{BssrdfIntersections, SurfaceInteraction};
use crate::core::primitive::Primitive;
use crate::core::simd::{BoundsPack, LinePack, RayPack, TrianglePack};
use crate::core::stats;
use crate::shapes::Shape;

const N_BUCKETS: usize = 12;
pub const MAX_PRIMS_IN_LEAF: usize = 8;
pub const MAX_NODE_DEPTH: usize = 32;

#[derive(Debug, Default, Copy, Clone)]
struct PrimitiveInfo {
    primitive_number: u32,
    bounds: Bounds3f,
    centroid: Point3f,
}

impl PrimitiveInfo {
    fn new(primitive_number: u32, bounds: Bounds3f) -> Self {
        PrimitiveInfo {
            primitive_number,
            bounds,
            centroid: bounds.centroid(),
        }
    }
}

#[derive(Debug, Default, Copy, Clone)]
struct BucketInfo {
    count: usize,
    bounds: Bounds3f,
}

/// Node of the in-progress tree, arena-allocated and thrown away after
/// flattening.
struct BuildNode<'a> {
    bounds: Bounds3f,
    children: Vec<&'a BuildNode<'a>>,
    first_prim_offset: usize,
    n_primitives: usize,
}

impl<'a> BuildNode<'a> {
    fn leaf(first: usize, n: usize, bounds: Bounds3f) -> Self {
        BuildNode {
            bounds,
            children: Vec::new(),
            first_prim_offset: first,
            n_primitives: n,
        }
    }
    fn interior(children: Vec<&'a BuildNode<'a>>) -> Self {
        let mut bounds = Bounds3f::default();
        for c in &children {
            bounds = bnd3_union_bnd3f(&bounds, &c.bounds);
        }
        BuildNode {
            bounds,
            children,
            first_prim_offset: 0,
            n_primitives: 0,
        }
    }
}

/// Flattened node. A node is a leaf iff `child_count == 0`; leaves hold a
/// `[offset, count)` slice of the ordered primitive-index array plus
/// pre-packed triangle and line batches.
#[derive(Debug)]
pub struct WideBvhNode<const K: usize> {
    /// The K child boxes in structure-of-arrays layout; empty slots hold
    /// inverted boxes that fail every slab test.
    pub bounds: BoundsPack<K>,
    pub children: [u32; K],
    pub child_count: u8,
    pub prim_offset: u32,
    pub prim_count: u32,
    pub batch_offset: u32,
    pub batch_count: u32,
    pub line_offset: u32,
    pub line_count: u32,
    pub misc_offset: u32,
    pub misc_count: u32,
}

impl<const K: usize> Default for WideBvhNode<K> {
    fn default() -> Self {
        WideBvhNode {
            bounds: BoundsPack::default(),
            children: [u32::max_value(); K],
            child_count: 0,
            prim_offset: 0,
            prim_count: 0,
            batch_offset: 0,
            batch_count: 0,
            line_offset: 0,
            line_count: 0,
            misc_offset: 0,
            misc_count: 0,
        }
    }
}

#[derive(Debug)]
pub struct WideBvh<const K: usize> {
    pub primitives: Vec<Arc<Primitive>>,
    pub nodes: Vec<WideBvhNode<K>>,
    /// Primitive indices in leaf order.
    pub ordered: Vec<u32>,
    tri_batches: Vec<TrianglePack<K>>,
    line_batches: Vec<LinePack<K>>,
    misc: Vec<u32>,
    root_bound: Bounds3f,
    pub max_depth: usize,
}

impl<const K: usize> WideBvh<K> {
    pub fn new(primitives: Vec<Arc<Primitive>>) -> Self {
        let mut bvh = WideBvh {
            primitives,
            nodes: Vec::new(),
            ordered: Vec::new(),
            tri_batches: Vec::new(),
            line_batches: Vec::new(),
            misc: Vec::new(),
            root_bound: Bounds3f::default(),
            max_depth: 1,
        };
        if bvh.primitives.is_empty() {
            return bvh;
        }
        let mut primitive_info: Vec<PrimitiveInfo> = bvh
            .primitives
            .iter()
            .enumerate()
            .map(|(i, p)| PrimitiveInfo::new(i as u32, p.world_bound()))
            .collect();
        let arena: Arena<BuildNode> = Arena::with_capacity(1024);
        let n = primitive_info.len();
        let mut ordered: Vec<u32> = Vec::with_capacity(n);
        let root = bvh.recursive_build(&arena, &mut primitive_info, 0, n, 0, &mut ordered);
        bvh.root_bound = root.bounds;
        bvh.ordered = ordered;
        let mut nodes: Vec<WideBvhNode<K>> = Vec::new();
        bvh.flatten(root, &mut nodes);
        bvh.nodes = nodes;
        log::info!(
            "built {}-wide BVH: {} nodes, {} primitives, depth {}",
            K,
            bvh.nodes.len(),
            bvh.primitives.len(),
            bvh.max_depth
        );
        bvh
    }
    pub fn world_bound(&self) -> Bounds3f {
        self.root_bound
    }
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.child_count == 0).count()
    }
    /// Binned SAH split of `info[start..end)`. Returns the partition
    /// point, or None when keeping the range as a leaf is cheaper.
    fn sah_split(
        &self,
        info: &mut [PrimitiveInfo],
        start: usize,
        end: usize,
    ) -> Option<usize> {
        let n_primitives = end - start;
        if n_primitives < 2 {
            return None;
        }
        let mut bounds = Bounds3f::default();
        let mut centroid_bounds = Bounds3f::default();
        for item in info.iter().take(end).skip(start) {
            bounds = bnd3_union_bnd3f(&bounds, &item.bounds);
            centroid_bounds = bnd3_union_pnt3f(&centroid_bounds, &item.centroid);
        }
        let dim: u8 = centroid_bounds.maximum_extent();
        let dim_i = XYZEnum::from(dim);
        if centroid_bounds.p_max[dim_i] == centroid_bounds.p_min[dim_i] {
            // all centroids coincide; split equally if a leaf would be
            // oversized, otherwise give up
            if n_primitives > MAX_PRIMS_IN_LEAF {
                return Some((start + end) / 2);
            }
            return None;
        }
        if n_primitives <= 2 {
            if info[end - 1].centroid[dim_i] < info[start].centroid[dim_i] {
                info.swap(start, end - 1);
            }
            return Some((start + end) / 2);
        }
        // fill SAH buckets
        let mut buckets: [BucketInfo; N_BUCKETS] = [BucketInfo::default(); N_BUCKETS];
        let bucket_of = |centroid: &Point3f| -> usize {
            let mut b =
                (N_BUCKETS as Float * centroid_bounds.offset(centroid)[dim_i]) as usize;
            if b == N_BUCKETS {
                b = N_BUCKETS - 1;
            }
            b
        };
        for item in info.iter().take(end).skip(start) {
            let b = bucket_of(&item.centroid);
            buckets[b].count += 1;
            buckets[b].bounds = bnd3_union_bnd3f(&buckets[b].bounds, &item.bounds);
        }
        // cost of splitting after each bucket
        let mut cost: [Float; N_BUCKETS - 1] = [0.0; N_BUCKETS - 1];
        for (i, cost_item) in cost.iter_mut().enumerate() {
            let mut b0 = Bounds3f::default();
            let mut b1 = Bounds3f::default();
            let mut count0: usize = 0;
            let mut count1: usize = 0;
            for item in buckets.iter().take(i + 1) {
                b0 = bnd3_union_bnd3f(&b0, &item.bounds);
                count0 += item.count;
            }
            for item in buckets.iter().take(N_BUCKETS).skip(i + 1) {
                b1 = bnd3_union_bnd3f(&b1, &item.bounds);
                count1 += item.count;
            }
            *cost_item = 0.125
                + (count0 as Float * b0.surface_area() + count1 as Float * b1.surface_area())
                    / bounds.surface_area();
        }
        let mut min_cost: Float = cost[0];
        let mut min_cost_split_bucket: usize = 0;
        for (i, item) in cost.iter().enumerate() {
            if *item < min_cost {
                min_cost = *item;
                min_cost_split_bucket = i;
            }
        }
        let leaf_cost: Float = n_primitives as Float;
        if n_primitives <= MAX_PRIMS_IN_LEAF && min_cost >= leaf_cost {
            return None;
        }
        // partition around the chosen bucket
        let (mut left, mut right): (Vec<PrimitiveInfo>, Vec<PrimitiveInfo>) = info[start..end]
            .iter()
            .partition(|pi| bucket_of(&pi.centroid) <= min_cost_split_bucket);
        let mid = start + left.len();
        if mid == start || mid == end {
            // numerically degenerate partition; fall back to a median cut
            return Some((start + end) / 2);
        }
        for (i, pi) in left.drain(..).enumerate() {
            info[start + i] = pi;
        }
        for (i, pi) in right.drain(..).enumerate() {
            info[mid + i] = pi;
        }
        Some(mid)
    }
    fn recursive_build<'a>(
        &mut self,
        arena: &'a Arena<BuildNode<'a>>,
        info: &mut Vec<PrimitiveInfo>,
        start: usize,
        end: usize,
        depth: usize,
        ordered: &mut Vec<u32>,
    ) -> &'a BuildNode<'a> {
        assert_ne!(start, end);
        self.max_depth = self.max_depth.max(depth + 1);
        let n_primitives = end - start;
        let mut bounds = Bounds3f::default();
        for item in info.iter().take(end).skip(start) {
            bounds = bnd3_union_bnd3f(&bounds, &item.bounds);
        }
        let make_leaf = |info: &[PrimitiveInfo], ordered: &mut Vec<u32>| -> BuildNode<'a> {
            let first = ordered.len();
            for item in info.iter().take(end).skip(start) {
                ordered.push(item.primitive_number);
            }
            BuildNode::leaf(first, n_primitives, bounds)
        };
        // small enough, or the tree is as deep as the traversal stack
        // allows
        if n_primitives <= MAX_PRIMS_IN_LEAF || depth + 1 >= MAX_NODE_DEPTH {
            return arena.alloc(make_leaf(info, ordered));
        }
        // widen: keep splitting the largest pending partition until K
        // partitions exist or no further split pays off
        let mut partitions: Vec<(usize, usize, bool)> = vec![(start, end, true)];
        while partitions.len() < K {
            let mut best: Option<usize> = None;
            let mut best_size: usize = 0;
            for (i, &(s, e, splittable)) in partitions.iter().enumerate() {
                if splittable && e - s > best_size {
                    best_size = e - s;
                    best = Some(i);
                }
            }
            let idx = match best {
                Some(i) => i,
                None => break,
            };
            let (s, e, _) = partitions[idx];
            match self.sah_split(info, s, e) {
                Some(mid) => {
                    partitions[idx] = (s, mid, true);
                    partitions.insert(idx + 1, (mid, e, true));
                }
                None => {
                    partitions[idx] = (s, e, false);
                }
            }
        }
        if partitions.len() == 1 {
            // the SAH declined every split
            return arena.alloc(make_leaf(info, ordered));
        }
        let mut children: Vec<&'a BuildNode<'a>> = Vec::with_capacity(partitions.len());
        for &(s, e, _) in &partitions {
            children.push(self.recursive_build(arena, info, s, e, depth + 1, ordered));
        }
        arena.alloc(BuildNode::interior(children))
    }
    /// Pack a finished leaf's triangles and lines into SIMD batches; other
    /// shapes go to the scalar fallback list.
    fn pack_leaf(&mut self, first: usize, count: usize, node: &mut WideBvhNode<K>) {
        node.prim_offset = first as u32;
        node.prim_count = count as u32;
        node.batch_offset = self.tri_batches.len() as u32;
        node.line_offset = self.line_batches.len() as u32;
        node.misc_offset = self.misc.len() as u32;
        let mut tri_pack: TrianglePack<K> = TrianglePack::default();
        let mut tri_lane: usize = 0;
        let mut line_pack: LinePack<K> = LinePack::default();
        let mut line_lane: usize = 0;
        for i in first..first + count {
            let prim_index = self.ordered[i];
            let prim = self.primitives[prim_index as usize].clone();
            match &prim.shape {
                Shape::Triangle(tri) => {
                    let (p0, p1, p2) = tri.vertices();
                    tri_pack.set_lane(tri_lane, &p0, &p1, &p2, prim_index);
                    tri_lane += 1;
                    if tri_lane == K {
                        self.tri_batches.push(tri_pack);
                        tri_pack = TrianglePack::default();
                        tri_lane = 0;
                    }
                }
                Shape::Line(line) => {
                    line_pack.set_lane(
                        line_lane,
                        &line.p0,
                        &line.p1,
                        line.width0,
                        line.width1,
                        prim_index,
                    );
                    line_lane += 1;
                    if line_lane == K {
                        self.line_batches.push(line_pack);
                        line_pack = LinePack::default();
                        line_lane = 0;
                    }
                }
                _ => self.misc.push(prim_index),
            }
        }
        // pad and flush the tails
        if tri_lane > 0 {
            self.tri_batches.push(tri_pack);
        }
        if line_lane > 0 {
            self.line_batches.push(line_pack);
        }
        node.batch_count = self.tri_batches.len() as u32 - node.batch_offset;
        node.line_count = self.line_batches.len() as u32 - node.line_offset;
        node.misc_count = self.misc.len() as u32 - node.misc_offset;
    }
    fn flatten(&mut self, node: &BuildNode, nodes: &mut Vec<WideBvhNode<K>>) -> u32 {
        let my_index = nodes.len() as u32;
        nodes.push(WideBvhNode::default());
        if node.children.is_empty() {
            let mut flat = WideBvhNode::default();
            self.pack_leaf(node.first_prim_offset, node.n_primitives, &mut flat);
            nodes[my_index as usize] = flat;
        } else {
            let mut flat = WideBvhNode::default();
            flat.child_count = node.children.len() as u8;
            for (i, child) in node.children.iter().enumerate() {
                flat.bounds.set_lane(i, &child.bounds);
            }
            nodes[my_index as usize] = flat;
            for (i, child) in node.children.iter().enumerate() {
                let child_index = self.flatten(child, nodes);
                nodes[my_index as usize].children[i] = child_index;
            }
        }
        my_index
    }
    fn intersect_leaf(
        &self,
        node: &WideBvhNode<K>,
        ray: &Ray,
        isect: &mut SurfaceInteraction,
    ) -> bool {
        let mut hit = false;
        for b in node.batch_offset..node.batch_offset + node.batch_count {
            if let Some(ph) = self.tri_batches[b as usize].intersect(ray) {
                let prim_index = self.tri_batches[b as usize].prim[ph.lane];
                let prim = &self.primitives[prim_index as usize];
                if let Shape::Triangle(tri) = &prim.shape {
                    tri.fill_interaction(ray, ph.t, ph.b1, ph.b2, isect);
                    isect.primitive = Some(prim.index);
                    ray.t_max.set(ph.t);
                    hit = true;
                }
            }
        }
        for b in node.line_offset..node.line_offset + node.line_count {
            if let Some((t, s, lane)) = self.line_batches[b as usize].intersect(ray) {
                let prim_index = self.line_batches[b as usize].prim[lane];
                let prim = &self.primitives[prim_index as usize];
                if let Shape::Line(line) = &prim.shape {
                    line.fill_interaction(ray, t, s, isect);
                    isect.primitive = Some(prim.index);
                    ray.t_max.set(t);
                    hit = true;
                }
            }
        }
        for m in node.misc_offset..node.misc_offset + node.misc_count {
            let prim = &self.primitives[self.misc[m as usize] as usize];
            if prim.intersect(ray, isect) {
                hit = true;
            }
        }
        hit
    }
    /// Nearest-hit query. Children are pushed farthest-first so the
    /// nearest is popped first, and entries are pruned once a closer hit
    /// is known.
    pub fn intersect(&self, ray: &Ray, isect: &mut SurfaceInteraction) -> bool {
        if self.nodes.is_empty() {
            return false;
        }
        stats::record_ray();
        let t_root: Float = self.root_bound.intersect_span(ray);
        if t_root < 0.0 as Float {
            return false;
        }
        let rp: RayPack<K> = RayPack::from_ray(ray);
        let mut hit = false;
        let mut stack: Vec<(u32, Float)> = Vec::with_capacity(MAX_NODE_DEPTH * K);
        stack.push((0_u32, t_root));
        let mut t_near: [Float; K] = [0.0; K];
        while let Some((node_index, t_entry)) = stack.pop() {
            // a closer hit has been recorded since this entry was pushed
            if ray.t_max.get() < t_entry {
                continue;
            }
            let node = &self.nodes[node_index as usize];
            if node.child_count == 0 {
                if self.intersect_leaf(node, ray, isect) {
                    hit = true;
                }
                continue;
            }
            let mask: u32 = node.bounds.intersect(&rp, ray.t_max.get(), &mut t_near);
            match mask.count_ones() {
                0 => {}
                1 => {
                    // single-hit fast path
                    let lane = mask.trailing_zeros() as usize;
                    stack.push((node.children[lane], t_near[lane]));
                }
                2 => {
                    // two-hit fast path: push the farther child first
                    let lane0 = mask.trailing_zeros() as usize;
                    let lane1 =
                        (31 - (mask & !(1 << lane0)).leading_zeros()) as usize;
                    if t_near[lane0] < t_near[lane1] {
                        stack.push((node.children[lane1], t_near[lane1]));
                        stack.push((node.children[lane0], t_near[lane0]));
                    } else {
                        stack.push((node.children[lane0], t_near[lane0]));
                        stack.push((node.children[lane1], t_near[lane1]));
                    }
                }
                _ => {
                    // generic path: repeatedly push the farthest
                    // remaining lane
                    let mut m = mask;
                    while m != 0 {
                        let mut far_lane = usize::max_value();
                        let mut far_t = -1.0 as Float;
                        let mut probe = m;
                        while probe != 0 {
                            let lane = probe.trailing_zeros() as usize;
                            if t_near[lane] > far_t {
                                far_t = t_near[lane];
                                far_lane = lane;
                            }
                            probe &= probe - 1;
                        }
                        stack.push((node.children[far_lane], far_t));
                        m &= !(1 << far_lane);
                    }
                }
            }
        }
        if hit {
            isect.t = ray.t_max.get();
        }
        hit
    }
    /// Occlusion query; returns on the first intersection found, in no
    /// particular order.
    pub fn intersect_p(&self, ray: &Ray) -> bool {
        if self.nodes.is_empty() {
            return false;
        }
        stats::record_shadow_ray();
        if self.root_bound.intersect_span(ray) < 0.0 as Float {
            return false;
        }
        let rp: RayPack<K> = RayPack::from_ray(ray);
        let mut stack: Vec<u32> = Vec::with_capacity(MAX_NODE_DEPTH * K);
        stack.push(0_u32);
        let mut t_near: [Float; K] = [0.0; K];
        while let Some(node_index) = stack.pop() {
            let node = &self.nodes[node_index as usize];
            if node.child_count == 0 {
                for b in node.batch_offset..node.batch_offset + node.batch_count {
                    if self.tri_batches[b as usize].intersect_p(ray) {
                        return true;
                    }
                }
                for b in node.line_offset..node.line_offset + node.line_count {
                    if self.line_batches[b as usize].intersect(ray).is_some() {
                        return true;
                    }
                }
                for m in node.misc_offset..node.misc_offset + node.misc_count {
                    if self.primitives[self.misc[m as usize] as usize].intersect_p(ray) {
                        return true;
                    }
                }
                continue;
            }
            let mask: u32 = node.bounds.intersect(&rp, ray.t_max.get(), &mut t_near);
            let mut m = mask;
            while m != 0 {
                let lane = m.trailing_zeros() as usize;
                stack.push(node.children[lane]);
                m &= m - 1;
            }
        }
        false
    }
    /// Multi-hit query for subsurface probes: gathers hits on primitives
    /// carrying `material_id`, keeping the closest few (see
    /// `BssrdfIntersections`).
    pub fn intersect_sss(&self, ray: &Ray, material_id: usize) -> BssrdfIntersections {
        let mut bag = BssrdfIntersections::new();
        if self.nodes.is_empty() {
            return bag;
        }
        if self.root_bound.intersect_span(ray) < 0.0 as Float {
            return bag;
        }
        let rp: RayPack<K> = RayPack::from_ray(ray);
        let mut stack: Vec<(u32, Float)> = Vec::with_capacity(MAX_NODE_DEPTH * K);
        stack.push((0_u32, 0.0 as Float));
        let mut t_near: [Float; K] = [0.0; K];
        while let Some((node_index, t_entry)) = stack.pop() {
            // once the bag is full, nodes beyond the worst kept hit can
            // not contribute
            if bag.is_full() && t_entry > bag.maxt {
                continue;
            }
            let node = &self.nodes[node_index as usize];
            if node.child_count == 0 {
                for i in node.prim_offset..node.prim_offset + node.prim_count {
                    let prim = &self.primitives[self.ordered[i as usize] as usize];
                    if prim.material_id() != material_id {
                        continue;
                    }
                    let probe = Ray::new_with_span(ray.o, ray.d, ray.t_min, ray.t_max.get());
                    let mut t_hit: Float = 0.0;
                    let mut isect = SurfaceInteraction::no_hit();
                    if prim.shape.intersect(&probe, &mut t_hit, &mut isect) {
                        isect.t = t_hit;
                        isect.primitive = Some(prim.index);
                        bag.add(isect);
                    }
                }
                continue;
            }
            let limit: Float = if bag.is_full() {
                bag.maxt
            } else {
                ray.t_max.get()
            };
            let mask: u32 = node.bounds.intersect(&rp, limit, &mut t_near);
            let mut m = mask;
            while m != 0 {
                let lane = m.trailing_zeros() as usize;
                stack.push((node.children[lane], t_near[lane]));
                m &= m - 1;
            }
        }
        bag
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Vector3f;
    use crate::core::material::matte;
    use crate::core::rng::Rng;
    use crate::core::spectrum::Spectrum;
    use crate::shapes::sphere::Sphere;
    use crate::shapes::triangle::{Triangle, TriangleMesh};

    fn random_triangle_soup(count: usize, seed: u64) -> Vec<Arc<Primitive>> {
        let mut rng = Rng::new(seed);
        let material = Arc::new(matte(Spectrum::new(0.5)));
        let mut positions: Vec<Point3f> = Vec::new();
        let mut indices: Vec<u32> = Vec::new();
        for i in 0..count {
            let base = Point3f {
                x: rng.uniform_float() * 20.0 - 10.0,
                y: rng.uniform_float() * 20.0 - 10.0,
                z: rng.uniform_float() * 20.0 - 10.0,
            };
            for _ in 0..3 {
                positions.push(Point3f {
                    x: base.x + rng.uniform_float() - 0.5,
                    y: base.y + rng.uniform_float() - 0.5,
                    z: base.z + rng.uniform_float() - 0.5,
                });
            }
            indices.extend_from_slice(&[3 * i as u32, 3 * i as u32 + 1, 3 * i as u32 + 2]);
        }
        let mesh = Arc::new(TriangleMesh::new(indices, positions, vec![], vec![]));
        (0..count)
            .map(|i| {
                Arc::new(Primitive::new(
                    Shape::Triangle(Triangle::new(mesh.clone(), i as u32)),
                    Some(material.clone()),
                    i as u32,
                ))
            })
            .collect()
    }

    fn random_ray(rng: &mut Rng) -> Ray {
        let o = Point3f {
            x: rng.uniform_float() * 30.0 - 15.0,
            y: rng.uniform_float() * 30.0 - 15.0,
            z: rng.uniform_float() * 30.0 - 15.0,
        };
        let d = crate::core::sampling::uniform_sample_sphere(crate::core::geometry::Point2f {
            x: rng.uniform_float(),
            y: rng.uniform_float(),
        });
        Ray::new(o, d)
    }

    fn check_against_brute_force<const K: usize>(n_tris: usize, n_rays: usize) {
        let prims = random_triangle_soup(n_tris, 77);
        let bvh: WideBvh<K> = WideBvh::new(prims.clone());
        let mut rng = Rng::new(123);
        let mut hits = 0;
        for _ in 0..n_rays {
            let ray = random_ray(&mut rng);
            let bvh_ray = ray.clone();
            let mut bvh_isect = SurfaceInteraction::no_hit();
            let bvh_hit = bvh.intersect(&bvh_ray, &mut bvh_isect);
            let brute_ray = ray.clone();
            let mut brute_isect = SurfaceInteraction::no_hit();
            let mut brute_hit = false;
            for prim in &prims {
                if prim.intersect(&brute_ray, &mut brute_isect) {
                    brute_hit = true;
                }
            }
            assert_eq!(bvh_hit, brute_hit);
            if bvh_hit {
                hits += 1;
                assert!(
                    (bvh_ray.t_max.get() - brute_ray.t_max.get()).abs() < 1e-5,
                    "t mismatch {} vs {}",
                    bvh_ray.t_max.get(),
                    brute_ray.t_max.get()
                );
            }
            // any-hit agrees with nearest-hit existence
            assert_eq!(bvh.intersect_p(&ray.clone()), brute_hit);
        }
        assert!(hits > 0, "test scene produced no hits at all");
    }

    #[test]
    fn qbvh_matches_brute_force() {
        check_against_brute_force::<4>(500, 500);
    }

    #[test]
    fn obvh_matches_brute_force() {
        check_against_brute_force::<8>(500, 500);
    }

    #[test]
    fn multi_hit_collects_along_ray() {
        // a stack of parallel triangles pierced by one ray
        let material = Arc::new(matte(Spectrum::new(0.5)));
        let mut positions: Vec<Point3f> = Vec::new();
        let mut indices: Vec<u32> = Vec::new();
        for i in 0..6 {
            let z = 1.0 + i as Float;
            positions.push(Point3f {
                x: -2.0,
                y: -2.0,
                z,
            });
            positions.push(Point3f { x: 2.0, y: -2.0, z });
            positions.push(Point3f { x: 0.0, y: 2.0, z });
            indices.extend_from_slice(&[3 * i, 3 * i + 1, 3 * i + 2]);
        }
        let mesh = Arc::new(TriangleMesh::new(indices, positions, vec![], vec![]));
        let prims: Vec<Arc<Primitive>> = (0..6)
            .map(|i| {
                Arc::new(Primitive::new(
                    Shape::Triangle(Triangle::new(mesh.clone(), i as u32)),
                    Some(material.clone()),
                    i as u32,
                ))
            })
            .collect();
        let material_id = prims[0].material_id();
        let bvh: WideBvh<4> = WideBvh::new(prims);
        let ray = Ray::new(
            Point3f::default(),
            Vector3f {
                x: 0.0,
                y: 0.0,
                z: 1.0,
            },
        );
        let bag = bvh.intersect_sss(&ray, material_id);
        // six planes crossed, capacity keeps the nearest four
        assert_eq!(bag.len(), crate::core::interaction::MAX_SSS_INTERSECTIONS);
        assert!((bag.maxt - 4.0).abs() < 1e-4);
        // a different material id collects nothing
        let empty = bvh.intersect_sss(&ray, material_id.wrapping_add(1));
        assert!(empty.is_empty());
    }

    #[test]
    fn sphere_goes_to_fallback_list() {
        let material = Arc::new(matte(Spectrum::new(0.5)));
        let prims: Vec<Arc<Primitive>> = vec![Arc::new(Primitive::new(
            Shape::Sphere(Sphere::new(Point3f::default(), 1.0)),
            Some(material),
            0,
        ))];
        let bvh: WideBvh<4> = WideBvh::new(prims);
        let ray = Ray::new(
            Point3f {
                x: 0.0,
                y: 0.0,
                z: -4.0,
            },
            Vector3f {
                x: 0.0,
                y: 0.0,
                z: 1.0,
            },
        );
        let mut isect = SurfaceInteraction::no_hit();
        assert!(bvh.intersect(&ray, &mut isect));
        assert!((isect.t - 3.0).abs() < 1e-4);
    }
}
