//! Static-geometry collision octree
//!
//! Divides the level's static triangles into hierarchical, overlapping cells
//! so a moving sphere only tests the triangles near it. Nodes live in an
//! arena owned by [`CollisionOctree`]; children and parents are referred to
//! by [`NodeId`].
//!
//! The tree is built once: insert every triangle, call
//! [`CollisionOctree::optimize`], then query it as often as needed. Queries
//! take `&self`, so a frozen tree can be shared between threads.

use log::{debug, error, info, trace, warn};
use serde::{Deserialize, Serialize};

use crate::config::{Config, ConfigError};
use crate::foundation::math::Vec3;
use crate::spatial::bounds::{classify_sphere, classify_triangle, Containment, TreeTransform, AABB};
use crate::spatial::query::QueryVolume;
use crate::spatial::subdivision::{child_cells, SubdivisionLayout};
use crate::spatial::{MeshTriangle, OctreeError, TriangleId, TriangleSet};

/// Index of a node in a [`CollisionOctree`]
pub type NodeId = usize;

/// The root always sits in the first arena slot
pub const ROOT: NodeId = 0;

/// Configuration for octree behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctreeConfig {
    /// A leaf holding more triangles than this subdivides on the next insert
    pub subdivide_threshold: usize,

    /// Deepest level children may be created at; going past it is an error
    pub max_depth: u32,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            subdivide_threshold: 7,
            max_depth: 10,
        }
    }
}

impl Config for OctreeConfig {}

impl OctreeConfig {
    /// Reject settings that could never build a tree
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::Invalid("max_depth must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Load and validate from a `.toml` or `.ron` file
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let config = Self::load_from_file(path)?;
        config.validate()?;
        Ok(config)
    }
}

/// Triangle handle stored in a node, with the bounds it was classified by
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OctreeTriangle {
    /// Handle into the caller's [`TriangleSet`]
    pub id: TriangleId,
    /// Local-space bounds at insertion time
    pub bounds: AABB,
}

/// Single node in the octree hierarchy
#[derive(Debug, Clone)]
pub struct OctreeNode {
    bounds: AABB,
    depth: u32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    triangles: Vec<OctreeTriangle>,
    optimized: bool,
}

impl OctreeNode {
    fn new(bounds: AABB, depth: u32, parent: Option<NodeId>) -> Self {
        Self {
            bounds,
            depth,
            parent,
            children: Vec::new(),
            triangles: Vec::new(),
            optimized: false,
        }
    }

    /// Local-space bounds of this cell
    pub fn bounds(&self) -> &AABB {
        &self.bounds
    }

    /// Subdivision level (0 = root)
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Parent node, `None` for the root
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child nodes, empty for a leaf
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Triangles held directly by this node
    pub fn triangles(&self) -> &[OctreeTriangle] {
        &self.triangles
    }

    /// Check if this node is a leaf (has no children)
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Whether `optimize` has frozen this node
    pub fn is_optimized(&self) -> bool {
        self.optimized
    }

    /// Whether this node holds `id` directly
    pub fn holds(&self, id: TriangleId) -> bool {
        self.triangles.iter().any(|t| t.id == id)
    }

    /// Untransformed insertion test of triangle bounds against this cell
    pub fn classify_triangle(&self, triangle: &AABB) -> Containment {
        classify_triangle(&self.bounds, triangle)
    }

    /// Oriented query test of a volume against this cell moved by `transform`
    pub fn classify_entity(&self, transform: &TreeTransform, volume: &QueryVolume) -> Result<Containment, OctreeError> {
        Ok(classify_sphere(&self.bounds, transform, volume.sphere()?))
    }
}

/// Summary of a tree's shape
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OctreeStats {
    /// Nodes reachable from the root
    pub node_count: usize,
    /// Nodes without children
    pub leaf_count: usize,
    /// Nodes holding at least one triangle directly
    pub populated_count: usize,
    /// Deepest node level
    pub max_depth: u32,
    /// Registered triangles
    pub triangle_count: usize,
}

/// Octree over static triangle geometry
#[derive(Debug, Clone)]
pub struct CollisionOctree {
    pub(crate) nodes: Vec<OctreeNode>,
    config: OctreeConfig,
}

impl CollisionOctree {
    /// Create an empty octree covering `bounds`
    pub fn new(bounds: AABB, config: OctreeConfig) -> Self {
        Self {
            nodes: vec![OctreeNode::new(bounds, 0, None)],
            config,
        }
    }

    /// Build an octree around every triangle in `triangles`
    ///
    /// The root is padded so flat geometry still gets a cell with volume.
    /// The returned tree is not optimized yet.
    pub fn from_triangles(triangles: &TriangleSet, config: OctreeConfig) -> Result<Self, OctreeError> {
        let bounds = triangles
            .bounds()
            .unwrap_or_else(|| AABB::new(Vec3::zeros(), Vec3::zeros()));
        let largest = (bounds.max - bounds.min).max();
        let mut tree = Self::new(bounds.padded((largest * 0.01).max(1.0)), config);

        for (id, _) in triangles.iter() {
            tree.insert(id, triangles)?;
        }
        debug!(
            "Built collision octree over {} triangles: {} nodes",
            triangles.len(),
            tree.nodes.len()
        );
        Ok(tree)
    }

    /// Configuration this tree was built with
    pub fn config(&self) -> &OctreeConfig {
        &self.config
    }

    /// The root node
    pub fn root(&self) -> &OctreeNode {
        &self.nodes[ROOT]
    }

    /// Look up a node
    pub fn node(&self, id: NodeId) -> Option<&OctreeNode> {
        self.nodes.get(id)
    }

    /// Every node in arena order (root first)
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &OctreeNode)> {
        self.nodes.iter().enumerate()
    }

    /// Number of nodes in the arena
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether `optimize` has run
    pub fn is_optimized(&self) -> bool {
        self.nodes[ROOT].optimized
    }

    pub(crate) fn checked(&self, id: NodeId) -> Result<&OctreeNode, OctreeError> {
        self.nodes.get(id).ok_or(OctreeError::InvalidNode(id))
    }

    // ---------------------------------------------------------------------
    // Subdivision
    // ---------------------------------------------------------------------

    /// Split `node` into children, then split each child `levels` more times
    ///
    /// Does nothing if the node already has children.
    pub fn subdivide(&mut self, node: NodeId, levels: u32) -> Result<(), OctreeError> {
        let (bounds, depth) = {
            let current = self.checked(node)?;
            if !current.is_leaf() {
                return Ok(());
            }
            (current.bounds, current.depth)
        };

        let child_depth = depth + 1;
        if child_depth > self.config.max_depth {
            error!(
                "Cannot subdivide node {} at depth {}: limit is {}",
                node, depth, self.config.max_depth
            );
            return Err(OctreeError::MaxDepthExceeded {
                depth: child_depth,
                max_depth: self.config.max_depth,
            });
        }

        let layout = SubdivisionLayout::for_bounds(&bounds);
        let first = self.nodes.len();
        self.nodes.extend(
            child_cells(&bounds)
                .into_iter()
                .map(|cell| OctreeNode::new(cell, child_depth, Some(node))),
        );
        let children: Vec<NodeId> = (first..self.nodes.len()).collect();
        trace!("Subdivided node {} at depth {} into {} {:?} cells", node, depth, children.len(), layout);
        self.nodes[node].children.clone_from(&children);

        if levels > 0 {
            for child in children {
                self.subdivide(child, levels - 1)?;
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Insertion
    // ---------------------------------------------------------------------

    /// Register a triangle from `triangles`
    ///
    /// Fails if the tree is frozen, the handle is unknown, or the triangle is
    /// already registered anywhere in the tree.
    pub fn insert(&mut self, id: TriangleId, triangles: &TriangleSet) -> Result<(), OctreeError> {
        let triangle = triangles.get(id).ok_or(OctreeError::UnknownTriangle(id))?;
        if self.is_optimized() {
            warn!("Rejected insertion of {:?}: octree is frozen", id);
            return Err(OctreeError::Frozen);
        }
        if self.exists(id) {
            error!("Triangle {:?} inserted twice", id);
            return Err(OctreeError::DuplicateTriangle(id));
        }
        if triangle.is_degenerate() {
            debug!("Inserting degenerate triangle {:?}", id);
        }
        self.add_triangle(ROOT, entry_for(id, triangle))
    }

    /// Insert below `node`, following the first child that fully contains it
    ///
    /// A triangle no child fully contains stays at `node`. A leaf holding
    /// more than `subdivide_threshold` triangles subdivides first and
    /// re-inserts everything it held.
    pub fn add_triangle(&mut self, node: NodeId, triangle: OctreeTriangle) -> Result<(), OctreeError> {
        let current = self.checked(node)?;
        if current.optimized {
            return Err(OctreeError::Frozen);
        }
        if current.holds(triangle.id) {
            error!("Triangle {:?} is already held by node {}", triangle.id, node);
            return Err(OctreeError::DuplicateTriangle(triangle.id));
        }

        if !current.is_leaf() {
            let home = current
                .children
                .iter()
                .copied()
                .find(|&child| self.nodes[child].classify_triangle(&triangle.bounds) == Containment::Inside);
            return match home {
                Some(child) => self.add_triangle(child, triangle),
                None => {
                    self.nodes[node].triangles.push(triangle);
                    Ok(())
                }
            };
        }

        if current.triangles.len() > self.config.subdivide_threshold {
            self.subdivide(node, 0)?;
            let held = std::mem::take(&mut self.nodes[node].triangles);
            for entry in held.into_iter().chain(std::iter::once(triangle)) {
                self.add_triangle(node, entry)?;
            }
            return Ok(());
        }

        self.nodes[node].triangles.push(triangle);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Removal and lookup
    // ---------------------------------------------------------------------

    /// Unregister a triangle; it must have been inserted
    pub fn remove(&mut self, id: TriangleId) -> Result<(), OctreeError> {
        self.remove_triangle(ROOT, id).map(|_| ())
    }

    /// Remove `id` from `node` or the first descendant holding it
    ///
    /// Below the root a miss is `Ok(false)`; at the root it is an error.
    pub fn remove_triangle(&mut self, node: NodeId, id: TriangleId) -> Result<bool, OctreeError> {
        let depth = self.checked(node)?.depth;
        if self.remove_from_subtree(node, id) {
            return Ok(true);
        }
        if depth == 0 {
            error!("Removal of unregistered triangle {:?}", id);
            return Err(OctreeError::TriangleNotFound(id));
        }
        Ok(false)
    }

    fn remove_from_subtree(&mut self, node: NodeId, id: TriangleId) -> bool {
        let current = &mut self.nodes[node];
        if let Some(index) = current.triangles.iter().position(|t| t.id == id) {
            current.triangles.swap_remove(index);
            return true;
        }
        let children = current.children.clone();
        children.into_iter().any(|child| self.remove_from_subtree(child, id))
    }

    /// Remove and re-insert a triangle whose geometry changed in `triangles`
    pub fn reposition_triangle(&mut self, id: TriangleId, triangles: &TriangleSet) -> Result<(), OctreeError> {
        self.remove(id)?;
        self.insert(id, triangles)
    }

    /// Whether `id` is registered anywhere in the tree
    pub fn exists(&self, id: TriangleId) -> bool {
        self.exists_in(ROOT, id)
    }

    /// Whether `id` is held by `node` or any descendant
    pub fn exists_in(&self, node: NodeId, id: TriangleId) -> bool {
        self.nodes.get(node).is_some_and(|current| {
            current.holds(id) || current.children.iter().any(|&child| self.exists_in(child, id))
        })
    }

    /// Number of triangles registered in the whole tree
    pub fn triangle_count(&self) -> usize {
        self.registered_shape_count(ROOT)
    }

    /// Number of triangles held by `node` and all descendants
    pub fn registered_shape_count(&self, node: NodeId) -> usize {
        self.nodes.get(node).map_or(0, |current| {
            current.triangles.len()
                + current
                    .children
                    .iter()
                    .map(|&child| self.registered_shape_count(child))
                    .sum::<usize>()
        })
    }

    // ---------------------------------------------------------------------
    // Optimization
    // ---------------------------------------------------------------------

    /// Prune empty subtrees and freeze the tree
    ///
    /// Call once after all static geometry is inserted. Node ids handed out
    /// before this call are invalidated; calling it again changes nothing.
    pub fn optimize(&mut self) {
        let before = self.nodes.len();
        let triangles = self.optimize_node(ROOT);
        self.compact();
        info!(
            "Optimized collision octree: {} -> {} nodes, {} triangles",
            before,
            self.nodes.len(),
            triangles
        );
    }

    fn optimize_node(&mut self, node: NodeId) -> usize {
        let children = std::mem::take(&mut self.nodes[node].children);
        let mut kept = Vec::with_capacity(children.len());
        let mut count = self.nodes[node].triangles.len();

        for child in children {
            let child_count = self.optimize_node(child);
            if child_count == 0 {
                trace!("Pruned empty node {} below {}", child, node);
            } else {
                kept.push(child);
                count += child_count;
            }
        }

        let current = &mut self.nodes[node];
        current.children = kept;
        current.optimized = true;
        count
    }

    /// Drop unreachable nodes and renumber the rest depth-first
    fn compact(&mut self) {
        let mut remap: Vec<Option<NodeId>> = vec![None; self.nodes.len()];
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![ROOT];
        while let Some(id) = stack.pop() {
            remap[id] = Some(order.len());
            order.push(id);
            stack.extend(self.nodes[id].children.iter().rev());
        }

        let mut old: Vec<Option<OctreeNode>> = std::mem::take(&mut self.nodes).into_iter().map(Some).collect();
        self.nodes = order
            .into_iter()
            .filter_map(|id| old[id].take())
            .map(|mut node| {
                node.parent = node.parent.and_then(|parent| remap[parent]);
                node.children = node.children.iter().filter_map(|&child| remap[child]).collect();
                node
            })
            .collect();
    }

    /// Shape summary of the tree
    pub fn stats(&self) -> OctreeStats {
        self.nodes.iter().fold(OctreeStats::default(), |mut stats, node| {
            stats.node_count += 1;
            stats.leaf_count += usize::from(node.is_leaf());
            stats.populated_count += usize::from(!node.triangles.is_empty());
            stats.max_depth = stats.max_depth.max(node.depth);
            stats.triangle_count += node.triangles.len();
            stats
        })
    }
}

fn entry_for(id: TriangleId, triangle: &MeshTriangle) -> OctreeTriangle {
    OctreeTriangle { id, bounds: triangle.bounds() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_bounds() -> AABB {
        AABB::new(Vec3::new(-100.0, -100.0, -100.0), Vec3::new(100.0, 100.0, 100.0))
    }

    fn small_triangle(at: Vec3) -> MeshTriangle {
        MeshTriangle::new(at, at + Vec3::new(0.5, 0.0, 0.0), at + Vec3::new(0.0, 0.0, 0.5))
    }

    /// A grid of small triangles spread through the world
    fn populated(count: usize) -> (CollisionOctree, TriangleSet, Vec<TriangleId>) {
        let mut set = TriangleSet::new();
        let ids: Vec<_> = (0..count)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let f = i as f32;
                set.insert(small_triangle(Vec3::new(
                    (f * 13.0) % 180.0 - 90.0,
                    (f * 7.0) % 180.0 - 90.0,
                    (f * 29.0) % 180.0 - 90.0,
                )))
            })
            .collect();
        let mut octree = CollisionOctree::new(world_bounds(), OctreeConfig::default());
        for &id in &ids {
            octree.insert(id, &set).expect("insert");
        }
        (octree, set, ids)
    }

    #[test]
    fn test_octree_basic_insertion() {
        let (octree, _, ids) = populated(1);
        assert!(octree.exists(ids[0]));
        assert_eq!(octree.triangle_count(), 1);
        assert!(octree.root().is_leaf());
    }

    #[test]
    fn test_duplicate_insertion_is_rejected() {
        let (mut octree, set, ids) = populated(20);
        assert_eq!(octree.insert(ids[3], &set), Err(OctreeError::DuplicateTriangle(ids[3])));
        assert_eq!(octree.triangle_count(), 20);
    }

    #[test]
    fn test_duplicate_in_same_node_is_rejected() {
        let (mut octree, set, ids) = populated(1);
        let entry = entry_for(ids[0], set.get(ids[0]).expect("in set"));
        assert_eq!(octree.add_triangle(ROOT, entry), Err(OctreeError::DuplicateTriangle(ids[0])));
    }

    #[test]
    fn test_unknown_handle_is_rejected() {
        let (mut octree, mut set, _) = populated(1);
        let stray = set.insert(small_triangle(Vec3::zeros()));
        set.remove(stray);
        assert_eq!(octree.insert(stray, &set), Err(OctreeError::UnknownTriangle(stray)));
    }

    #[test]
    fn test_subdivision_is_lazy() {
        let (octree, _, _) = populated(8);
        assert!(octree.root().is_leaf());

        let (octree, _, _) = populated(9);
        assert_eq!(octree.root().children().len(), 27);
        assert_eq!(octree.triangle_count(), 9);
    }

    #[test]
    fn test_child_depth_and_parent_links() {
        let (octree, _, _) = populated(200);
        for (id, node) in octree.nodes() {
            for &child in node.children() {
                let child_node = octree.node(child).expect("child exists");
                assert_eq!(child_node.depth(), node.depth() + 1);
                assert_eq!(child_node.parent(), Some(id));
            }
        }
    }

    #[test]
    fn test_triangles_are_unique_across_nodes() {
        let (octree, _, ids) = populated(200);
        for id in ids {
            let holders = octree.nodes().filter(|(_, node)| node.holds(id)).count();
            assert_eq!(holders, 1);
        }
    }

    #[test]
    fn test_held_triangles_fit_their_node() {
        let (octree, _, _) = populated(200);
        for (_, node) in octree.nodes() {
            for triangle in node.triangles() {
                assert_eq!(node.classify_triangle(&triangle.bounds), Containment::Inside);
            }
        }
    }

    #[test]
    fn test_straddling_triangle_stays_at_parent() {
        let mut set = TriangleSet::new();
        let mut octree = CollisionOctree::new(world_bounds(), OctreeConfig::default());
        octree.subdivide(ROOT, 0).expect("subdivide");

        // Spans more than an octant on x: no child can hold it
        let wide = set.insert(MeshTriangle::new(
            Vec3::new(-60.0, 1.0, 1.0),
            Vec3::new(60.0, 1.0, 1.0),
            Vec3::new(0.0, 2.0, 1.0),
        ));
        octree.insert(wide, &set).expect("insert");
        assert!(octree.root().holds(wide));
    }

    #[test]
    fn test_remove_round_trip() {
        let (mut octree, _, ids) = populated(50);
        let before = octree.triangle_count();
        octree.remove(ids[17]).expect("registered");
        assert!(!octree.exists(ids[17]));
        assert_eq!(octree.triangle_count(), before - 1);
    }

    #[test]
    fn test_remove_unregistered_fails_at_root_only() {
        let (mut octree, mut set, _) = populated(50);
        let never = set.insert(small_triangle(Vec3::zeros()));
        assert_eq!(octree.remove(never), Err(OctreeError::TriangleNotFound(never)));

        let child = octree.root().children()[0];
        assert_eq!(octree.remove_triangle(child, never), Ok(false));
    }

    #[test]
    fn test_reposition_moves_triangle() {
        let (mut octree, mut set, ids) = populated(50);
        let id = ids[0];
        *set.get_mut(id).expect("in set") = small_triangle(Vec3::new(80.0, 80.0, 80.0));
        octree.reposition_triangle(id, &set).expect("reposition");
        assert!(octree.exists(id));
        assert_eq!(octree.triangle_count(), 50);
        let holder = octree.nodes().find(|(_, node)| node.holds(id)).map(|(_, node)| *node.bounds());
        assert!(holder.expect("held").contains_point(Vec3::new(80.0, 80.0, 80.0)));
    }

    #[test]
    fn test_insert_after_optimize_is_frozen() {
        let (mut octree, mut set, _) = populated(30);
        octree.optimize();
        let late = set.insert(small_triangle(Vec3::zeros()));
        assert_eq!(octree.insert(late, &set), Err(OctreeError::Frozen));
        assert!(octree.nodes().all(|(_, node)| node.is_optimized()));
    }

    #[test]
    fn test_optimize_prunes_empty_subtrees() {
        let mut set = TriangleSet::new();
        let mut octree = CollisionOctree::new(world_bounds(), OctreeConfig::default());
        octree.subdivide(ROOT, 1).expect("subdivide");
        assert_eq!(octree.node_count(), 1 + 27 + 27 * 27);

        let id = set.insert(small_triangle(Vec3::new(-70.0, -70.0, -70.0)));
        octree.insert(id, &set).expect("insert");
        octree.optimize();

        // Only the path down to the populated leaf survives
        assert_eq!(octree.node_count(), 3);
        assert!(octree.exists(id));
        assert_eq!(octree.stats().max_depth, 2);
    }

    #[test]
    fn test_optimize_is_idempotent() {
        let (mut octree, _, _) = populated(300);
        octree.optimize();
        let once = octree.stats();
        let shape: Vec<_> = octree.nodes().map(|(_, n)| (n.depth(), n.parent(), n.children().to_vec())).collect();
        octree.optimize();
        assert_eq!(octree.stats(), once);
        let again: Vec<_> = octree.nodes().map(|(_, n)| (n.depth(), n.parent(), n.children().to_vec())).collect();
        assert_eq!(shape, again);
    }

    #[test]
    fn test_depth_bound_is_enforced() {
        let mut set = TriangleSet::new();
        let config = OctreeConfig { subdivide_threshold: 7, max_depth: 3 };
        let mut octree = CollisionOctree::new(world_bounds(), config);

        // Identical tiny triangles can never be separated by subdivision
        let mut result = Ok(());
        for _ in 0..64 {
            let id = set.insert(small_triangle(Vec3::new(10.0, 10.0, 10.0)));
            result = octree.insert(id, &set);
            if result.is_err() {
                break;
            }
        }
        assert_eq!(result, Err(OctreeError::MaxDepthExceeded { depth: 4, max_depth: 3 }));
    }

    #[test]
    fn test_subdivide_past_max_depth_fails() {
        let config = OctreeConfig { subdivide_threshold: 7, max_depth: 1 };
        let mut octree = CollisionOctree::new(world_bounds(), config);
        assert!(matches!(
            octree.subdivide(ROOT, 1),
            Err(OctreeError::MaxDepthExceeded { depth: 2, max_depth: 1 })
        ));
    }

    #[test]
    fn test_from_triangles_pads_flat_geometry() {
        let mut set = TriangleSet::new();
        for i in 0..40 {
            #[allow(clippy::cast_precision_loss)]
            let x = i as f32 * 10.0;
            set.insert(MeshTriangle::new(
                Vec3::new(x, 0.0, 0.0),
                Vec3::new(x + 5.0, 0.0, 0.0),
                Vec3::new(x, 0.0, 5.0),
            ));
        }
        let octree = CollisionOctree::from_triangles(&set, OctreeConfig::default()).expect("build");
        assert!(octree.root().bounds().height() > 0.0);
        assert_eq!(octree.triangle_count(), 40);
        assert_eq!(
            SubdivisionLayout::for_bounds(octree.root().bounds()),
            SubdivisionLayout::Planar
        );
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let config = OctreeConfig { subdivide_threshold: 12, max_depth: 6 };
        let text = toml::to_string(&config).expect("serialize");
        let parsed: OctreeConfig = toml::from_str(&text).expect("parse");
        assert_eq!(parsed, config);

        let partial: OctreeConfig = toml::from_str("max_depth = 4").expect("parse");
        assert_eq!(partial.subdivide_threshold, 7);
    }

    #[test]
    fn test_classify_entity_follows_rotation() {
        let mut octree = CollisionOctree::new(world_bounds(), OctreeConfig::default());
        octree.subdivide(ROOT, 0).expect("subdivide");
        // (+,+,+) octant: [0, 100] on every axis
        let octant = octree.node(octree.root().children()[7]).expect("octant");

        // Half a turn about y swings the octant over to negative x and z
        let rotation = crate::foundation::math::Quat::from_axis_angle(&Vec3::y_axis(), std::f32::consts::PI);
        let turned = TreeTransform::new(rotation.to_homogeneous()).expect("invertible");
        let sphere = QueryVolume::Sphere(crate::collision::BoundingSphere::new(Vec3::new(-50.0, 50.0, -50.0), 5.0));

        assert_eq!(octant.classify_entity(&TreeTransform::identity(), &sphere), Ok(Containment::Outside));
        assert_eq!(octant.classify_entity(&turned, &sphere), Ok(Containment::Inside));

        let straddling = QueryVolume::Sphere(crate::collision::BoundingSphere::new(Vec3::new(-2.0, 50.0, -50.0), 5.0));
        assert_eq!(octant.classify_entity(&turned, &straddling), Ok(Containment::Intersect));

        let boxed = QueryVolume::Aabb(AABB::new(Vec3::zeros(), Vec3::repeat(1.0)));
        assert_eq!(octant.classify_entity(&turned, &boxed), Err(OctreeError::UnsupportedVolume("aabb")));
    }

    #[test]
    fn test_config_saves_and_loads_as_ron() {
        let path = std::env::temp_dir().join(format!("collision_octree_save_{}.ron", std::process::id()));
        let config = OctreeConfig { subdivide_threshold: 5, max_depth: 8 };
        config.save_to_file(&path).expect("save");
        let loaded = OctreeConfig::load(&path);
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.expect("load"), config);
    }

    #[test]
    fn test_config_load_validates() {
        let path = std::env::temp_dir().join(format!("collision_octree_{}.ron", std::process::id()));
        std::fs::write(&path, "(subdivide_threshold: 3, max_depth: 0)").expect("write");
        let result = OctreeConfig::load(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
