//! Sphere collision queries against a [`CollisionOctree`]
//!
//! A query starts at an entry node, tests that node's triangles, then walks
//! in both directions: down into every child the sphere is not outside of,
//! and up through every ancestor. Ancestors only test their own triangles and
//! keep climbing; descendants only keep descending. The upward walk is what
//! finds triangles that straddled a split and were left at a coarser node.

use crate::collision::{BoundingSphere, SphereContact, Triangle};
use crate::debug::{DebugView, OctreeDebugSink};
use crate::foundation::math::{Mat4, Vec4};
use crate::spatial::bounds::{classify_sphere, world_bounding_sphere, Containment, TreeTransform, AABB};
use crate::spatial::octree::{CollisionOctree, NodeId, ROOT};
use crate::spatial::{OctreeError, TriangleId, TriangleSet};

/// Volume a collision query is run with
///
/// Only spheres have a containment rule and an intersection rule against
/// static triangles. A new kind needs both before it can be served; until
/// then queries with it are rejected rather than approximated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QueryVolume {
    /// Moving spherical collider in world space
    Sphere(BoundingSphere),
    /// Box-shaped collider; recognized but not supported
    Aabb(AABB),
}

impl QueryVolume {
    /// Short name used in errors and logs
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Sphere(_) => "sphere",
            Self::Aabb(_) => "aabb",
        }
    }

    /// The sphere, or `UnsupportedVolume` for any other kind
    pub fn sphere(&self) -> Result<&BoundingSphere, OctreeError> {
        match self {
            Self::Sphere(sphere) => Ok(sphere),
            Self::Aabb(_) => Err(OctreeError::UnsupportedVolume(self.kind())),
        }
    }
}

impl From<BoundingSphere> for QueryVolume {
    fn from(sphere: BoundingSphere) -> Self {
        Self::Sphere(sphere)
    }
}

/// A triangle touched by the query sphere
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionRecord {
    /// Handle of the triangle that was hit
    pub triangle: TriangleId,
    /// The triangle in world space, after the query transform
    pub world_triangle: Triangle,
    /// Contact data from the sphere test
    pub contact: SphereContact,
}

const TESTED_COLOR: Vec4 = Vec4::new(1.0, 1.0, 0.0, 0.35);
const HIT_COLOR: Vec4 = Vec4::new(1.0, 0.0, 0.0, 0.6);

/// State shared by every node visit of one query
struct Traversal<'a, 'd> {
    tree: &'a CollisionOctree,
    triangles: &'a TriangleSet,
    transform: TreeTransform,
    sphere: BoundingSphere,
    entry_level: u32,
    hits: &'a mut Vec<CollisionRecord>,
    debug: Option<&'d mut dyn OctreeDebugSink>,
}

impl Traversal<'_, '_> {
    fn visit(&mut self, node: NodeId) -> usize {
        let tree = self.tree;
        let current = &tree.nodes[node];
        let mut tests = self.test_triangles(node);

        // At or below the entry level: keep descending
        if current.depth() >= self.entry_level {
            for &child in current.children() {
                if self.reaches(tree.nodes[child].bounds()) {
                    tests += self.visit(child);
                }
            }
        }

        // At or above the entry level: keep climbing
        if current.depth() <= self.entry_level {
            if let Some(parent) = current.parent() {
                tests += self.visit(parent);
            }
        }
        tests
    }

    /// Whether the query sphere may touch anything inside `cell`
    fn reaches(&self, cell: &AABB) -> bool {
        // Bounding spheres first, then the planes
        world_bounding_sphere(cell, &self.transform).intersects(&self.sphere)
            && classify_sphere(cell, &self.transform, &self.sphere) != Containment::Outside
    }

    fn test_triangles(&mut self, node: NodeId) -> usize {
        let tree = self.tree;
        let held = tree.nodes[node].triangles();
        for entry in held {
            let Some(local) = self.triangles.get(entry.id) else {
                log::warn!("Octree references {:?} which is no longer in the triangle set", entry.id);
                continue;
            };
            let world = local.transformed(&self.transform.matrix);
            let contact = world.triangle.intersect_sphere(&self.sphere);

            if let Some(sink) = self.debug.as_deref_mut() {
                let view = sink.view();
                if contact.is_some() && view.contains(DebugView::HITS) {
                    sink.draw_triangle(&world.triangle, world.normal, HIT_COLOR);
                } else if view.contains(DebugView::TESTED_TRIANGLES) {
                    sink.draw_triangle(&world.triangle, world.normal, TESTED_COLOR);
                }
            }

            if let Some(contact) = contact {
                self.hits.push(CollisionRecord {
                    triangle: entry.id,
                    world_triangle: world.triangle,
                    contact,
                });
            }
        }
        held.len()
    }
}

impl CollisionOctree {
    /// Find every triangle the query volume touches, starting at the root
    ///
    /// `transform` maps the tree's local frame to the world frame the volume
    /// is given in; `None` means identity. Hits are appended to `hits`. The
    /// return value is the number of triangle tests performed.
    pub fn find_collisions(
        &self,
        volume: &QueryVolume,
        triangles: &TriangleSet,
        transform: Option<&Mat4>,
        hits: &mut Vec<CollisionRecord>,
    ) -> Result<usize, OctreeError> {
        self.find_collisions_from(ROOT, volume, triangles, transform, hits, None)
    }

    /// Find collisions starting at `entry`, optionally reporting to a debug sink
    ///
    /// Only a query entered at the root is guaranteed to see every triangle:
    /// from any other node, the entry's siblings and their subtrees are not
    /// visited.
    pub fn find_collisions_from(
        &self,
        entry: NodeId,
        volume: &QueryVolume,
        triangles: &TriangleSet,
        transform: Option<&Mat4>,
        hits: &mut Vec<CollisionRecord>,
        debug: Option<&mut dyn OctreeDebugSink>,
    ) -> Result<usize, OctreeError> {
        let sphere = *volume.sphere()?;
        let entry_level = self.checked(entry)?.depth();
        let transform = match transform {
            Some(matrix) => TreeTransform::new(*matrix)?,
            None => TreeTransform::identity(),
        };

        let mut traversal = Traversal {
            tree: self,
            triangles,
            transform,
            sphere,
            entry_level,
            hits,
            debug,
        };
        Ok(traversal.visit(entry))
    }
}
