//! Caller-owned static triangle storage
//!
//! The octree never owns geometry. It stores [`TriangleId`] handles, and
//! every operation that needs vertices borrows the [`TriangleSet`] they came
//! from. Handles stay valid until the triangle is removed from the set.

use slotmap::{new_key_type, SlotMap};

use crate::collision::Triangle;
use crate::foundation::math::{Mat4, Vec3};
use crate::spatial::AABB;

new_key_type! {
    /// Stable handle to a triangle in a [`TriangleSet`]
    pub struct TriangleId;
}

/// A triangle of static world geometry with its face normal precomputed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshTriangle {
    /// Vertex positions in the tree's local frame
    pub triangle: Triangle,
    /// Unit face normal, zero for degenerate triangles
    pub normal: Vec3,
}

impl MeshTriangle {
    /// Create from three vertices, computing the face normal
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        let triangle = Triangle::new(v0, v1, v2);
        Self { triangle, normal: triangle.normal() }
    }

    /// Local-space bounds of the three vertices
    pub fn bounds(&self) -> AABB {
        let (min, max) = self.triangle.min_max();
        AABB::new(min, max)
    }

    /// Copy moved by `matrix`, with the normal recomputed
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let triangle = self.triangle.transformed(matrix);
        Self { triangle, normal: triangle.normal() }
    }

    /// Whether the triangle has no area
    pub fn is_degenerate(&self) -> bool {
        self.normal == Vec3::zeros()
    }
}

impl From<Triangle> for MeshTriangle {
    fn from(triangle: Triangle) -> Self {
        Self { triangle, normal: triangle.normal() }
    }
}

/// Static geometry indexed by a collision octree
#[derive(Debug, Clone, Default)]
pub struct TriangleSet {
    triangles: SlotMap<TriangleId, MeshTriangle>,
}

impl TriangleSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a triangle, returning its handle
    pub fn insert(&mut self, triangle: MeshTriangle) -> TriangleId {
        self.triangles.insert(triangle)
    }

    /// Add one triangle per index triple, skipping a trailing partial triple
    ///
    /// Indices that point past `vertices` are skipped with a warning.
    pub fn extend_indexed(&mut self, vertices: &[Vec3], indices: &[u32]) -> Vec<TriangleId> {
        let mut ids = Vec::with_capacity(indices.len() / 3);
        for chunk in indices.chunks_exact(3) {
            let corner = |i: u32| vertices.get(i as usize).copied();
            match (corner(chunk[0]), corner(chunk[1]), corner(chunk[2])) {
                (Some(v0), Some(v1), Some(v2)) => ids.push(self.insert(MeshTriangle::new(v0, v1, v2))),
                _ => log::warn!(
                    "Skipping triangle {:?}: index out of range for {} vertices",
                    chunk,
                    vertices.len()
                ),
            }
        }
        ids
    }

    /// Remove a triangle; its handle becomes dangling
    pub fn remove(&mut self, id: TriangleId) -> Option<MeshTriangle> {
        self.triangles.remove(id)
    }

    /// Look up a triangle
    pub fn get(&self, id: TriangleId) -> Option<&MeshTriangle> {
        self.triangles.get(id)
    }

    /// Mutable access, for moving geometry before a reposition
    pub fn get_mut(&mut self, id: TriangleId) -> Option<&mut MeshTriangle> {
        self.triangles.get_mut(id)
    }

    /// Whether the handle resolves
    pub fn contains(&self, id: TriangleId) -> bool {
        self.triangles.contains_key(id)
    }

    /// Number of triangles
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Iterate over handles and triangles
    pub fn iter(&self) -> impl Iterator<Item = (TriangleId, &MeshTriangle)> {
        self.triangles.iter()
    }

    /// Bounds of every vertex in the set, `None` when empty
    pub fn bounds(&self) -> Option<AABB> {
        AABB::from_points(
            self.triangles
                .values()
                .flat_map(|t| [t.triangle.v0, t.triangle.v1, t.triangle.v2]),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extend_indexed_builds_triangles() {
        let vertices = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 1.0),
        ];
        let mut set = TriangleSet::new();
        let ids = set.extend_indexed(&vertices, &[0, 1, 2, 1, 3, 2, 0]);
        assert_eq!(ids.len(), 2);
        assert_eq!(set.len(), 2);
        assert!(!set.get(ids[0]).expect("inserted").is_degenerate());
    }

    #[test]
    fn test_extend_indexed_skips_out_of_range() {
        let vertices = [Vec3::zeros(), Vec3::x()];
        let mut set = TriangleSet::new();
        assert!(set.extend_indexed(&vertices, &[0, 1, 9]).is_empty());
        assert!(set.is_empty());
    }

    #[test]
    fn test_removed_handle_no_longer_resolves() {
        let mut set = TriangleSet::new();
        let id = set.insert(MeshTriangle::new(Vec3::zeros(), Vec3::x(), Vec3::y()));
        assert!(set.remove(id).is_some());
        assert!(!set.contains(id));
    }

    #[test]
    fn test_bounds_cover_all_vertices() {
        let mut set = TriangleSet::new();
        assert!(set.bounds().is_none());
        set.insert(MeshTriangle::new(Vec3::new(-2.0, 0.0, 0.0), Vec3::x(), Vec3::y()));
        set.insert(MeshTriangle::new(Vec3::new(0.0, 0.0, 5.0), Vec3::x(), Vec3::y()));
        let bounds = set.bounds().expect("non-empty");
        assert_eq!(bounds.min, Vec3::new(-2.0, 0.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 1.0, 5.0));
    }
}
