//! Spatial partitioning for static collision geometry
//!
//! Provides the overlapping-cell octree used to find which static triangles
//! a moving sphere may touch, along with the bounds, containment tests and
//! triangle storage it is built on.

mod bounds;
mod error;
mod octree;
mod query;
mod subdivision;
mod triangles;

#[cfg(test)]
mod tests;

pub use bounds::{
    box_planes, classify_sphere, classify_triangle, world_bounding_sphere, Containment, Plane, TreeTransform, AABB,
};
pub use error::OctreeError;
pub use octree::{CollisionOctree, NodeId, OctreeConfig, OctreeNode, OctreeStats, OctreeTriangle, ROOT};
pub use query::{CollisionRecord, QueryVolume};
pub use subdivision::{child_cells, SubdivisionLayout};
pub use triangles::{MeshTriangle, TriangleId, TriangleSet};
