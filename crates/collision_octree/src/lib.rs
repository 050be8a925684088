//! # Collision Octree
//!
//! Spatial index over static triangle geometry for sphere collision queries.
//!
//! ## Features
//!
//! - **Overlapping cells**: triangles crossing a split still find an octant-sized child
//! - **Planar layout**: flat regions split on x/z only
//! - **Oriented queries**: the whole tree can be moved by a transform at query time
//! - **Debug sinks**: tested triangles, hits and cell heatmaps on request
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use collision_octree::prelude::*;
//!
//! fn main() -> Result<(), OctreeError> {
//!     let mut triangles = TriangleSet::new();
//!     triangles.insert(MeshTriangle::new(
//!         Vec3::new(0.0, 0.0, 0.0),
//!         Vec3::new(1.0, 0.0, 0.0),
//!         Vec3::new(0.0, 0.0, 1.0),
//!     ));
//!
//!     let mut tree = CollisionOctree::from_triangles(&triangles, OctreeConfig::default())?;
//!     tree.optimize();
//!
//!     let sphere = BoundingSphere::new(Vec3::new(0.2, 0.1, 0.2), 0.25);
//!     let mut hits = Vec::new();
//!     tree.find_collisions(&sphere.into(), &triangles, None, &mut hits)?;
//!     assert_eq!(hits.len(), 1);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod collision;
pub mod config;
pub mod debug;
pub mod foundation;
pub mod spatial;

/// Common imports for octree users
pub mod prelude {
    pub use crate::{
        collision::{BoundingSphere, SphereContact, Triangle},
        config::{Config, ConfigError},
        debug::{render_octree, DebugDrawList, DebugView, OctreeDebugSink},
        foundation::math::{Mat4, Transform, Vec3},
        spatial::{
            CollisionOctree, CollisionRecord, MeshTriangle, OctreeConfig, OctreeError, OctreeStats,
            QueryVolume, TriangleId, TriangleSet, AABB,
        },
    };
}
