//! Octree contract violations

use thiserror::Error;

use super::{NodeId, TriangleId};

/// Misuse of a [`CollisionOctree`](super::CollisionOctree)
///
/// Every variant means the caller broke the build -> optimize -> query
/// contract. Once one is returned during a build the tree should be
/// discarded, since a partially applied insertion may have moved triangles.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OctreeError {
    /// Insertion after `optimize`
    #[error("octree is frozen; insertion is not allowed after optimize")]
    Frozen,

    /// The triangle is already registered
    #[error("triangle {0:?} was already inserted")]
    DuplicateTriangle(TriangleId),

    /// Removal of a triangle that was never inserted
    #[error("triangle {0:?} is not registered in the octree")]
    TriangleNotFound(TriangleId),

    /// The handle does not resolve in the triangle set
    #[error("triangle {0:?} does not exist in the triangle set")]
    UnknownTriangle(TriangleId),

    /// Subdivision would go past `max_depth`
    #[error("subdivision to depth {depth} exceeds the maximum depth of {max_depth}; geometry is too dense for this configuration")]
    MaxDepthExceeded {
        /// Depth the new children would have had
        depth: u32,
        /// Configured limit
        max_depth: u32,
    },

    /// Query volume kind has no containment and intersection rule
    #[error("query volume '{0}' is not supported; only spheres can be tested against static triangles")]
    UnsupportedVolume(&'static str),

    /// A node id that is not part of the tree
    #[error("node {0} does not exist")]
    InvalidNode(NodeId),

    /// The query transform has no inverse
    #[error("query transform is singular")]
    SingularTransform,
}
