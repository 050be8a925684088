//! Debug visualization for collision octrees
//!
//! Nothing here is needed for correct queries. A sink is handed to a query
//! or to [`render_octree`] explicitly; there is no global debug state.

pub mod draw;
pub mod octree_debug;

pub use draw::{DebugDrawList, DebugShape, DebugView, OctreeDebugSink};
pub use octree_debug::{extent_heatmap, render_octree};
