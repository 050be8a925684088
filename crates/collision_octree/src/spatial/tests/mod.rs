//! Cross-cutting tests for the collision octree
//!
//! Behavior that involves building, optimizing and querying together lives
//! here rather than next to any one module.
