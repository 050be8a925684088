//! Narrow-phase collision primitives
//!
//! The octree only decides *which* triangles to test. The test itself lives
//! here as a pure function with no shared state:
//!
//! - [`BoundingSphere`] - The moving collider used as query volume
//! - [`Triangle`] - Three vertices, tested with [`Triangle::intersect_sphere`]
//! - [`SphereContact`] - Contact data produced by a hit

pub mod primitives;

pub use primitives::{BoundingSphere, SphereContact, Triangle};
