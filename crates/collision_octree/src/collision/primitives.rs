//! Primitive collision shapes and intersection algorithms

use crate::foundation::math::{transform_point, Mat4, Vec3};

/// Minimum edge-cross length for a triangle to have a usable face normal
const DEGENERATE_EPSILON: f32 = 1.0e-12;

/// A bounding sphere for collision detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// The center position of the sphere in world space
    pub center: Vec3,
    /// The radius of the sphere
    pub radius: f32,
}

impl BoundingSphere {
    /// Creates a new bounding sphere with the given center and radius
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Check if this sphere intersects with another
    pub fn intersects(&self, other: &BoundingSphere) -> bool {
        let distance_squared = (self.center - other.center).magnitude_squared();
        let radius_sum = self.radius + other.radius;
        distance_squared <= radius_sum * radius_sum
    }
}

/// Contact produced by a sphere touching a triangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereContact {
    /// Closest point on the triangle to the sphere center
    pub point: Vec3,
    /// Direction to push the sphere out of the triangle (unit length)
    pub normal: Vec3,
    /// Distance from the sphere center to `point`
    pub distance: f32,
    /// How far the sphere reaches past the triangle surface
    pub penetration: f32,
}

/// A triangle for collision detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// First vertex
    pub v0: Vec3,
    /// Second vertex
    pub v1: Vec3,
    /// Third vertex
    pub v2: Vec3,
}

impl Triangle {
    /// Creates a new triangle
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        Self { v0, v1, v2 }
    }

    /// Face normal (right-hand rule), zero for degenerate triangles
    pub fn normal(&self) -> Vec3 {
        (self.v1 - self.v0)
            .cross(&(self.v2 - self.v0))
            .try_normalize(DEGENERATE_EPSILON)
            .unwrap_or_else(Vec3::zeros)
    }

    /// Component-wise minimum and maximum of the three vertices
    pub fn min_max(&self) -> (Vec3, Vec3) {
        (
            self.v0.inf(&self.v1).inf(&self.v2),
            self.v0.sup(&self.v1).sup(&self.v2),
        )
    }

    /// Copy of this triangle with every vertex moved by `matrix`
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        Self {
            v0: transform_point(matrix, &self.v0),
            v1: transform_point(matrix, &self.v1),
            v2: transform_point(matrix, &self.v2),
        }
    }

    /// Closest point on the triangle to `point`
    ///
    /// Voronoi-region walk from Ericson, "Real-Time Collision Detection" 5.1.5.
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let ab = self.v1 - self.v0;
        let ac = self.v2 - self.v0;

        let ap = point - self.v0;
        let d1 = ab.dot(&ap);
        let d2 = ac.dot(&ap);
        if d1 <= 0.0 && d2 <= 0.0 {
            return self.v0;
        }

        let bp = point - self.v1;
        let d3 = ab.dot(&bp);
        let d4 = ac.dot(&bp);
        if d3 >= 0.0 && d4 <= d3 {
            return self.v1;
        }

        let vc = d1 * d4 - d3 * d2;
        if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
            return self.v0 + ab * (d1 / (d1 - d3));
        }

        let cp = point - self.v2;
        let d5 = ab.dot(&cp);
        let d6 = ac.dot(&cp);
        if d6 >= 0.0 && d5 <= d6 {
            return self.v2;
        }

        let vb = d5 * d2 - d1 * d6;
        if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
            return self.v0 + ac * (d2 / (d2 - d6));
        }

        let va = d3 * d6 - d5 * d4;
        if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
            let t = (d4 - d3) / ((d4 - d3) + (d5 - d6));
            return self.v1 + (self.v2 - self.v1) * t;
        }

        let denom = va + vb + vc;
        if denom.abs() <= f32::EPSILON {
            // Collinear vertices: fall back to the nearest one
            return [self.v0, self.v1, self.v2]
                .into_iter()
                .fold(self.v0, |best, v| {
                    if (v - point).magnitude_squared() < (best - point).magnitude_squared() { v } else { best }
                });
        }
        let inv = 1.0 / denom;
        self.v0 + ab * (vb * inv) + ac * (vc * inv)
    }

    /// Test this triangle against a sphere
    ///
    /// Touching counts as a hit. Returns `None` when the sphere is clear of
    /// the triangle.
    pub fn intersect_sphere(&self, sphere: &BoundingSphere) -> Option<SphereContact> {
        let closest = self.closest_point(sphere.center);
        let offset = sphere.center - closest;
        let distance_sq = offset.magnitude_squared();
        if distance_sq > sphere.radius * sphere.radius {
            return None;
        }

        let distance = distance_sq.sqrt();
        let normal = offset
            .try_normalize(DEGENERATE_EPSILON)
            .unwrap_or_else(|| self.normal());

        Some(SphereContact {
            point: closest,
            normal,
            distance,
            penetration: sphere.radius - distance,
        })
    }
}
