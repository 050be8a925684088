//! Cell bounds, planes and the two containment tests
//!
//! Insertion and querying classify against cells in different ways and the
//! two must not be mixed up:
//!
//! - [`classify_triangle`] runs in the tree's local space, untransformed, and
//!   only answers INSIDE or OUTSIDE.
//! - [`classify_sphere`] runs at query time against planes moved by the
//!   tree's [`TreeTransform`], and can also answer INTERSECT.

use crate::collision::BoundingSphere;
use crate::foundation::math::{transform_point, Mat3, Mat4, Vec3};
use crate::spatial::OctreeError;

/// Axis-Aligned Bounding Box in the tree's local frame
///
/// `min`/`max` hold the six bounds: left/right on x, bottom/top on y and
/// near/far on z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl AABB {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a point with given extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Smallest AABB enclosing every point, `None` for an empty iterator
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self::new(first, first), |bounds, p| {
            Self::new(bounds.min.inf(&p), bounds.max.sup(&p))
        }))
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Full size along x
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    /// Full size along y
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Distance from the center to any corner
    pub fn bounding_radius(&self) -> f32 {
        self.extents().magnitude()
    }

    /// The eight corners; bit 0 of the index selects max x, bit 1 max y, bit 2 max z
    pub fn corners(&self) -> [Vec3; 8] {
        std::array::from_fn(|i| {
            Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            )
        })
    }

    /// Grow every side by `amount`
    pub fn padded(&self, amount: f32) -> Self {
        let pad = Vec3::repeat(amount);
        Self::new(self.min - pad, self.max + pad)
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if `other` lies entirely within this AABB (shared faces count)
    pub fn contains(&self, other: &AABB) -> bool {
        self.contains_point(other.min) && self.contains_point(other.max)
    }
}

/// Plane defined by normal and distance from origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Normal vector (normalized)
    pub normal: Vec3,
    /// Distance from origin along the normal
    pub distance: f32,
}

impl Plane {
    /// Plane through `point` facing along `normal`
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalize();
        Self { normal, distance: -normal.dot(&point) }
    }

    /// Calculate signed distance from plane to point
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) + self.distance
    }

    /// Move this plane by an affine transform
    ///
    /// Normals go through the inverse-transpose so that non-uniform scale
    /// keeps them perpendicular to the moved surface.
    pub fn transformed(&self, transform: &TreeTransform) -> Self {
        let on_plane = self.normal * -self.distance;
        Self::from_point_normal(
            transform_point(&transform.matrix, &on_plane),
            transform.normal_matrix * self.normal,
        )
    }
}

/// Result of a containment test between a cell and a volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Containment {
    /// Volume is entirely outside the cell
    Outside,
    /// Volume crosses at least one cell face
    Intersect,
    /// Volume is entirely inside the cell
    Inside,
}

/// Transform applied to the whole tree at query time
///
/// Caches the inverse-transpose used to move plane normals.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeTransform {
    /// Local-to-world matrix
    pub matrix: Mat4,
    normal_matrix: Mat3,
}

impl TreeTransform {
    /// Build from a local-to-world matrix; fails when it cannot be inverted
    pub fn new(matrix: Mat4) -> Result<Self, OctreeError> {
        let linear: Mat3 = matrix.fixed_view::<3, 3>(0, 0).into_owned();
        let normal_matrix = linear
            .try_inverse()
            .ok_or(OctreeError::SingularTransform)?
            .transpose();
        Ok(Self {
            matrix,
            normal_matrix,
        })
    }

    /// The identity transform
    pub fn identity() -> Self {
        Self {
            matrix: Mat4::identity(),
            normal_matrix: Mat3::identity(),
        }
    }
}

impl Default for TreeTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// The six inward-facing planes of a box, built from its corners
///
/// Order: left, right, bottom, top, near, far.
pub fn box_planes(bounds: &AABB) -> [Plane; 6] {
    let corners = bounds.corners();
    let (low, high) = (corners[0], corners[7]);
    [
        Plane::from_point_normal(low, Vec3::x()),
        Plane::from_point_normal(high, -Vec3::x()),
        Plane::from_point_normal(low, Vec3::y()),
        Plane::from_point_normal(high, -Vec3::y()),
        Plane::from_point_normal(low, Vec3::z()),
        Plane::from_point_normal(high, -Vec3::z()),
    ]
}

/// Untransformed insertion test: INSIDE when `triangle` fits in `cell`, else OUTSIDE
pub fn classify_triangle(cell: &AABB, triangle: &AABB) -> Containment {
    if cell.contains(triangle) {
        Containment::Inside
    } else {
        Containment::Outside
    }
}

/// World-space sphere enclosing `cell` once moved by `transform`
///
/// The radius reaches the farthest moved corner, so it bounds the moved box
/// under any affine transform, shear included.
pub fn world_bounding_sphere(cell: &AABB, transform: &TreeTransform) -> BoundingSphere {
    let center = transform_point(&transform.matrix, &cell.center());
    let radius = cell
        .corners()
        .iter()
        .map(|corner| (transform_point(&transform.matrix, corner) - center).magnitude())
        .fold(0.0, f32::max);
    BoundingSphere::new(center, radius)
}

/// Oriented query test of a sphere against a cell moved by `transform`
///
/// Signed distances to the six moved inward planes: any below `-r` is
/// OUTSIDE, otherwise any below `r` is INTERSECT, otherwise INSIDE.
pub fn classify_sphere(cell: &AABB, transform: &TreeTransform, sphere: &BoundingSphere) -> Containment {
    let mut result = Containment::Inside;
    for plane in box_planes(cell) {
        let distance = plane.transformed(transform).distance_to_point(sphere.center);
        if distance < -sphere.radius {
            return Containment::Outside;
        }
        if distance < sphere.radius {
            result = Containment::Intersect;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Quat, Transform};
    use approx::assert_relative_eq;

    fn unit_cell() -> AABB {
        AABB::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_corners_follow_bit_layout() {
        let corners = unit_cell().corners();
        assert_eq!(corners[0], Vec3::new(-1.0, -1.0, -1.0));
        assert_eq!(corners[5], Vec3::new(1.0, -1.0, 1.0));
        assert_eq!(corners[7], Vec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_bounding_radius_reaches_corner() {
        assert_relative_eq!(unit_cell().bounding_radius(), 3.0_f32.sqrt());
    }

    #[test]
    fn test_box_planes_face_inward() {
        for plane in box_planes(&unit_cell()) {
            assert_relative_eq!(plane.distance_to_point(Vec3::zeros()), 1.0);
        }
    }

    #[test]
    fn test_classify_triangle_inside_and_outside() {
        let cell = unit_cell();
        let inside = AABB::new(Vec3::new(-0.5, 0.0, 0.0), Vec3::new(0.5, 0.2, 1.0));
        let straddling = AABB::new(Vec3::new(0.5, 0.0, 0.0), Vec3::new(1.5, 0.2, 0.2));
        let far = AABB::new(Vec3::new(5.0, 5.0, 5.0), Vec3::new(6.0, 6.0, 6.0));
        assert_eq!(classify_triangle(&cell, &inside), Containment::Inside);
        assert_eq!(classify_triangle(&cell, &straddling), Containment::Outside);
        assert_eq!(classify_triangle(&cell, &far), Containment::Outside);
    }

    #[test]
    fn test_classify_sphere_axis_aligned() {
        let cell = unit_cell();
        let identity = TreeTransform::identity();
        let inside = BoundingSphere::new(Vec3::zeros(), 0.5);
        let crossing = BoundingSphere::new(Vec3::new(0.9, 0.0, 0.0), 0.5);
        let outside = BoundingSphere::new(Vec3::new(3.0, 0.0, 0.0), 0.5);
        assert_eq!(classify_sphere(&cell, &identity, &inside), Containment::Inside);
        assert_eq!(classify_sphere(&cell, &identity, &crossing), Containment::Intersect);
        assert_eq!(classify_sphere(&cell, &identity, &outside), Containment::Outside);
    }

    #[test]
    fn test_classify_sphere_follows_rotation() {
        // Long thin cell along x, rotated 90 degrees about z so it lies along y
        let cell = AABB::new(Vec3::new(-10.0, -1.0, -1.0), Vec3::new(10.0, 1.0, 1.0));
        let rotation = Quat::from_axis_angle(&Vec3::z_axis(), std::f32::consts::FRAC_PI_2);
        let transform = TreeTransform::new(
            Transform::from_position_rotation(Vec3::zeros(), rotation).to_matrix(),
        ).expect("rotation is invertible");

        // Would be inside the untransformed cell, is outside the rotated one
        let on_old_axis = BoundingSphere::new(Vec3::new(8.0, 0.0, 0.0), 0.5);
        assert_eq!(classify_sphere(&cell, &TreeTransform::identity(), &on_old_axis), Containment::Inside);
        assert_eq!(classify_sphere(&cell, &transform, &on_old_axis), Containment::Outside);

        let on_new_axis = BoundingSphere::new(Vec3::new(0.0, 8.0, 0.0), 0.5);
        assert_eq!(classify_sphere(&cell, &transform, &on_new_axis), Containment::Inside);

        // Straddles the rotated cell's +x side (old +y face) only
        let crossing = BoundingSphere::new(Vec3::new(1.2, 3.0, 0.0), 0.5);
        assert_eq!(classify_sphere(&cell, &transform, &crossing), Containment::Intersect);
    }

    #[test]
    fn test_classify_sphere_rotated_off_axis() {
        // 45 degrees about y: the cell's corners swing out along the diagonals
        let cell = unit_cell();
        let rotation = Quat::from_axis_angle(&Vec3::y_axis(), std::f32::consts::FRAC_PI_4);
        let transform = TreeTransform::new(rotation.to_homogeneous()).expect("invertible");

        // Inside the unrotated corner region, but past a rotated face
        let near_old_corner = BoundingSphere::new(Vec3::new(0.9, 0.0, 0.9), 0.05);
        assert_eq!(classify_sphere(&cell, &TreeTransform::identity(), &near_old_corner), Containment::Inside);
        assert_eq!(classify_sphere(&cell, &transform, &near_old_corner), Containment::Outside);

        // Along the rotated corner diagonal, now on the x axis at distance sqrt(2)
        let near_new_corner = BoundingSphere::new(Vec3::new(1.3, 0.0, 0.0), 0.05);
        assert_eq!(classify_sphere(&cell, &transform, &near_new_corner), Containment::Inside);
    }

    #[test]
    fn test_classify_sphere_near_corner_is_plane_rule_only() {
        // Clear of the corner but within reach of all three near planes
        let sphere = BoundingSphere::new(Vec3::new(2.0, 2.0, 2.0), 1.2);
        assert_eq!(classify_sphere(&unit_cell(), &TreeTransform::identity(), &sphere), Containment::Intersect);
    }

    #[test]
    fn test_world_bounding_sphere_covers_sheared_corners() {
        let shear = Mat4::new(
            1.0, 1.0, 1.0, 0.0,
            0.0, 0.5, 0.0, 0.0,
            0.0, 0.0, 0.5, 0.0,
            0.0, 0.0, 0.0, 1.0,
        );
        let transform = TreeTransform::new(shear).expect("invertible");
        let cell = unit_cell();
        let bound = world_bounding_sphere(&cell, &transform);
        for corner in cell.corners() {
            let moved = transform_point(&shear, &corner);
            assert!((moved - bound.center).magnitude() <= bound.radius + 1e-5);
        }
        // The far corner is stretched by more than any single column
        assert_relative_eq!(bound.radius, transform_point(&shear, &Vec3::repeat(1.0)).magnitude(), epsilon = 1e-5);
    }

    #[test]
    fn test_singular_transform_is_rejected() {
        let flatten = Mat4::new_nonuniform_scaling(&Vec3::new(1.0, 0.0, 1.0));
        assert!(matches!(TreeTransform::new(flatten), Err(OctreeError::SingularTransform)));
    }

    #[test]
    fn test_plane_transform_with_non_uniform_scale() {
        let plane = Plane::from_point_normal(Vec3::new(1.0, 0.0, 0.0), -Vec3::x());
        let transform = TreeTransform::new(Mat4::new_nonuniform_scaling(&Vec3::new(4.0, 1.0, 1.0)))
            .expect("invertible");
        let moved = plane.transformed(&transform);
        assert_relative_eq!(moved.distance_to_point(Vec3::new(4.0, 7.0, -3.0)), 0.0, epsilon = 1e-5);
        assert_relative_eq!(moved.distance_to_point(Vec3::zeros()), 4.0, epsilon = 1e-5);
    }
}
