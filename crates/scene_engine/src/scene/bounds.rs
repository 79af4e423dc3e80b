//! Bounding volumes with ray intersection tests
//!
//! Coarse volumes used by the bounds phase of picking and by the collision
//! backends for broad rejection.

use crate::foundation::math::{Mat4, Point3, Vec3};
use crate::picking::Ray;

/// A bounding sphere
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// The center position of the sphere
    pub center: Point3,
    /// The radius of the sphere
    pub radius: f32,
}

impl BoundingSphere {
    /// Creates a new bounding sphere with the given center and radius
    pub fn new(center: Point3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Smallest sphere enclosing a set of points, or None if empty
    pub fn from_points(points: &[Point3]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut center = Vec3::zeros();
        for p in points {
            center += p.coords;
        }
        center /= points.len() as f32;
        let center = Point3::from(center);

        let mut radius_sq = 0.0f32;
        for p in points {
            radius_sq = radius_sq.max((p - center).magnitude_squared());
        }
        Some(Self::new(center, radius_sq.sqrt()))
    }

    /// Check if this sphere intersects with another
    pub fn intersects(&self, other: &BoundingSphere) -> bool {
        let distance_squared = (self.center - other.center).magnitude_squared();
        let radius_sum = self.radius + other.radius;
        distance_squared <= radius_sum * radius_sum
    }

    /// Get the penetration depth if intersecting (0.0 if not intersecting)
    pub fn penetration_depth(&self, other: &BoundingSphere) -> f32 {
        let distance = (self.center - other.center).magnitude();
        let radius_sum = self.radius + other.radius;
        if distance < radius_sum {
            radius_sum - distance
        } else {
            0.0
        }
    }

    /// Grow this sphere so it encloses another
    pub fn merge(&mut self, other: &BoundingSphere) {
        let offset = other.center - self.center;
        let distance = offset.magnitude();
        if distance + other.radius <= self.radius {
            return; // other already inside
        }
        if distance + self.radius <= other.radius {
            *self = *other;
            return;
        }
        let new_radius = (distance + self.radius + other.radius) * 0.5;
        let shift = (new_radius - self.radius) / distance;
        self.center += offset * shift;
        self.radius = new_radius;
    }

    /// Test ray intersection with this sphere
    ///
    /// Returns the entry distance along the ray and the entry point; a ray
    /// starting inside the sphere reports its exit instead.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<(f32, Point3)> {
        let oc = ray.origin - self.center;

        // Solve |origin + t*direction - center|^2 = radius^2
        let a = ray.direction.dot(&ray.direction);
        let b = 2.0 * oc.dot(&ray.direction);
        let c = oc.dot(&oc) - self.radius * self.radius;

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrt_discriminant = discriminant.sqrt();
        let t1 = (-b - sqrt_discriminant) / (2.0 * a);
        let t2 = (-b + sqrt_discriminant) / (2.0 * a);

        let t = if t1 > 0.0 {
            t1
        } else if t2 > 0.0 {
            t2
        } else {
            return None; // Sphere entirely behind the ray
        };

        Some((t, ray.point_at(t)))
    }

    /// Transform this sphere by a matrix
    ///
    /// The radius is scaled by the largest axis scale so the result stays
    /// conservative under non-uniform scaling.
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let center = matrix.transform_point(&self.center);
        let scale_x = matrix.fixed_view::<3, 1>(0, 0).magnitude();
        let scale_y = matrix.fixed_view::<3, 1>(0, 1).magnitude();
        let scale_z = matrix.fixed_view::<3, 1>(0, 2).magnitude();
        let scale = scale_x.max(scale_y).max(scale_z);
        Self::new(center, self.radius * scale)
    }
}

/// An axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: Point3,
    /// Maximum corner
    pub max: Point3,
}

impl Aabb {
    /// Creates a new AABB from min and max corners
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Smallest box enclosing a set of points, or None if empty
    pub fn from_points(points: &[Point3]) -> Option<Self> {
        let first = points.first()?;
        let mut min = *first;
        let mut max = *first;
        for p in &points[1..] {
            min = Point3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z));
            max = Point3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z));
        }
        Some(Self::new(min, max))
    }

    /// Center of the box
    pub fn center(&self) -> Point3 {
        Point3::from((self.min.coords + self.max.coords) * 0.5)
    }

    /// Grow the box uniformly by `margin` on every side
    pub fn expanded(&self, margin: f32) -> Self {
        let m = Vec3::new(margin, margin, margin);
        Self::new(self.min - m, self.max + m)
    }

    /// Slab test against a ray
    ///
    /// Returns the entry distance and point; a ray starting inside reports
    /// distance zero at its origin.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<(f32, Point3)> {
        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;

        for axis in 0..3 {
            let origin = ray.origin[axis];
            let direction = ray.direction[axis];
            if direction.abs() < f32::EPSILON {
                if origin < self.min[axis] || origin > self.max[axis] {
                    return None; // Parallel and outside the slab
                }
            } else {
                let inv = 1.0 / direction;
                let mut t0 = (self.min[axis] - origin) * inv;
                let mut t1 = (self.max[axis] - origin) * inv;
                if t0 > t1 {
                    std::mem::swap(&mut t0, &mut t1);
                }
                t_min = t_min.max(t0);
                t_max = t_max.min(t1);
                if t_min > t_max {
                    return None;
                }
            }
        }

        if t_max < 0.0 {
            return None; // Box entirely behind the ray
        }
        let t = t_min.max(0.0);
        Some((t, ray.point_at(t)))
    }

    /// Transform the box by a matrix and re-wrap the eight corners
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let corners = [
            Point3::new(self.min.x, self.min.y, self.min.z),
            Point3::new(self.max.x, self.min.y, self.min.z),
            Point3::new(self.min.x, self.max.y, self.min.z),
            Point3::new(self.max.x, self.max.y, self.min.z),
            Point3::new(self.min.x, self.min.y, self.max.z),
            Point3::new(self.max.x, self.min.y, self.max.z),
            Point3::new(self.min.x, self.max.y, self.max.z),
            Point3::new(self.max.x, self.max.y, self.max.z),
        ];
        let transformed: Vec<Point3> =
            corners.iter().map(|c| matrix.transform_point(c)).collect();
        Self::from_points(&transformed).unwrap_or(*self)
    }

    /// Sphere enclosing this box
    pub fn enclosing_sphere(&self) -> BoundingSphere {
        let center = self.center();
        BoundingSphere::new(center, (self.max - center).magnitude())
    }
}

/// A bounding volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bounds {
    /// Sphere bounds
    Sphere(BoundingSphere),
    /// Axis-aligned box bounds
    Aabb(Aabb),
}

impl Bounds {
    /// Test ray intersection, returning entry distance and point
    pub fn intersect_ray(&self, ray: &Ray) -> Option<(f32, Point3)> {
        match self {
            Self::Sphere(sphere) => sphere.intersect_ray(ray),
            Self::Aabb(aabb) => aabb.intersect_ray(ray),
        }
    }

    /// Center of the volume
    pub fn center(&self) -> Point3 {
        match self {
            Self::Sphere(sphere) => sphere.center,
            Self::Aabb(aabb) => aabb.center(),
        }
    }

    /// Sphere enclosing the volume
    pub fn enclosing_sphere(&self) -> BoundingSphere {
        match self {
            Self::Sphere(sphere) => *sphere,
            Self::Aabb(aabb) => aabb.enclosing_sphere(),
        }
    }

    /// Transform the volume by a matrix
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        match self {
            Self::Sphere(sphere) => Self::Sphere(sphere.transformed(matrix)),
            Self::Aabb(aabb) => Self::Aabb(aabb.transformed(matrix)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use approx::assert_relative_eq;

    #[test]
    fn test_ray_hits_sphere_head_on() {
        let sphere = BoundingSphere::new(Point3::new(0.0, 0.0, -10.0), 2.0);
        let ray = Ray::new(Point3::origin(), Vec3::new(0.0, 0.0, -1.0));
        let (t, point) = sphere.intersect_ray(&ray).unwrap();
        assert_relative_eq!(t, 8.0, epsilon = 1e-5);
        assert_relative_eq!(point.z, -8.0, epsilon = 1e-5);
    }

    #[test]
    fn test_ray_misses_sphere() {
        let sphere = BoundingSphere::new(Point3::new(0.0, 5.0, -10.0), 2.0);
        let ray = Ray::new(Point3::origin(), Vec3::new(0.0, 0.0, -1.0));
        assert!(sphere.intersect_ray(&ray).is_none());
    }

    #[test]
    fn test_sphere_behind_ray_is_rejected() {
        let sphere = BoundingSphere::new(Point3::new(0.0, 0.0, 10.0), 2.0);
        let ray = Ray::new(Point3::origin(), Vec3::new(0.0, 0.0, -1.0));
        assert!(sphere.intersect_ray(&ray).is_none());
    }

    #[test]
    fn test_ray_enters_aabb() {
        let aabb = Aabb::new(Point3::new(-1.0, -1.0, -3.0), Point3::new(1.0, 1.0, -2.0));
        let ray = Ray::new(Point3::origin(), Vec3::new(0.0, 0.0, -1.0));
        let (t, point) = aabb.intersect_ray(&ray).unwrap();
        assert_relative_eq!(t, 2.0, epsilon = 1e-5);
        assert_relative_eq!(point.z, -2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_ray_inside_aabb_reports_origin() {
        let aabb = Aabb::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
        let ray = Ray::new(Point3::origin(), Vec3::new(1.0, 0.0, 0.0));
        let (t, _) = aabb.intersect_ray(&ray).unwrap();
        assert_relative_eq!(t, 0.0);
    }

    #[test]
    fn test_sphere_merge_encloses_both() {
        let mut a = BoundingSphere::new(Point3::new(-2.0, 0.0, 0.0), 1.0);
        let b = BoundingSphere::new(Point3::new(3.0, 0.0, 0.0), 1.0);
        a.merge(&b);
        // Far extremes of both inputs lie inside the merged sphere.
        assert!((Point3::new(-3.0, 0.0, 0.0) - a.center).magnitude() <= a.radius + 1e-5);
        assert!((Point3::new(4.0, 0.0, 0.0) - a.center).magnitude() <= a.radius + 1e-5);
    }

    #[test]
    fn test_merge_with_contained_sphere_is_identity() {
        let mut a = BoundingSphere::new(Point3::origin(), 5.0);
        let b = BoundingSphere::new(Point3::new(1.0, 0.0, 0.0), 1.0);
        let before = a;
        a.merge(&b);
        assert_eq!(a, before);
    }
}
