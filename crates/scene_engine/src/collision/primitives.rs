//! Geometric primitives shared by picking and collision narrow phase

use crate::foundation::math::{Point3, Vec3};
use crate::picking::Ray;

/// A triangle in some coordinate frame
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    /// First vertex
    pub v0: Point3,
    /// Second vertex
    pub v1: Point3,
    /// Third vertex
    pub v2: Point3,
}

impl Triangle {
    const EPSILON: f32 = 1e-6;

    /// Creates a new triangle
    pub fn new(v0: Point3, v1: Point3, v2: Point3) -> Self {
        Self { v0, v1, v2 }
    }

    /// Creates a triangle from a vertex triple
    pub fn from_vertices(vertices: [Point3; 3]) -> Self {
        Self::new(vertices[0], vertices[1], vertices[2])
    }

    /// Unit normal by the right-hand rule
    pub fn normal(&self) -> Vec3 {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;
        edge1.cross(&edge2).normalize()
    }

    /// Center point of the triangle
    pub fn centroid(&self) -> Point3 {
        Point3::from((self.v0.coords + self.v1.coords + self.v2.coords) / 3.0)
    }

    /// Möller-Trumbore ray/triangle intersection
    ///
    /// Returns the ray parameter of the hit, or None. The test is
    /// double-sided; hits behind the ray origin are rejected. The
    /// parameter keeps whatever scale the ray direction carries, so an
    /// unnormalized local-space ray still yields source-space distances.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;

        let h = ray.direction.cross(&edge2);
        let det = edge1.dot(&h);
        if det.abs() < Self::EPSILON {
            return None; // Ray parallel to the triangle plane
        }

        let inv_det = 1.0 / det;
        let s = ray.origin - self.v0;
        let u = inv_det * s.dot(&h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(&edge1);
        let v = inv_det * ray.direction.dot(&q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = inv_det * edge2.dot(&q);
        (t >= 0.0).then_some(t)
    }

    /// Closest point on the triangle to `point`
    pub fn closest_point(&self, point: Point3) -> Point3 {
        let ab = self.v1 - self.v0;
        let ac = self.v2 - self.v0;

        // Vertex regions first.
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

        let cp = point - self.v2;
        let d5 = ab.dot(&cp);
        let d6 = ac.dot(&cp);
        if d6 >= 0.0 && d5 <= d6 {
            return self.v2;
        }

        // Edge regions.
        let vc = d1 * d4 - d3 * d2;
        if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
            return self.v0 + ab * (d1 / (d1 - d3));
        }

        let vb = d5 * d2 - d1 * d6;
        if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
            return self.v0 + ac * (d2 / (d2 - d6));
        }

        let va = d3 * d6 - d5 * d4;
        if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
            let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
            return self.v1 + (self.v2 - self.v1) * w;
        }

        // Interior.
        let denom = 1.0 / (va + vb + vc);
        self.v0 + ab * (vb * denom) + ac * (vc * denom)
    }

    /// Signed distance from `point` to the triangle's plane
    pub fn plane_distance(&self, point: Point3) -> f32 {
        self.normal().dot(&(point - self.v0))
    }

    /// Triangle/triangle overlap via the separating axis theorem
    ///
    /// Tests both face normals and the nine edge-edge cross products.
    pub fn intersects_triangle(&self, other: &Triangle) -> bool {
        fn project(tri: &Triangle, axis: Vec3) -> (f32, f32) {
            let p0 = axis.dot(&tri.v0.coords);
            let p1 = axis.dot(&tri.v1.coords);
            let p2 = axis.dot(&tri.v2.coords);
            (p0.min(p1).min(p2), p0.max(p1).max(p2))
        }

        fn separated(a: &Triangle, b: &Triangle, axis: Vec3) -> bool {
            let len_sq = axis.magnitude_squared();
            if len_sq < Triangle::EPSILON {
                return false; // Degenerate axis carries no information
            }
            let axis = axis / len_sq.sqrt();
            let (min_a, max_a) = project(a, axis);
            let (min_b, max_b) = project(b, axis);
            max_a < min_b || max_b < min_a
        }

        let edges_a = [self.v1 - self.v0, self.v2 - self.v1, self.v0 - self.v2];
        let edges_b = [
            other.v1 - other.v0,
            other.v2 - other.v1,
            other.v0 - other.v2,
        ];

        if separated(self, other, edges_a[0].cross(&edges_a[1]))
            || separated(self, other, edges_b[0].cross(&edges_b[1]))
        {
            return false;
        }

        for edge_a in &edges_a {
            for edge_b in &edges_b {
                if separated(self, other, edge_a.cross(edge_b)) {
                    return false;
                }
            }
        }

        true // No separating axis
    }
}
