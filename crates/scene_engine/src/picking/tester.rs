//! Geometry-phase intersection testing
//!
//! Exact primitive-level tests for bounds-phase survivors. All geometry
//! kinds funnel into one ray/triangle test: strips are decoded into
//! triangles, points are expanded into billboard quads and line segments
//! into oriented boxes, so screen-sized primitives reuse the same
//! intersection routine instead of growing 2D projected-space math.

use crate::collision::Triangle;
use crate::foundation::math::{Point3, Vec3};
use crate::picking::ray::{PickRay, Ray};
use crate::scene::{Geometry, Projection};

/// Exact intersection data for one geometry
#[derive(Debug, Clone, Copy)]
pub struct GeometryHit {
    /// Index of the closest intersected face (triangle, point or segment,
    /// depending on the geometry kind)
    pub face_index: usize,
    /// Closest intersection distance along the pick ray
    pub min_distance: f32,
    /// Farthest intersection distance along the pick ray
    pub max_distance: f32,
}

/// Pluggable geometry-phase strategy
///
/// Chosen once at service construction; swapping testers mid-session is
/// not supported.
pub trait GeometryPickTester {
    /// Test a candidate's geometry against the pick ray
    ///
    /// `local_ray` is the pick ray carried into the candidate's local
    /// frame with its direction deliberately unnormalized, so parameters
    /// reported by the triangle test are world-space distances.
    ///
    /// `best_distance` is the monotonically tightening accept bound: only
    /// hits strictly closer are accepted, and accepted hits lower it. The
    /// caller resets it per candidate for pick-all queries and shares it
    /// across candidates for pick-nearest queries.
    fn test(
        &self,
        pick_ray: &PickRay,
        local_ray: &Ray,
        geometry: &Geometry,
        best_distance: &mut f32,
    ) -> Option<GeometryHit>;
}

/// Default tester covering every [`Geometry`] kind
#[derive(Debug, Default)]
pub struct DefaultGeometryPickTester;

impl GeometryPickTester for DefaultGeometryPickTester {
    fn test(
        &self,
        pick_ray: &PickRay,
        local_ray: &Ray,
        geometry: &Geometry,
        best_distance: &mut f32,
    ) -> Option<GeometryHit> {
        match geometry {
            Geometry::Triangles(g) => test_triangles(
                local_ray,
                g.triangle_count(),
                |i| g.triangle(i),
                best_distance,
            ),
            Geometry::TriangleStrip(g) => test_triangles(
                local_ray,
                g.triangle_count(),
                |i| g.triangle(i),
                best_distance,
            ),
            Geometry::IndexedTriangleStrip(g) => test_triangles(
                local_ray,
                g.triangle_count(),
                |i| g.triangle(i),
                best_distance,
            ),
            Geometry::Points(g) => {
                let mut tracker = HitTracker::new(best_distance);
                for (index, point) in g.vertices().iter().enumerate() {
                    let size = projected_size(pick_ray, g.point_size(), *point, local_ray);
                    for triangle in point_billboard(*point, size * 0.5) {
                        tracker.offer(index, triangle.intersect_ray(local_ray));
                    }
                }
                tracker.finish()
            }
            Geometry::Lines(g) => {
                let mut tracker = HitTracker::new(best_distance);
                for index in 0..g.segment_count() {
                    let [start, end] = g.segment(index);
                    let midpoint = Point3::from((start.coords + end.coords) * 0.5);
                    let size = projected_size(pick_ray, g.line_width(), midpoint, local_ray);
                    for triangle in segment_box(start, end, size * 0.5) {
                        tracker.offer(index, triangle.intersect_ray(local_ray));
                    }
                }
                tracker.finish()
            }
        }
    }
}

/// Closest/farthest bookkeeping against the shared accept bound
struct HitTracker<'a> {
    best_distance: &'a mut f32,
    accepted: Option<(usize, f32)>,
    max_distance: f32,
}

impl<'a> HitTracker<'a> {
    fn new(best_distance: &'a mut f32) -> Self {
        Self {
            best_distance,
            accepted: None,
            max_distance: 0.0,
        }
    }

    fn offer(&mut self, face_index: usize, t: Option<f32>) {
        let Some(t) = t else {
            return;
        };
        self.max_distance = self.max_distance.max(t);
        if t < *self.best_distance {
            *self.best_distance = t;
            self.accepted = Some((face_index, t));
        }
    }

    fn finish(self) -> Option<GeometryHit> {
        self.accepted.map(|(face_index, min_distance)| GeometryHit {
            face_index,
            min_distance,
            max_distance: self.max_distance.max(min_distance),
        })
    }
}

fn test_triangles(
    local_ray: &Ray,
    count: usize,
    triangle_at: impl Fn(usize) -> [Point3; 3],
    best_distance: &mut f32,
) -> Option<GeometryHit> {
    let mut tracker = HitTracker::new(best_distance);
    for index in 0..count {
        let triangle = Triangle::from_vertices(triangle_at(index));
        tracker.offer(index, triangle.intersect_ray(local_ray));
    }
    tracker.finish()
}

/// World-units size of a screen-sized primitive at `position`
///
/// Perspective scales with distance from the eye; parallel is constant
/// across depth. `size` is in pixels.
fn projected_size(pick_ray: &PickRay, size: f32, position: Point3, local_ray: &Ray) -> f32 {
    let viewport = pick_ray.viewport();
    match pick_ray.projection() {
        Projection::Perspective => {
            let distance = (position - local_ray.origin).magnitude();
            size * pick_ray.field_of_view().tan() / viewport.height as f32 * distance
        }
        Projection::Parallel => size / viewport.width as f32,
    }
}

/// Two triangles spanning the quad centered at `center` with half-extent
/// vectors `u` and `v`
fn quad(center: Point3, u: Vec3, v: Vec3) -> [Triangle; 2] {
    let c00 = center - u - v;
    let c10 = center + u - v;
    let c11 = center + u + v;
    let c01 = center - u + v;
    [
        Triangle::new(c00, c10, c11),
        Triangle::new(c00, c11, c01),
    ]
}

/// Three mutually perpendicular quads (6 triangles) around a point
fn point_billboard(point: Point3, half: f32) -> [Triangle; 6] {
    let x = Vec3::x() * half;
    let y = Vec3::y() * half;
    let z = Vec3::z() * half;
    let [a, b] = quad(point, x, y);
    let [c, d] = quad(point, x, z);
    let [e, f] = quad(point, y, z);
    [a, b, c, d, e, f]
}

/// Oriented box around a segment: two crossing axial quads plus the two
/// end caps (8 triangles)
fn segment_box(start: Point3, end: Point3, half: f32) -> [Triangle; 8] {
    let axis = end - start;
    let direction = axis.normalize();
    let u = if direction.x.abs() < 0.9 {
        direction.cross(&Vec3::x()).normalize()
    } else {
        direction.cross(&Vec3::y()).normalize()
    };
    let v = direction.cross(&u);

    let midpoint = Point3::from((start.coords + end.coords) * 0.5);
    let half_axis = axis * 0.5;
    let [a, b] = quad(midpoint, half_axis, u * half);
    let [c, d] = quad(midpoint, half_axis, v * half);
    let [e, f] = quad(start, u * half, v * half);
    let [g, h] = quad(end, u * half, v * half);
    [a, b, c, d, e, f, g, h]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{
        Camera, Canvas, IndexedTriangleStripArray, LineArray, PointArray, TriangleArray,
        TriangleStripArray,
    };
    use approx::assert_relative_eq;

    fn pick_ray_at(x: f32, y: f32) -> PickRay {
        let camera = Camera::new(Projection::Perspective);
        PickRay::from_canvas(&camera, Canvas::new(800, 600), x, y)
    }

    fn center_ray() -> PickRay {
        pick_ray_at(400.0, 300.0)
    }

    fn p(x: f32, y: f32, z: f32) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn test_triangle_soup_closest_face_wins() {
        // Two triangles stacked along -Z; the nearer one must win.
        let geometry = Geometry::Triangles(TriangleArray::new(vec![
            p(-1.0, -1.0, -10.0),
            p(1.0, -1.0, -10.0),
            p(0.0, 1.0, -10.0),
            p(-1.0, -1.0, -5.0),
            p(1.0, -1.0, -5.0),
            p(0.0, 1.0, -5.0),
        ]));
        let pick_ray = center_ray();
        let mut best = f32::INFINITY;
        let hit = DefaultGeometryPickTester
            .test(&pick_ray, pick_ray.ray(), &geometry, &mut best)
            .unwrap();
        assert_eq!(hit.face_index, 1);
        assert_relative_eq!(hit.min_distance, 5.0, epsilon = 1e-4);
        assert_relative_eq!(hit.max_distance, 10.0, epsilon = 1e-4);
        assert_relative_eq!(best, 5.0, epsilon = 1e-4);
    }

    #[test]
    fn test_strip_decoding_finds_second_triangle() {
        // Strip quad spanning x in [0,1]; the pick ray tilts right and
        // down onto the second decoded triangle.
        let geometry = Geometry::TriangleStrip(TriangleStripArray::new(vec![
            p(0.0, 0.0, -5.0),
            p(1.0, 0.0, -5.0),
            p(0.0, 1.0, -5.0),
            p(1.0, 1.0, -5.0),
        ]));
        // Aim at world (0.75, 0.75, -5): inside triangle 1, outside 0.
        let direction = (p(0.75, 0.75, -5.0) - Point3::origin()).normalize();
        let pick_ray = center_ray();
        let ray = Ray::new(Point3::origin(), direction);
        let mut best = f32::INFINITY;
        let hit = DefaultGeometryPickTester
            .test(&pick_ray, &ray, &geometry, &mut best)
            .unwrap();
        assert_eq!(hit.face_index, 1);
    }

    #[test]
    fn test_indexed_strip_decoding() {
        let geometry = Geometry::IndexedTriangleStrip(IndexedTriangleStripArray::new(
            vec![p(-1.0, -1.0, -5.0), p(1.0, -1.0, -5.0), p(0.0, 1.0, -5.0)],
            vec![0, 1, 2],
        ));
        let pick_ray = center_ray();
        let mut best = f32::INFINITY;
        let hit = DefaultGeometryPickTester
            .test(&pick_ray, pick_ray.ray(), &geometry, &mut best)
            .unwrap();
        assert_eq!(hit.face_index, 0);
        assert_relative_eq!(hit.min_distance, 5.0, epsilon = 1e-4);
    }

    #[test]
    fn test_tightened_bound_rejects_farther_geometry() {
        let geometry = Geometry::Triangles(TriangleArray::new(vec![
            p(-1.0, -1.0, -10.0),
            p(1.0, -1.0, -10.0),
            p(0.0, 1.0, -10.0),
        ]));
        let pick_ray = center_ray();
        // A previous candidate already hit at distance 3.
        let mut best = 3.0;
        let hit = DefaultGeometryPickTester.test(&pick_ray, pick_ray.ray(), &geometry, &mut best);
        assert!(hit.is_none());
        assert_relative_eq!(best, 3.0);
    }

    #[test]
    fn test_point_billboard_pick() {
        // A 10px point straight ahead at depth 5.
        let geometry = Geometry::Points(PointArray::new(vec![p(0.0, 0.0, -5.0)], 10.0));
        let pick_ray = center_ray();
        let mut best = f32::INFINITY;
        let hit = DefaultGeometryPickTester
            .test(&pick_ray, pick_ray.ray(), &geometry, &mut best)
            .unwrap();
        assert_eq!(hit.face_index, 0);
        assert_relative_eq!(hit.min_distance, 5.0, epsilon = 1e-3);
    }

    #[test]
    fn test_point_billboard_miss_off_axis() {
        let geometry = Geometry::Points(PointArray::new(vec![p(3.0, 0.0, -5.0)], 10.0));
        let pick_ray = center_ray();
        let mut best = f32::INFINITY;
        assert!(DefaultGeometryPickTester
            .test(&pick_ray, pick_ray.ray(), &geometry, &mut best)
            .is_none());
    }

    #[test]
    fn test_line_segment_pick_hits_crossing_quad() {
        // A horizontal segment crossing the view axis at depth 5.
        let geometry = Geometry::Lines(LineArray::new(
            vec![p(-2.0, 0.0, -5.0), p(2.0, 0.0, -5.0)],
            8.0,
        ));
        let pick_ray = center_ray();
        let mut best = f32::INFINITY;
        let hit = DefaultGeometryPickTester
            .test(&pick_ray, pick_ray.ray(), &geometry, &mut best)
            .unwrap();
        assert_eq!(hit.face_index, 0);
        assert_relative_eq!(hit.min_distance, 5.0, epsilon = 1e-2);
    }
}
