//! Rays and pick-ray derivation
//!
//! A pick ray is derived from a screen pixel and the camera's projection
//! parameters, then carried into world space through the camera-to-world
//! transform. Every construction entry point funnels into the same
//! [`PickRay::recalculate`] routine.

use crate::foundation::math::{Mat4, Point3, Vec2, Vec3};
use crate::scene::{Camera, Canvas, Projection, Viewport};

/// Starting Z for parallel-projection ray origins: a large stand-in for
/// "far behind everything", not a physical depth.
const PARALLEL_FAR_Z: f32 = 9999.0;

/// A ray for ray casting and picking
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// The origin point of the ray
    pub origin: Point3,
    /// The direction of the ray
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray with the given origin and normalized direction
    pub fn new(origin: Point3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Creates a ray without normalizing the direction
    ///
    /// Used when a world ray is carried into another coordinate frame:
    /// leaving the direction unnormalized keeps the parametric t of a hit
    /// equal to the world-space distance along the source ray.
    pub fn from_parts(origin: Point3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Get a point along the ray at parameter t
    pub fn point_at(&self, t: f32) -> Point3 {
        self.origin + self.direction * t
    }

    /// Carry this ray through a transform without renormalizing
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        Self::from_parts(
            matrix.transform_point(&self.origin),
            matrix.transform_vector(&self.direction),
        )
    }
}

/// A world-space ray derived from a screen pixel
///
/// Carries the view parameters it was derived under, so the geometry phase
/// can project screen-sized primitives (points, lines) into world units.
/// The ray is meaningless until [`Self::recalculate`] has run; every
/// public constructor runs it.
#[derive(Debug, Clone)]
pub struct PickRay {
    ray: Ray,
    projection: Projection,
    field_of_view: f32,
    screen_scale: f32,
    center_of_view: Vec2,
    camera_to_world: Mat4,
    viewport: Viewport,
}

impl PickRay {
    /// Derive a pick ray for a pixel on a full-canvas viewport
    pub fn from_canvas(camera: &Camera, canvas: Canvas, x: f32, y: f32) -> Self {
        Self::from_viewport(camera, Viewport::of_canvas(canvas), x, y)
    }

    /// Derive a pick ray for a pixel with an explicit viewport
    ///
    /// `x`/`y` are canvas pixel coordinates; the viewport origin is
    /// subtracted before normalization, so render passes that cover only
    /// part of the canvas pick correctly.
    pub fn from_viewport(camera: &Camera, viewport: Viewport, x: f32, y: f32) -> Self {
        let mut pick_ray = Self {
            ray: Ray::from_parts(Point3::origin(), Vec3::new(0.0, 0.0, -1.0)),
            projection: camera.projection,
            field_of_view: camera.field_of_view,
            screen_scale: camera.screen_scale,
            center_of_view: camera.center_of_view,
            camera_to_world: camera.transform,
            viewport,
        };
        pick_ray.recalculate(x, y);
        pick_ray
    }

    /// Re-derive another pick ray's pixel under a different projection
    /// policy, keeping every other view parameter
    pub fn derived(other: &Self, projection: Projection, x: f32, y: f32) -> Self {
        let mut pick_ray = Self {
            projection,
            ..other.clone()
        };
        pick_ray.recalculate(x, y);
        pick_ray
    }

    /// Recompute origin and direction for a canvas pixel
    ///
    /// The single source of truth for the derivation math. Requires the
    /// stored camera-to-world transform to be valid.
    pub fn recalculate(&mut self, x: f32, y: f32) {
        let width = self.viewport.width as f32;
        let height = self.viewport.height as f32;
        let aspect = self.viewport.aspect();

        // Pixel -> [-1, 1], y up.
        let rx = (x - self.viewport.x as f32) / width * 2.0 - 1.0;
        let ry = 1.0 - (y - self.viewport.y as f32) / height * 2.0;

        let local = match self.projection {
            Projection::Perspective => {
                let rx = rx * aspect;
                let vpd = 1.0 / self.field_of_view.tan();
                Ray::from_parts(Point3::origin(), Vec3::new(rx, ry, -vpd).normalize())
            }
            Projection::Parallel => {
                let ry = ry / aspect;
                let origin = Point3::new(
                    -self.center_of_view.x + self.screen_scale * rx,
                    -self.center_of_view.y + self.screen_scale * ry,
                    PARALLEL_FAR_Z,
                );
                Ray::from_parts(origin, Vec3::new(0.0, 0.0, -1.0))
            }
        };

        let world = local.transformed(&self.camera_to_world);
        self.ray = Ray::new(world.origin, world.direction);
    }

    /// The derived world-space ray
    pub fn ray(&self) -> &Ray {
        &self.ray
    }

    /// Ray origin in world space
    pub fn origin(&self) -> Point3 {
        self.ray.origin
    }

    /// Normalized ray direction in world space
    pub fn direction(&self) -> Vec3 {
        self.ray.direction
    }

    /// Projection policy the ray was derived under
    pub fn projection(&self) -> Projection {
        self.projection
    }

    /// Field of view in radians
    pub fn field_of_view(&self) -> f32 {
        self.field_of_view
    }

    /// Viewport the pixel was normalized against
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn canvas() -> Canvas {
        Canvas::new(800, 600)
    }

    #[test]
    fn test_perspective_center_pixel_is_principal_axis() {
        let camera = Camera::new(Projection::Perspective);
        let ray = PickRay::from_canvas(&camera, canvas(), 400.0, 300.0);
        assert_relative_eq!(ray.direction().x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(ray.direction().y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(ray.direction().z, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_parallel_center_pixel_is_principal_axis() {
        let camera = Camera::new(Projection::Parallel);
        let ray = PickRay::from_canvas(&camera, canvas(), 400.0, 300.0);
        assert_relative_eq!(ray.origin().x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(ray.origin().y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(ray.direction().z, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_recalculate_is_deterministic() {
        let camera = Camera::new(Projection::Perspective);
        let first = PickRay::from_canvas(&camera, canvas(), 123.0, 456.0);
        let second = PickRay::from_canvas(&camera, canvas(), 123.0, 456.0);
        assert_eq!(first.origin(), second.origin());
        assert_eq!(first.direction(), second.direction());

        let mut third = first.clone();
        third.recalculate(123.0, 456.0);
        assert_eq!(third.direction(), first.direction());
    }

    #[test]
    fn test_right_half_of_screen_bends_ray_right() {
        let camera = Camera::new(Projection::Perspective);
        let ray = PickRay::from_canvas(&camera, canvas(), 700.0, 300.0);
        assert!(ray.direction().x > 0.0);
        assert_relative_eq!(ray.direction().y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_viewport_offset_shifts_center() {
        let camera = Camera::new(Projection::Perspective);
        // A 400x300 viewport in the bottom-right quadrant; its center pixel
        // in canvas coordinates is (600, 450).
        let viewport = Viewport::new(400, 300, 400, 300);
        let ray = PickRay::from_viewport(&camera, viewport, 600.0, 450.0);
        assert_relative_eq!(ray.direction().x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(ray.direction().y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_derived_switches_projection() {
        let camera = Camera::new(Projection::Perspective);
        let perspective = PickRay::from_canvas(&camera, canvas(), 400.0, 300.0);
        let parallel = PickRay::derived(&perspective, Projection::Parallel, 400.0, 300.0);
        assert_eq!(parallel.projection(), Projection::Parallel);
        assert_relative_eq!(parallel.origin().z, PARALLEL_FAR_Z, epsilon = 1e-3);
    }

    #[test]
    fn test_camera_transform_carries_ray_to_world() {
        let camera = Camera::new(Projection::Perspective).look_at(
            Point3::new(0.0, 0.0, 5.0),
            Point3::origin(),
            Vec3::y(),
        );
        let ray = PickRay::from_canvas(&camera, canvas(), 400.0, 300.0);
        assert_relative_eq!(ray.origin().z, 5.0, epsilon = 1e-5);
        assert_relative_eq!(ray.direction().z, -1.0, epsilon = 1e-5);
    }
}
