//! Camera / view description consumed by pick-ray derivation
//!
//! The view capability surface: projection mode, field of view, screen
//! scale, center-of-view offset and the camera-to-world transform. The
//! camera never issues graphics calls here; it only parameterizes rays.

use crate::foundation::math::{Mat4, Point3, Vec2, Vec3};

/// Projection policy of a view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Perspective projection: rays fan out from the eye point
    Perspective,
    /// Parallel (orthographic) projection: rays share one direction
    Parallel,
}

/// Canvas (drawable surface) dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canvas {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Canvas {
    /// Creates a canvas description
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width / height ratio
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}

/// A viewport within a canvas, for render passes that don't cover the
/// whole drawable surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// Left edge in pixels
    pub x: u32,
    /// Top edge in pixels
    pub y: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Viewport {
    /// Creates a viewport description
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Viewport covering a whole canvas
    pub fn of_canvas(canvas: Canvas) -> Self {
        Self::new(0, 0, canvas.width, canvas.height)
    }

    /// Width / height ratio
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Camera parameters rays are derived from
#[derive(Debug, Clone)]
pub struct Camera {
    /// Projection policy
    pub projection: Projection,
    /// Field of view in radians (perspective only)
    pub field_of_view: f32,
    /// World units per normalized screen unit (parallel only)
    pub screen_scale: f32,
    /// Center-of-view offset in world units (parallel only)
    pub center_of_view: Vec2,
    /// Camera-to-world transform
    pub transform: Mat4,
}

impl Camera {
    /// Creates a camera with the given projection policy and an identity
    /// transform at the origin
    pub fn new(projection: Projection) -> Self {
        Self {
            projection,
            field_of_view: std::f32::consts::FRAC_PI_4,
            screen_scale: 1.0,
            center_of_view: Vec2::zeros(),
            transform: Mat4::identity(),
        }
    }

    /// Set the field of view in radians
    pub fn with_field_of_view(mut self, fov: f32) -> Self {
        self.field_of_view = fov;
        self
    }

    /// Set the screen scale
    pub fn with_screen_scale(mut self, scale: f32) -> Self {
        self.screen_scale = scale;
        self
    }

    /// Set the center-of-view offset
    pub fn with_center_of_view(mut self, center: Vec2) -> Self {
        self.center_of_view = center;
        self
    }

    /// Set the camera-to-world transform directly
    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    /// Place the camera at `eye` looking toward `target`
    ///
    /// Builds the camera-to-world transform for the view-space convention
    /// used by ray derivation: camera looks down its local -Z axis.
    pub fn look_at(mut self, eye: Point3, target: Point3, up: Vec3) -> Self {
        let z_axis = (eye - target).normalize();
        let x_axis = up.cross(&z_axis).normalize();
        let y_axis = z_axis.cross(&x_axis);

        self.transform = Mat4::new(
            x_axis.x, y_axis.x, z_axis.x, eye.x,
            x_axis.y, y_axis.y, z_axis.y, eye.y,
            x_axis.z, y_axis.z, z_axis.z, eye.z,
            0.0, 0.0, 0.0, 1.0,
        );
        self
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Projection::Perspective)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_look_at_maps_view_forward_to_target() {
        let camera = Camera::default().look_at(
            Point3::new(0.0, 0.0, 5.0),
            Point3::origin(),
            Vec3::y(),
        );
        // View-space -Z maps to the eye→target direction.
        let forward = camera.transform.transform_vector(&Vec3::new(0.0, 0.0, -1.0));
        assert_relative_eq!(forward.z, -1.0, epsilon = 1e-6);
        // The eye position is the transform's translation.
        let eye = camera.transform.transform_point(&Point3::origin());
        assert_relative_eq!(eye.z, 5.0, epsilon = 1e-6);
    }
}
