//! Math utilities and types
//!
//! Provides fundamental math types for 3D picking and collision detection.

pub use nalgebra::{Matrix3, Matrix4, Rotation3, Unit, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
}

/// Math utility functions
pub mod utils {
    use super::{constants, Mat3, Rotation3};

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians * constants::RAD_TO_DEG
    }

    /// Build an orthonormal rotation matrix from Euler angles in degrees
    ///
    /// Angles are applied in X, Y, Z order (roll, pitch, yaw).
    pub fn euler_deg_to_matrix(x_deg: f32, y_deg: f32, z_deg: f32) -> Mat3 {
        Rotation3::from_euler_angles(
            deg_to_rad(x_deg),
            deg_to_rad(y_deg),
            deg_to_rad(z_deg),
        )
        .into_inner()
    }

    /// Extract Euler angles in degrees from an orthonormal rotation matrix
    ///
    /// Returns angles in X, Y, Z order, the inverse of [`euler_deg_to_matrix`].
    pub fn matrix_to_euler_deg(matrix: &Mat3) -> (f32, f32, f32) {
        let (x, y, z) = Rotation3::from_matrix_unchecked(*matrix).euler_angles();
        (rad_to_deg(x), rad_to_deg(y), rad_to_deg(z))
    }

    /// Clamp a value between min and max
    pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
        if value < min {
            min
        } else if value > max {
            max
        } else {
            value
        }
    }
}

#[cfg(test)]
mod tests {
    use super::utils::{euler_deg_to_matrix, matrix_to_euler_deg};
    use super::Vec3;
    use approx::assert_relative_eq;

    #[test]
    fn test_euler_matrix_round_trip() {
        let m = euler_deg_to_matrix(10.0, 45.0, -30.0);
        let (x, y, z) = matrix_to_euler_deg(&m);
        assert_relative_eq!(x, 10.0, epsilon = 1e-3);
        assert_relative_eq!(y, 45.0, epsilon = 1e-3);
        assert_relative_eq!(z, -30.0, epsilon = 1e-3);
    }

    #[test]
    fn test_y_rotation_maps_x_to_negative_z() {
        let m = euler_deg_to_matrix(0.0, 90.0, 0.0);
        let rotated = m * Vec3::new(1.0, 0.0, 0.0);
        assert_relative_eq!(rotated.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(rotated.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(rotated.z, -1.0, epsilon = 1e-6);
    }
}
