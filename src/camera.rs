use nalgebra::{Matrix3, Vector3};
use serde_derive::{Deserialize, Serialize};

use super::transform::Transform;

/// Camera intrinsic parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraIntrinsics {
    /// Focal length and pixel scale in the X-axis.
    pub fx: f64,
    /// Focal length and pixel scale in the Y-axis.
    pub fy: f64,
    /// Camera X-center.
    pub cx: f64,
    /// Camera Y-center.
    pub cy: f64,
}

impl CameraIntrinsics {
    pub fn from_simple_intrinsic(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self { fx, fy, cx, cy }
    }

    /// Reads the parameters from a 3x3 camera matrix `[[fx, 0, cx], [0, fy, cy], [0, 0, 1]]`.
    pub fn from_matrix3(matrix: &Matrix3<f64>) -> Self {
        Self {
            fx: matrix[(0, 0)],
            fy: matrix[(1, 1)],
            cx: matrix[(0, 2)],
            cy: matrix[(1, 2)],
        }
    }

    /// Project a 3D point into image space.
    ///
    /// # Arguments
    ///
    /// * point: The 3D point in camera space.
    ///
    /// # Returns
    ///
    /// * (x and y) coordinates.
    pub fn project(&self, point: &Vector3<f32>) -> (f32, f32) {
        (
            point[0] * self.fx as f32 / point[2] + self.cx as f32,
            point[1] * self.fy as f32 / point[2] + self.cy as f32,
        )
    }
}

/// Brown-Conrady lens distortion coefficients, in the usual `k1, k2, p1, p2, k3` order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Distortion {
    pub k1: f64,
    pub k2: f64,
    pub p1: f64,
    pub p2: f64,
    pub k3: f64,
}

impl Distortion {
    /// Builds from a coefficient vector. Missing trailing coefficients are zero,
    /// extra ones (rational models) are ignored.
    pub fn from_coefficients(coefficients: &[f64]) -> Self {
        let at = |i: usize| coefficients.get(i).copied().unwrap_or(0.0);
        Self {
            k1: at(0),
            k2: at(1),
            p1: at(2),
            p2: at(3),
            k3: at(4),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.k1 == 0.0 && self.k2 == 0.0 && self.p1 == 0.0 && self.p2 == 0.0 && self.k3 == 0.0
    }

    /// Applies the distortion to normalized image coordinates.
    pub fn distort(&self, x: f64, y: f64) -> (f64, f64) {
        let r2 = x * x + y * y;
        let radial = 1.0 + self.k1 * r2 + self.k2 * r2 * r2 + self.k3 * r2 * r2 * r2;
        (
            x * radial + 2.0 * self.p1 * x * y + self.p2 * (r2 + 2.0 * x * x),
            y * radial + self.p1 * (r2 + 2.0 * y * y) + 2.0 * self.p2 * x * y,
        )
    }
}

/// A calibrated view: intrinsics, pose and image size.
#[derive(Clone, Debug)]
pub struct PinholeCamera {
    pub intrinsics: CameraIntrinsics,
    pub camera_to_world: Transform,
    world_to_camera: Transform,
    pub width: usize,
    pub height: usize,
}

impl PinholeCamera {
    pub fn new(
        intrinsics: CameraIntrinsics,
        camera_to_world: Transform,
        width: usize,
        height: usize,
    ) -> Self {
        Self {
            intrinsics,
            world_to_camera: camera_to_world.inverse(),
            camera_to_world,
            width,
            height,
        }
    }

    /// Project a 3D world point into image space.
    ///
    /// # Returns
    ///
    /// * (x and y) coordinates and the depth along the optical axis.
    pub fn project(&self, point: &Vector3<f32>) -> (f32, f32, f32) {
        let camera_point = self.world_to_camera.transform_vector(point);
        let (x, y) = self.intrinsics.project(&camera_point);
        (x, y, camera_point[2])
    }

    /// Projects a world point and returns the integer pixel `(column, row)` it falls on,
    /// or `None` if it lands outside the image or behind the camera.
    pub fn project_if_visible(&self, point: &Vector3<f32>) -> Option<(usize, usize)> {
        let (x, y, depth) = self.project(point);

        if depth > 0.0 && x >= 0.0 && x < self.width as f32 && y >= 0.0 && y < self.height as f32
        {
            Some((x as usize, y as usize))
        } else {
            None
        }
    }

    /// The camera center in world coordinates.
    pub fn center(&self) -> Vector3<f32> {
        self.camera_to_world.translation()
    }

    /// Whether the pose is the identity, i.e. the pose estimator found no markers.
    pub fn has_pose(&self) -> bool {
        !self.camera_to_world.is_identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::UnitQuaternion;

    #[test]
    fn test_intrinsics_matrix() {
        let matrix = Matrix3::new(500.0, 0.0, 320.0, 0.0, 510.0, 240.0, 0.0, 0.0, 1.0);
        assert_eq!(
            CameraIntrinsics::from_matrix3(&matrix),
            CameraIntrinsics::from_simple_intrinsic(500.0, 510.0, 320.0, 240.0)
        );
    }

    #[test]
    fn test_project() {
        let intrinsics = CameraIntrinsics::from_simple_intrinsic(500.0, 400.0, 320.0, 240.0);
        // 500 * 0.4 / 2 + 320, 400 * -0.3 / 2 + 240
        let (x, y) = intrinsics.project(&Vector3::new(0.4, -0.3, 2.0));
        assert_relative_eq!(x, 420.0, epsilon = 1e-3);
        assert_relative_eq!(y, 180.0, epsilon = 1e-3);
    }

    #[test]
    fn test_project_if_visible() {
        let camera = PinholeCamera::new(
            CameraIntrinsics::from_simple_intrinsic(100.0, 100.0, 50.0, 50.0),
            Transform::new(Vector3::new(0.0, 0.0, -1.0), UnitQuaternion::identity()),
            100,
            100,
        );

        assert_eq!(
            camera.project_if_visible(&Vector3::new(0.0, 0.0, 1.0)),
            Some((50, 50))
        );
        // Outside the image.
        assert_eq!(camera.project_if_visible(&Vector3::new(10.0, 0.0, 1.0)), None);
        // Behind the camera.
        assert_eq!(camera.project_if_visible(&Vector3::new(0.0, 0.0, -2.0)), None);
        assert_relative_eq!(camera.center(), Vector3::new(0.0, 0.0, -1.0));
        assert!(camera.has_pose());
    }

    #[test]
    fn test_distortion() {
        let distortion = Distortion::from_coefficients(&[0.1, 0.0]);
        assert!(!distortion.is_zero());
        assert_eq!(distortion.p1, 0.0);

        let (x, y) = distortion.distort(0.5, 0.0);
        assert_relative_eq!(x, 0.5 * (1.0 + 0.1 * 0.25));
        assert_relative_eq!(y, 0.0);
        assert!(Distortion::default().is_zero());
    }
}
