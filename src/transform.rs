use nalgebra::{Isometry3, Matrix4, Point3, Rotation3, Translation3, UnitQuaternion, Vector3};

/// Rigid transform. Camera poses are stored as camera-to-world transforms.
#[derive(Clone, Debug, PartialEq)]
pub struct Transform(Isometry3<f32>);

impl Transform {
    pub fn eye() -> Self {
        Self(Isometry3::<f32>::identity())
    }

    pub fn new(translation: Vector3<f32>, rotation: UnitQuaternion<f32>) -> Self {
        Self(Isometry3::<f32>::from_parts(
            Translation3::from(translation),
            rotation,
        ))
    }

    /// Camera-to-world transform of a camera at `eye` whose optical axis (+z) points
    /// at `target`.
    pub fn look_at(eye: &Vector3<f32>, target: &Vector3<f32>, up: &Vector3<f32>) -> Self {
        Self(Isometry3::face_towards(
            &Point3::from(*eye),
            &Point3::from(*target),
            up,
        ))
    }

    /// Creates a transform from the upper 3x4 part of a homogeneous matrix.
    /// The rotation part is re-orthonormalized.
    pub fn from_matrix4(matrix: &Matrix4<f32>) -> Self {
        let translation = Translation3::new(matrix[(0, 3)], matrix[(1, 3)], matrix[(2, 3)]);
        let linear = matrix.fixed_slice::<3, 3>(0, 0).into_owned();
        // The iterative fit needs a close guess, it stalls on half turns starting from
        // the identity.
        let guess = UnitQuaternion::new_normalize(
            UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(linear))
                .into_inner(),
        );
        let rotation = UnitQuaternion::from_matrix_eps(&linear, f32::EPSILON, 32, guess);
        Self(Isometry3::<f32>::from_parts(translation, rotation))
    }

    /// Creates a transform from a row-major 4x4 nested array, as found in JSON files.
    /// Returns `None` unless there are exactly four rows of four values.
    pub fn from_rows(rows: &[Vec<f32>]) -> Option<Self> {
        if rows.len() != 4 || rows.iter().any(|row| row.len() != 4) {
            return None;
        }
        let matrix = Matrix4::<f32>::from_fn(|r, c| {
            if r < 3 {
                rows[r][c]
            } else if c == 3 {
                1.0
            } else {
                0.0
            }
        });
        Some(Self::from_matrix4(&matrix))
    }

    pub fn inverse(&self) -> Self {
        Self(self.0.inverse())
    }

    /// Applies the full rigid motion (rotation then translation) to a point.
    pub fn transform_vector(&self, point: &Vector3<f32>) -> Vector3<f32> {
        self.0.transform_point(&Point3::from(*point)).coords
    }

    pub fn translation(&self) -> Vector3<f32> {
        self.0.translation.vector
    }

    /// Pose estimators return the identity when no markers were found.
    pub fn is_identity(&self) -> bool {
        self.0.translation.vector.norm() < f32::EPSILON && self.0.rotation.angle() < f32::EPSILON
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::eye()
    }
}

impl From<Transform> for Matrix4<f32> {
    fn from(transform: Transform) -> Self {
        transform.0.into()
    }
}
