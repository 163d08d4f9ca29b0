use ndarray::prelude::*;

/// Generic representation of attributes found in 3D model/object/geometry files.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    /// The 3D points. Shape is (Nx3).
    pub points: Array2<f32>,
    /// Per vertex RGB colors. Shape is (Nx3).
    pub colors: Option<Array2<u8>>,
    /// Vertex indices of each face. Shape is (FxK), K = 3 for triangles or 4 for quads.
    pub faces: Option<Array2<usize>>,
    /// Per face RGB colors. Shape is (Fx3).
    pub face_colors: Option<Array2<u8>>,
}

impl Geometry {
    pub fn from_points(points: Array2<f32>) -> Self {
        Self {
            points,
            colors: None,
            faces: None,
            face_colors: None,
        }
    }

    pub fn len_vertices(&self) -> usize {
        self.points.nrows()
    }

    pub fn len_faces(&self) -> usize {
        self.faces.as_ref().map_or(0, |faces| faces.nrows())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lengths() {
        let mut geometry = Geometry::from_points(Array2::zeros((5, 3)));
        assert_eq!(geometry.len_vertices(), 5);
        assert_eq!(geometry.len_faces(), 0);

        geometry.faces = Some(array![[0, 1, 2], [2, 3, 4]]);
        assert_eq!(geometry.len_faces(), 2);
    }
}
