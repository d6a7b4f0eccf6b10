//! Perspective projection of homogeneous 3D points onto the `z = 0` plane
use crate::{Matrix, Plane, Point, Point3, ProjectionError, Scalar};

/// Project homogeneous points (columns of a `4 x n` matrix) through `eye`
///
/// Every column `(x, y, z, 1)` is mapped to
/// `eye.xy + scale * (xy - eye.xy)` with `scale = eye.z / (eye.z - z)`.
/// Points with `z == eye.z` produce non-finite coordinates.
pub fn project(eye: Point3, points: &Matrix) -> Result<Vec<Point>, ProjectionError> {
    if points.rows() != 4 {
        return Err(ProjectionError::InvalidDimension {
            expected: 4,
            found: points.rows(),
        });
    }
    Ok((0..points.cols())
        .map(|col| {
            perspective_divide(
                eye,
                Point3([points[(0, col)], points[(1, col)], points[(2, col)]]),
            )
        })
        .collect())
}

#[inline]
fn perspective_divide(eye: Point3, point: Point3) -> Point {
    let scale: Scalar = eye.z() / (eye.z() - point.z());
    eye.xy() + scale * (point.xy() - eye.xy())
}

/// Placement of a planar shape in 3D space together with the viewer
///
/// `transform` maps the shape's local `XY` plane into 3D, `eye` is the
/// projection center, and `clip` optionally hides the part of the surface
/// lying behind a plane as seen from the eye.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Perspective {
    pub eye: Point3,
    #[cfg_attr(
        feature = "serde",
        serde(
            default = "identity_transform",
            deserialize_with = "deserialize_transform"
        )
    )]
    pub transform: Matrix,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub clip: Option<Plane>,
}

impl Perspective {
    pub fn new(eye: impl Into<Point3>, transform: Matrix) -> Self {
        Self {
            eye: eye.into(),
            transform,
            clip: None,
        }
    }

    /// Perspective with shape lying in the projection plane
    pub fn identity(eye: impl Into<Point3>) -> Self {
        Self::new(eye, Matrix::identity(4))
    }

    pub fn with_clip(self, plane: Plane) -> Self {
        Self {
            clip: Some(plane),
            ..self
        }
    }

    /// Place point of the local `XY` plane in 3D
    pub fn place(&self, point: Point) -> Result<Point3, ProjectionError> {
        self.transform.apply_point(Point3([point.x(), point.y(), 0.0]))
    }

    /// Project a point already placed in 3D
    pub fn project_point3(&self, point: Point3) -> Point {
        perspective_divide(self.eye, point)
    }

    /// Place and project a single point of the local `XY` plane
    pub fn project_point(&self, point: Point) -> Result<Point, ProjectionError> {
        Ok(self.project_point3(self.place(point)?))
    }

    /// Place and project points of the local `XY` plane
    pub fn project_points(&self, points: &[Point]) -> Result<Vec<Point>, ProjectionError> {
        if points.is_empty() {
            return Ok(Vec::new());
        }
        let columns: Vec<[Scalar; 4]> = points
            .iter()
            .map(|point| [point.x(), point.y(), 0.0, 1.0])
            .collect();
        let placed = self.transform.mul(&Matrix::from_homogeneous(&columns)?)?;
        project(self.eye, &placed)
    }

    /// Local `XY` plane after placement in 3D
    pub fn surface(&self) -> Result<Plane, ProjectionError> {
        let origin = self.transform.apply_point(Point3::default())?;
        let ex = self.transform.apply_vector(Point3([1.0, 0.0, 0.0]))?;
        let ey = self.transform.apply_vector(Point3([0.0, 1.0, 0.0]))?;
        Ok(Plane {
            point: origin,
            normal: ex.cross(ey),
        })
    }

    /// Load perspective description from JSON
    ///
    /// `transform` is either a list of 4 rows or a list of transform steps,
    /// identity if omitted.
    #[cfg(feature = "serde")]
    pub fn from_json(reader: impl std::io::Read) -> Result<Self, ProjectionError> {
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(feature = "serde")]
fn identity_transform() -> Matrix {
    Matrix::identity(4)
}

#[cfg(feature = "serde")]
fn deserialize_transform<'de, D>(deserializer: D) -> Result<Matrix, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::{Deserialize, de::Error};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TransformRepr {
        Matrix(Matrix),
        Steps(Vec<crate::TransformStep>),
    }

    let matrix = match TransformRepr::deserialize(deserializer)? {
        TransformRepr::Matrix(matrix) => matrix,
        TransformRepr::Steps(steps) => Matrix::from_steps(&steps).map_err(D::Error::custom)?,
    };
    if matrix.shape() != (4, 4) {
        return Err(D::Error::custom(format!(
            "transform must be a 4x4 matrix, found {:?}",
            matrix.shape()
        )));
    }
    Ok(matrix)
}
