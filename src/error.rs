use crate::matrix::Axis;
use std::fmt;

/// Error produced by the projection core
///
/// Only structural problems are reported here. Geometric degeneracies
/// (parallel planes, edge-on views) are regular results.
#[derive(Debug)]
pub enum ProjectionError {
    /// Shapes of the operands are incompatible, `(rows, cols)` of each side
    DimensionMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },
    /// Operand has unexpected number of rows
    InvalidDimension { expected: usize, found: usize },
    /// Not enough points to fit requested primitive
    InsufficientPoints { needed: usize, found: usize },
    /// All points coincide
    DegenerateInput,
    /// Rotation plane is spanned by the same axis twice
    InvalidRotation(Axis),
    /// JSON error
    #[cfg(feature = "serde")]
    Json(serde_json::Error),
}

impl fmt::Display for ProjectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProjectionError::{:?}", self)
    }
}

#[cfg(feature = "serde")]
impl From<serde_json::Error> for ProjectionError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error)
    }
}

impl From<ProjectionError> for std::io::Error {
    fn from(error: ProjectionError) -> Self {
        Self::new(std::io::ErrorKind::InvalidData, error)
    }
}

impl std::error::Error for ProjectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            #[cfg(feature = "serde")]
            Self::Json(error) => Some(error),
            _ => None,
        }
    }
}
