//! Perspective projection of planar ellipses and arcs into 2D vector primitives.
//!
//! Shapes drawn on a plane are placed in 3D by a 4x4 transform and viewed
//! from an eye point. Ellipses stay ellipses under perspective, so instead of
//! rendering to pixels the library finds the projected ellipse by fitting a
//! conic through projected sample points.
//!
//! Main features:
//!  - Dense matrices with Jacobi SVD and least squares solver
//!  - Conic fitting and reduction to center, radii and rotation
//!  - Edge-on detection with line fallback
//!  - SVG arc reprojection
//!  - Clipping of the visible surface by a plane
//!
#![deny(warnings)]

mod clip;
mod conic;
mod ellipse;
mod error;
mod geometry;
mod matrix;
mod projection;
mod shape;
mod utils;

pub use clip::{
    HalfPlane, Polygon, clip_polygon_to_line, clip_viewport_polygon, half_plane_in_xy,
    intersect_lines, intersect_planes,
};
pub use conic::{
    Conic, ELLIPSE_SAMPLES, Ellipse, PerspectiveEllipse, Projected, SEGMENT_THRESHOLD, SegmentFit,
    ellipse_with_perspective, fit_conic, fit_ellipse, fit_segment,
};
pub use ellipse::{ArcProjection, EllipArc, SvgArc, arc_with_perspective};
pub use error::ProjectionError;
pub use geometry::{
    BBox, EPSILON, Line, Line3, PARALLEL_EPSILON, PI, Plane, Point, Point3, Scalar, scalar_fmt,
};
pub use matrix::{
    Axis, Matrix, PINV_EPSILON, Rotation, SVD_EPSILON, SVD_MAX_ITERATIONS, Svd, TransformStep,
};
pub use projection::{Perspective, project};
pub use shape::{PathCmd, Primitive, RenderContext, Shape, ShapeInner};
pub use utils::{Array, ArrayIter, det2, det3, quadratic_solve};
