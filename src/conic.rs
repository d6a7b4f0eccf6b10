//! Least squares conic fitting and its reduction to a standard ellipse
//!
//! A perspective view of an ellipse is found by projecting a handful of
//! points sampled on it and fitting a conic through the projected points.
//! When the projected points are (nearly) collinear the shape is viewed
//! edge-on and [`SegmentFit`] describes the line it degenerates into.
use crate::{
    BBox, EPSILON, Line, Matrix, PI, Perspective, Point, Point3, ProjectionError, Scalar,
    utils::{det2, det3, quadratic_solve},
};

/// Number of points sampled on an ellipse before projection
pub const ELLIPSE_SAMPLES: usize = 8;
/// Segment fits with residual below this are rendered as a line
pub const SEGMENT_THRESHOLD: Scalar = 0.99;

/// Conic section `a x^2 + b xy + c y^2 + d x + e y = 1`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conic {
    pub a: Scalar,
    pub b: Scalar,
    pub c: Scalar,
    pub d: Scalar,
    pub e: Scalar,
}

/// Fit conic through points in the least squares sense
///
/// Solves `M * [a, b, c, d, e]^T = 1` where rows of `M` are
/// `[x^2, xy, y^2, x, y]`. Requires at least five points. The normalized form
/// can not represent conics passing through the origin.
pub fn fit_conic(points: &[Point]) -> Result<Conic, ProjectionError> {
    if points.len() < 5 {
        return Err(ProjectionError::InsufficientPoints {
            needed: 5,
            found: points.len(),
        });
    }
    let rows: Vec<[Scalar; 5]> = points
        .iter()
        .map(|&Point([x, y])| [x * x, x * y, y * y, x, y])
        .collect();
    let design = Matrix::from_rows(&rows)?;
    let ones = vec![1.0; points.len()];
    let coeffs = design.svd().solve(&ones)?;
    match coeffs.as_slice() {
        &[a, b, c, d, e] => Ok(Conic { a, b, c, d, e }),
        _ => Err(ProjectionError::DimensionMismatch {
            left: design.shape(),
            right: (coeffs.len(), 1),
        }),
    }
}

impl Conic {
    /// Value of `a x^2 + b xy + c y^2 + d x + e y - 1`, zero on the curve
    pub fn eval(&self, point: Point) -> Scalar {
        let Point([x, y]) = point;
        let Self { a, b, c, d, e } = *self;
        a * x * x + b * x * y + c * y * y + d * x + e * y - 1.0
    }

    /// Reduce conic to center, radii and rotation
    ///
    /// Uses the determinant method: the center solves the linear system of
    /// partial derivatives, `theta = atan2(-b, c - a) / 2`, radii come from the
    /// eigenvalues `l1 <= l2` of the quadratic form and
    /// `K = -det(conic) / det(quadratic form)` as `rx = sqrt(K / l1)`,
    /// `ry = sqrt(K / l2)`. The result is ordered so that `rx >= ry` and
    /// `theta`, in `(-pi/2, pi/2]`, is the direction of the major axis.
    ///
    /// Radii are `NaN` if the conic is not an ellipse.
    pub fn to_standard_form(&self) -> Ellipse {
        let Self { a, b, c, d, e } = *self;
        let f = -1.0;

        let det = 4.0 * a * c - b * b;
        let cx = (b * e - 2.0 * c * d) / det;
        let cy = (b * d - 2.0 * a * e) / det;
        let theta = 0.5 * (-b).atan2(c - a);

        let mut roots = quadratic_solve(1.0, -(a + c), a * c - b * b / 4.0);
        let (l1, l2) = match (roots.next(), roots.next()) {
            (Some(r0), Some(r1)) => (r0.min(r1), r0.max(r1)),
            (Some(r0), None) => (r0, r0),
            // negative discriminant only appears from round-off on a circle
            _ => ((a + c) / 2.0, (a + c) / 2.0),
        };

        let det_conic = det3([
            a,
            b / 2.0,
            d / 2.0,
            b / 2.0,
            c,
            e / 2.0,
            d / 2.0,
            e / 2.0,
            f,
        ]);
        let det_quad = det2([a, b / 2.0, b / 2.0, c]);
        let k = -det_conic / det_quad;

        let rx = (k / l1).sqrt();
        let ry = (k / l2).sqrt();
        // `theta` follows `l1`, which is the minor axis when the form is negative definite
        if rx < ry {
            let theta = theta + PI / 2.0;
            Ellipse {
                cx,
                cy,
                rx: ry,
                ry: rx,
                theta: if theta > PI / 2.0 { theta - PI } else { theta },
            }
        } else {
            Ellipse {
                cx,
                cy,
                rx,
                ry,
                theta,
            }
        }
    }
}

/// Ellipse given by center, radii and rotation (radians) of the `x` radius
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipse {
    pub cx: Scalar,
    pub cy: Scalar,
    pub rx: Scalar,
    pub ry: Scalar,
    #[cfg_attr(feature = "serde", serde(default))]
    pub theta: Scalar,
}

impl Ellipse {
    /// Axis aligned ellipse
    pub fn new(cx: Scalar, cy: Scalar, rx: Scalar, ry: Scalar) -> Self {
        Self {
            cx,
            cy,
            rx,
            ry,
            theta: 0.0,
        }
    }

    pub fn circle(cx: Scalar, cy: Scalar, r: Scalar) -> Self {
        Self::new(cx, cy, r, r)
    }

    pub fn with_rotation(self, theta: Scalar) -> Self {
        Self { theta, ..self }
    }

    pub fn center(&self) -> Point {
        Point([self.cx, self.cy])
    }

    /// Point at parametric angle `t`
    pub fn at(&self, t: Scalar) -> Point {
        let (sin, cos) = t.sin_cos();
        Point([self.rx * cos, self.ry * sin]).rotate(self.theta) + self.center()
    }

    /// Points at `count` evenly spaced parametric angles starting from zero
    pub fn sample(&self, count: usize) -> Vec<Point> {
        let step = 2.0 * PI / count as Scalar;
        (0..count).map(|index| self.at(step * index as Scalar)).collect()
    }

    /// Whether all parameters are finite numbers
    pub fn is_finite(&self) -> bool {
        [self.cx, self.cy, self.rx, self.ry, self.theta]
            .iter()
            .all(|value| value.is_finite())
    }

    /// Map a point to the unit circle frame of this ellipse
    pub fn to_unit(&self, point: Point) -> Point {
        let Point([x, y]) = (point - self.center()).rotate(-self.theta);
        Point([x / self.rx, y / self.ry])
    }

    /// Parametric angle of the point projected on this ellipse
    pub fn angle_of(&self, point: Point) -> Scalar {
        let Point([x, y]) = self.to_unit(point);
        y.atan2(x)
    }
}

/// Fit an ellipse through points
///
/// Points are moved to their centroid and scaled to unit RMS radius before
/// [`fit_conic`], which keeps the system well conditioned and the conic away
/// from the origin. The result is mapped back to the original coordinates.
pub fn fit_ellipse(points: &[Point]) -> Result<Ellipse, ProjectionError> {
    if points.is_empty() {
        return Err(ProjectionError::InsufficientPoints {
            needed: 5,
            found: 0,
        });
    }
    let count = points.len() as Scalar;
    let centroid = points.iter().fold(Point::default(), |acc, p| acc + *p) / count;
    let scale = (points
        .iter()
        .map(|p| {
            let d = *p - centroid;
            d.dot(d)
        })
        .sum::<Scalar>()
        / count)
        .sqrt();
    if !(scale > EPSILON) {
        return Err(ProjectionError::DegenerateInput);
    }
    let normalized: Vec<Point> = points.iter().map(|p| (*p - centroid) / scale).collect();
    let ellipse = fit_conic(&normalized)?.to_standard_form();
    Ok(Ellipse {
        cx: ellipse.cx * scale + centroid.x(),
        cy: ellipse.cy * scale + centroid.y(),
        rx: ellipse.rx * scale,
        ry: ellipse.ry * scale,
        theta: ellipse.theta,
    })
}

/// Best fitting bounding box diagonal of a point set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentFit {
    pub line: Line,
    /// Largest perpendicular distance from a point to `line`
    pub error: Scalar,
}

impl SegmentFit {
    /// Whether points are close enough to the line to be drawn as one
    pub fn is_degenerate(&self) -> bool {
        self.error < SEGMENT_THRESHOLD
    }
}

/// Fit one of the bounding box diagonals through the points
pub fn fit_segment(points: &[Point]) -> Result<SegmentFit, ProjectionError> {
    if points.len() < 2 {
        return Err(ProjectionError::InsufficientPoints {
            needed: 2,
            found: points.len(),
        });
    }
    let bbox = BBox::from_points(points.iter().copied()).ok_or(ProjectionError::DegenerateInput)?;
    if bbox.width() < EPSILON && bbox.height() < EPSILON {
        return Err(ProjectionError::DegenerateInput);
    }
    let fit = |line: Line| SegmentFit {
        line,
        error: points
            .iter()
            .map(|point| line.distance(*point))
            .fold(0.0, Scalar::max),
    };
    let diag = fit(bbox.diag());
    let anti_diag = fit(bbox.anti_diag());
    Ok(if anti_diag.error < diag.error {
        anti_diag
    } else {
        diag
    })
}

/// Projected ellipse together with its edge-on approximation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveEllipse {
    pub ellipse: Ellipse,
    pub segment: SegmentFit,
}

/// Primitive a projected ellipse should be drawn as
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projected {
    Ellipse(Ellipse),
    Line(Line),
}

impl PerspectiveEllipse {
    /// Line if the ellipse is seen edge-on, fitted ellipse otherwise
    pub fn shape(&self) -> Projected {
        if self.segment.is_degenerate() {
            tracing::debug!(error = self.segment.error, "[ellipse] edge-on, using line");
            Projected::Line(self.segment.line)
        } else {
            Projected::Ellipse(self.ellipse)
        }
    }
}

impl Perspective {
    /// Project ellipse of the local `XY` plane
    pub fn ellipse(&self, ellipse: &Ellipse) -> Result<PerspectiveEllipse, ProjectionError> {
        let points = self.project_points(&ellipse.sample(ELLIPSE_SAMPLES))?;
        Ok(PerspectiveEllipse {
            ellipse: fit_ellipse(&points)?,
            segment: fit_segment(&points)?,
        })
    }
}

/// Project axis aligned ellipse of the local `XY` plane placed by `transform`
pub fn ellipse_with_perspective(
    cx: Scalar,
    cy: Scalar,
    rx: Scalar,
    ry: Scalar,
    eye: Point3,
    transform: &Matrix,
) -> Result<PerspectiveEllipse, ProjectionError> {
    Perspective::new(eye, transform.clone()).ellipse(&Ellipse::new(cx, cy, rx, ry))
}
