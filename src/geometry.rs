use crate::utils::clamp;
use bytemuck::{Pod, Zeroable};
use std::{
    fmt,
    ops::{Add, Div, Mul, Neg, Sub},
};

pub type Scalar = f64;
pub const EPSILON: f64 = f64::EPSILON;
pub const PI: f64 = std::f64::consts::PI;

/// Cross products shorter than this are treated as parallel directions
pub const PARALLEL_EPSILON: Scalar = 1e-10;

/// Format floats in a compact way
pub fn scalar_fmt(f: &mut fmt::Formatter<'_>, value: Scalar) -> fmt::Result {
    let value_abs = value.abs();
    if !value.is_finite() {
        write!(f, "{}", value)
    } else if value_abs.fract() < EPSILON {
        write!(f, "{}", value.trunc() as i64)
    } else if value_abs > 9999.0 || value_abs <= 0.0001 {
        write!(f, "{:.3e}", value)
    } else {
        let ten: Scalar = 10.0;
        let round = ten.powi(6 - (value_abs.trunc() + 1.0).log10().ceil() as i32);
        write!(f, "{}", (value * round).round() / round)
    }
}

/// Value representing a 2D point or vector.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, PartialEq, Default, Pod, Zeroable)]
#[repr(transparent)]
pub struct Point(pub [Scalar; 2]);

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Point([x, y]) = self;
        scalar_fmt(f, *x)?;
        write!(f, ",")?;
        scalar_fmt(f, *y)
    }
}

impl Point {
    #[inline]
    pub fn new(x: Scalar, y: Scalar) -> Self {
        Self([x, y])
    }

    #[inline]
    pub fn x(self) -> Scalar {
        self.0[0]
    }

    #[inline]
    pub fn y(self) -> Scalar {
        self.0[1]
    }

    /// Length of the vector (distance from the origin)
    pub fn length(self) -> Scalar {
        let Self([x, y]) = self;
        x.hypot(y)
    }

    /// Distance between two points
    pub fn dist(self, other: Self) -> Scalar {
        (self - other).length()
    }

    pub fn dot(self, other: Self) -> Scalar {
        let Self([x0, y0]) = self;
        let Self([x1, y1]) = other;
        x0 * x1 + y0 * y1
    }

    /// Cross product between two vectors (z component of the 3D cross product)
    pub fn cross(self, other: Self) -> Scalar {
        let Self([x0, y0]) = self;
        let Self([x1, y1]) = other;
        x0 * y1 - y0 * x1
    }

    /// Rotate vector by `angle` radians around the origin
    pub fn rotate(self, angle: Scalar) -> Self {
        let (sin, cos) = angle.sin_cos();
        let Self([x, y]) = self;
        Self([x * cos - y * sin, x * sin + y * cos])
    }

    /// Calculate angle (from self to the other) between two vectors
    pub fn angle_between(self, other: Self) -> Option<Scalar> {
        let angle = clamp(self.cos_between(other)?, -1.0, 1.0).acos();
        if self.cross(other) < 0.0 {
            Some(-angle)
        } else {
            Some(angle)
        }
    }

    /// Cosine of the angle (from self to the other) between to vectors
    pub fn cos_between(self, other: Self) -> Option<Scalar> {
        let lengths = self.length() * other.length();
        if lengths < EPSILON {
            None
        } else {
            Some(self.dot(other) / lengths)
        }
    }

    /// Determine if self is close to the other within the margin of error
    pub fn is_close_to(self, other: Point, tolerance: Scalar) -> bool {
        let Self([x0, y0]) = self;
        let Self([x1, y1]) = other;
        (x0 - x1).abs() < tolerance && (y0 - y1).abs() < tolerance
    }
}

impl From<(Scalar, Scalar)> for Point {
    #[inline]
    fn from(xy: (Scalar, Scalar)) -> Self {
        Self([xy.0, xy.1])
    }
}

impl From<[Scalar; 2]> for Point {
    #[inline]
    fn from(xy: [Scalar; 2]) -> Self {
        Self(xy)
    }
}

impl From<Point> for [Scalar; 2] {
    #[inline]
    fn from(point: Point) -> Self {
        point.0
    }
}

impl Mul<Point> for Scalar {
    type Output = Point;

    #[inline]
    fn mul(self, other: Point) -> Self::Output {
        let Point([x, y]) = other;
        Point([self * x, self * y])
    }
}

impl Div<Scalar> for Point {
    type Output = Point;

    #[inline]
    fn div(self, rhs: Scalar) -> Self::Output {
        let Point([x, y]) = self;
        Point([x / rhs, y / rhs])
    }
}

impl Add for Point {
    type Output = Point;

    #[inline]
    fn add(self, other: Point) -> Self::Output {
        let Point([x0, y0]) = self;
        let Point([x1, y1]) = other;
        Point([x0 + x1, y0 + y1])
    }
}

impl Sub for Point {
    type Output = Point;

    #[inline]
    fn sub(self, other: Point) -> Self::Output {
        let Point([x0, y0]) = self;
        let Point([x1, y1]) = other;
        Point([x0 - x1, y0 - y1])
    }
}

impl Neg for Point {
    type Output = Point;

    #[inline]
    fn neg(self) -> Self::Output {
        let Point([x, y]) = self;
        Point([-x, -y])
    }
}

/// Value representing a 3D point or vector.
///
/// With `serde` enabled it is deserialized either from `[x, y, z]` or from a
/// record where any of `x`, `y`, `z` may be omitted and defaults to zero.
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "Point3Repr")
)]
#[derive(Clone, Copy, PartialEq, Default, Pod, Zeroable)]
#[repr(transparent)]
pub struct Point3(pub [Scalar; 3]);

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum Point3Repr {
    Array([Scalar; 3]),
    Record {
        #[serde(default)]
        x: Scalar,
        #[serde(default)]
        y: Scalar,
        #[serde(default)]
        z: Scalar,
    },
}

#[cfg(feature = "serde")]
impl From<Point3Repr> for Point3 {
    fn from(repr: Point3Repr) -> Self {
        match repr {
            Point3Repr::Array(xyz) => Self(xyz),
            Point3Repr::Record { x, y, z } => Self([x, y, z]),
        }
    }
}

impl fmt::Debug for Point3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Point3([x, y, z]) = self;
        scalar_fmt(f, *x)?;
        write!(f, ",")?;
        scalar_fmt(f, *y)?;
        write!(f, ",")?;
        scalar_fmt(f, *z)
    }
}

impl Point3 {
    #[inline]
    pub fn new(x: Scalar, y: Scalar, z: Scalar) -> Self {
        Self([x, y, z])
    }

    #[inline]
    pub fn x(self) -> Scalar {
        self.0[0]
    }

    #[inline]
    pub fn y(self) -> Scalar {
        self.0[1]
    }

    #[inline]
    pub fn z(self) -> Scalar {
        self.0[2]
    }

    /// Homogeneous representation of the point `[x, y, z, 1]`
    pub fn to_homogeneous(self) -> [Scalar; 4] {
        let Self([x, y, z]) = self;
        [x, y, z, 1.0]
    }

    pub fn length(self) -> Scalar {
        self.dot(self).sqrt()
    }

    pub fn dist(self, other: Self) -> Scalar {
        (self - other).length()
    }

    pub fn dot(self, other: Self) -> Scalar {
        let Self([x0, y0, z0]) = self;
        let Self([x1, y1, z1]) = other;
        x0 * x1 + y0 * y1 + z0 * z1
    }

    pub fn cross(self, other: Self) -> Self {
        let Self([x0, y0, z0]) = self;
        let Self([x1, y1, z1]) = other;
        Self([y0 * z1 - z0 * y1, z0 * x1 - x0 * z1, x0 * y1 - y0 * x1])
    }

    /// Convert vector to a unit size vector, if length is not zero
    pub fn normalize(self) -> Option<Self> {
        let length = self.length();
        if length < EPSILON {
            None
        } else {
            Some(self / length)
        }
    }

    /// Drop `z` component
    pub fn xy(self) -> Point {
        Point([self.x(), self.y()])
    }
}

impl From<[Scalar; 3]> for Point3 {
    #[inline]
    fn from(xyz: [Scalar; 3]) -> Self {
        Self(xyz)
    }
}

impl From<(Scalar, Scalar, Scalar)> for Point3 {
    #[inline]
    fn from(xyz: (Scalar, Scalar, Scalar)) -> Self {
        Self([xyz.0, xyz.1, xyz.2])
    }
}

impl From<Point3> for [Scalar; 3] {
    #[inline]
    fn from(point: Point3) -> Self {
        point.0
    }
}

impl Mul<Point3> for Scalar {
    type Output = Point3;

    #[inline]
    fn mul(self, other: Point3) -> Self::Output {
        let Point3([x, y, z]) = other;
        Point3([self * x, self * y, self * z])
    }
}

impl Div<Scalar> for Point3 {
    type Output = Point3;

    #[inline]
    fn div(self, rhs: Scalar) -> Self::Output {
        let Point3([x, y, z]) = self;
        Point3([x / rhs, y / rhs, z / rhs])
    }
}

impl Add for Point3 {
    type Output = Point3;

    #[inline]
    fn add(self, other: Point3) -> Self::Output {
        let Point3([x0, y0, z0]) = self;
        let Point3([x1, y1, z1]) = other;
        Point3([x0 + x1, y0 + y1, z0 + z1])
    }
}

impl Sub for Point3 {
    type Output = Point3;

    #[inline]
    fn sub(self, other: Point3) -> Self::Output {
        let Point3([x0, y0, z0]) = self;
        let Point3([x1, y1, z1]) = other;
        Point3([x0 - x1, y0 - y1, z0 - z1])
    }
}

impl Neg for Point3 {
    type Output = Point3;

    #[inline]
    fn neg(self) -> Self::Output {
        let Point3([x, y, z]) = self;
        Point3([-x, -y, -z])
    }
}

/// Infinite 2D line through two points, also used as a line segment
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, PartialEq)]
pub struct Line(pub [Point; 2]);

impl fmt::Debug for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Line([p0, p1]) = self;
        write!(f, "Line {:?} {:?}", p0, p1)
    }
}

impl Line {
    pub fn new(p0: impl Into<Point>, p1: impl Into<Point>) -> Self {
        Self([p0.into(), p1.into()])
    }

    pub fn start(&self) -> Point {
        self.0[0]
    }

    pub fn end(&self) -> Point {
        self.0[1]
    }

    pub fn length(&self) -> Scalar {
        let Self([p0, p1]) = self;
        p0.dist(*p1)
    }

    /// Direction vector from start to end
    pub fn direction(&self) -> Point {
        self.end() - self.start()
    }

    pub fn at(&self, t: Scalar) -> Point {
        let Self([p0, p1]) = self;
        (1.0 - t) * *p0 + t * *p1
    }

    /// Signed side of the point relative to the directed line
    ///
    /// Positive on the left (counter-clockwise) side, negative on the right,
    /// zero on the line. Magnitude is `distance * length`.
    pub fn side(&self, point: Point) -> Scalar {
        self.direction().cross(point - self.start())
    }

    /// Perpendicular distance from the point to the infinite line
    pub fn distance(&self, point: Point) -> Scalar {
        let length = self.length();
        if length < EPSILON {
            point.dist(self.start())
        } else {
            self.side(point).abs() / length
        }
    }

    /// Find intersection of two infinite lines
    ///
    /// Returns pair of `t` parameters for this line and the other line.
    /// Found by solving `self.at(t0) == other.at(t1)`.
    pub fn intersect(&self, other: Line) -> Option<(Scalar, Scalar)> {
        let Line([Point([x1, y1]), Point([x2, y2])]) = *self;
        let Line([Point([x3, y3]), Point([x4, y4])]) = other;
        let det = (x4 - x3) * (y1 - y2) - (x1 - x2) * (y4 - y3);
        if det.abs() < PARALLEL_EPSILON {
            return None;
        }
        let t0 = ((y3 - y4) * (x1 - x3) + (x4 - x3) * (y1 - y3)) / det;
        let t1 = ((y1 - y2) * (x1 - x3) + (x2 - x1) * (y1 - y3)) / det;
        Some((t0, t1))
    }

    /// Intersection point of two infinite lines, `None` if they are parallel
    pub fn intersect_point(&self, other: Line) -> Option<Point> {
        let (t0, _) = self.intersect(other)?;
        Some(self.at(t0))
    }
}

/// Plane in 3D space given by a point on it and its normal
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub point: Point3,
    pub normal: Point3,
}

impl Plane {
    pub fn new(point: impl Into<Point3>, normal: impl Into<Point3>) -> Self {
        Self {
            point: point.into(),
            normal: normal.into(),
        }
    }

    /// Signed offset of the point along the plane normal (scaled by normal length)
    pub fn side(&self, point: Point3) -> Scalar {
        self.normal.dot(point - self.point)
    }

    /// Parameter `t` at which the ray `origin + t * (target - origin)` crosses the plane
    ///
    /// Returns `None` if the ray is parallel to the plane.
    pub fn ray_param(&self, origin: Point3, target: Point3) -> Option<Scalar> {
        let denom = self.normal.dot(target - origin);
        if denom.abs() < PARALLEL_EPSILON {
            None
        } else {
            Some(self.normal.dot(self.point - origin) / denom)
        }
    }
}

/// Infinite 3D line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line3 {
    pub point: Point3,
    /// Unit direction vector
    pub direction: Point3,
}

impl Line3 {
    pub fn at(&self, t: Scalar) -> Point3 {
        self.point + t * self.direction
    }
}

/// Bounding box with sides directed along the axes
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, PartialEq)]
pub struct BBox {
    /// Point with minimal x and y values
    min: Point,
    /// Point with maximum x and y values
    max: Point,
}

impl BBox {
    /// Construct bounding box which includes points `p0` and `p1`
    pub fn new(p0: impl Into<Point>, p1: impl Into<Point>) -> Self {
        let Point([x0, y0]) = p0.into();
        let Point([x1, y1]) = p1.into();
        Self {
            min: Point([x0.min(x1), y0.min(y1)]),
            max: Point([x0.max(x1), y0.max(y1)]),
        }
    }

    /// Bounding box of an SVG `viewBox` given as `x y width height`
    pub fn from_view_box(x: Scalar, y: Scalar, width: Scalar, height: Scalar) -> Self {
        Self::new((x, y), (x + width, y + height))
    }

    /// Smallest bounding box containing all points, `None` if there are no points
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        points.into_iter().fold(None, |bbox, point| match bbox {
            None => Some(BBox::new(point, point)),
            Some(bbox) => Some(bbox.extend(point)),
        })
    }

    #[inline]
    pub fn min(&self) -> Point {
        self.min
    }

    #[inline]
    pub fn max(&self) -> Point {
        self.max
    }

    #[inline]
    pub fn x(&self) -> Scalar {
        self.min.x()
    }

    #[inline]
    pub fn y(&self) -> Scalar {
        self.min.y()
    }

    #[inline]
    pub fn width(&self) -> Scalar {
        self.max.x() - self.min.x()
    }

    #[inline]
    pub fn height(&self) -> Scalar {
        self.max.y() - self.min.y()
    }

    /// Diagonal line from `min` to `max` of the bounding box
    pub fn diag(&self) -> Line {
        Line::new(self.min, self.max)
    }

    /// Diagonal line from `(min.x, max.y)` to `(max.x, min.y)`
    pub fn anti_diag(&self) -> Line {
        Line::new((self.min.x(), self.max.y()), (self.max.x(), self.min.y()))
    }

    /// Corners in counter-clockwise order starting from `min`
    pub fn corners(&self) -> [Point; 4] {
        let Point([x0, y0]) = self.min;
        let Point([x1, y1]) = self.max;
        [
            Point([x0, y0]),
            Point([x1, y0]),
            Point([x1, y1]),
            Point([x0, y1]),
        ]
    }

    /// Extend bounding box so it would contain provided point
    pub fn extend(&self, point: Point) -> Self {
        let Point([x, y]) = point;
        Self {
            min: Point([self.min.x().min(x), self.min.y().min(y)]),
            max: Point([self.max.x().max(x), self.max.y().max(y)]),
        }
    }
}

impl fmt::Debug for BBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BBox x=")?;
        scalar_fmt(f, self.x())?;
        write!(f, ", y=")?;
        scalar_fmt(f, self.y())?;
        write!(f, ", w=")?;
        scalar_fmt(f, self.width())?;
        write!(f, ", h=")?;
        scalar_fmt(f, self.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;

    #[test]
    fn test_point3_ops() {
        let x = Point3::new(1.0, 0.0, 0.0);
        let y = Point3::new(0.0, 1.0, 0.0);
        assert_eq!(x.cross(y), Point3::new(0.0, 0.0, 1.0));
        assert_eq!(y.cross(x), Point3::new(0.0, 0.0, -1.0));
        assert_approx_eq!(Point3::new(3.0, 4.0, 12.0).length(), 13.0);
        assert!(Point3::default().normalize().is_none());
        let n = Point3::new(0.0, 0.0, 5.0).normalize().unwrap();
        assert_eq!(n, Point3::new(0.0, 0.0, 1.0));
        assert_eq!(x.to_homogeneous(), [1.0, 0.0, 0.0, 1.0]);
        let arr: [Scalar; 3] = Point3::from((1.0, 2.0, 3.0)).into();
        assert_eq!(arr, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_line() {
        let line = Line::new((2.0, 0.0), (2.0, 1.0));
        assert!(line.side(Point::new(0.0, 0.0)) > 0.0);
        assert!(line.side(Point::new(4.0, 0.0)) < 0.0);
        assert_approx_eq!(line.side(Point::new(2.0, 7.0)), 0.0);
        assert_approx_eq!(line.distance(Point::new(5.0, 3.0)), 3.0);

        let other = Line::new((0.0, 2.0), (1.0, 2.0));
        let p = line.intersect_point(other).unwrap();
        assert!(p.is_close_to(Point::new(2.0, 2.0), 1e-12));
        assert!(line.intersect_point(Line::new((0.0, 0.0), (0.0, 1.0))).is_none());
    }

    #[test]
    fn test_plane() {
        let plane = Plane::new([0.0, 0.0, 1.0], [0.0, 0.0, 2.0]);
        assert!(plane.side(Point3::new(5.0, 5.0, 3.0)) > 0.0);
        assert!(plane.side(Point3::new(5.0, 5.0, -3.0)) < 0.0);
        let t = plane
            .ray_param(Point3::new(0.0, 0.0, 5.0), Point3::new(1.0, 1.0, -3.0))
            .unwrap();
        assert_approx_eq!(t, 0.5);
        assert!(plane
            .ray_param(Point3::new(0.0, 0.0, 5.0), Point3::new(1.0, 1.0, 5.0))
            .is_none());
    }

    #[test]
    fn test_bbox() {
        let bbox = BBox::from_points([
            Point::new(1.0, 5.0),
            Point::new(-1.0, 2.0),
            Point::new(3.0, 4.0),
        ])
        .unwrap();
        assert_eq!(bbox.min(), Point::new(-1.0, 2.0));
        assert_eq!(bbox.max(), Point::new(3.0, 5.0));
        assert_approx_eq!(bbox.width(), 4.0);
        assert_approx_eq!(bbox.height(), 3.0);
        assert!(BBox::from_points(Vec::new()).is_none());

        let view = BBox::from_view_box(0.0, 0.0, 4.0, 2.0);
        assert_eq!(
            view.corners(),
            [
                Point::new(0.0, 0.0),
                Point::new(4.0, 0.0),
                Point::new(4.0, 2.0),
                Point::new(0.0, 2.0)
            ]
        );
        assert_eq!(view.anti_diag().start(), Point::new(0.0, 2.0));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_point3_serde() -> Result<(), serde_json::Error> {
        let p: Point3 = serde_json::from_str("[1, 2, 3]")?;
        assert_eq!(p, Point3::new(1.0, 2.0, 3.0));
        let p: Point3 = serde_json::from_str(r#"{"z": 500}"#)?;
        assert_eq!(p, Point3::new(0.0, 0.0, 500.0));
        assert_eq!(serde_json::to_string(&Point3::new(1.0, 0.0, 2.5))?, "[1.0,0.0,2.5]");
        Ok(())
    }
}
