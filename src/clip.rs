//! Clipping of a projected surface by a plane in 3D
//!
//! A [`Perspective`] may carry a clip plane. The part of the transformed
//! surface hidden behind that plane (as seen from the eye) is removed by
//! intersecting the view box with the visible half-plane in projected
//! coordinates.
use crate::{
    BBox, Line, Line3, PARALLEL_EPSILON, Perspective, Plane, Point, Point3, ProjectionError,
    Scalar,
};

/// Intersection line of two planes, `None` if planes are parallel
///
/// The point on the line is found by fixing the coordinate along the largest
/// component of the direction to zero and solving the remaining 2x2 system,
/// whose determinant is exactly that component.
pub fn intersect_planes(p1: &Plane, p2: &Plane) -> Option<Line3> {
    let dir = p1.normal.cross(p2.normal);
    if dir.length() < PARALLEL_EPSILON {
        return None;
    }
    let Point3(n1) = p1.normal;
    let Point3(n2) = p2.normal;
    let d1 = p1.normal.dot(p1.point);
    let d2 = p2.normal.dot(p2.point);

    let Point3(components) = dir;
    let k = (0..3)
        .max_by(|a, b| components[*a].abs().total_cmp(&components[*b].abs()))
        .unwrap_or(2);
    let (i, j) = ((k + 1) % 3, (k + 2) % 3);
    let det = components[k];

    let mut point = [0.0; 3];
    point[i] = (d1 * n2[j] - d2 * n1[j]) / det;
    point[j] = (n1[i] * d2 - n2[i] * d1) / det;
    Some(Line3 {
        point: Point3(point),
        direction: dir.normalize()?,
    })
}

/// Intersection point of two infinite 2D lines, `None` if they are parallel
pub fn intersect_lines(a: Line, b: Line) -> Option<Point> {
    a.intersect_point(b)
}

/// Simple polygon in projected coordinates
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polygon(Vec<Point>);

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Flat `[x0, y0, x1, y1, ...]` view of the vertices
    pub fn as_scalars(&self) -> &[Scalar] {
        bytemuck::cast_slice(&self.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Point>> for Polygon {
    fn from(points: Vec<Point>) -> Self {
        Self(points)
    }
}

/// Keep the part of the polygon on the `side` of the line through `p0` and `p1`
///
/// Positive `side` keeps points to the left of `p0 -> p1`. Vertices lying on
/// the line are kept. The result is ordered counter-clockwise around its
/// centroid.
pub fn clip_polygon_to_line(p0: Point, p1: Point, side: Scalar, polygon: &[Point]) -> Polygon {
    let line = Line::new(p0, p1);
    let mut result = Vec::with_capacity(polygon.len() + 2);
    for (index, current) in polygon.iter().enumerate() {
        let next = polygon[(index + 1) % polygon.len()];
        let current_side = line.side(*current) * side;
        let next_side = line.side(next) * side;
        if current_side >= 0.0 {
            result.push(*current);
        }
        if current_side * next_side < 0.0 {
            if let Some(point) = intersect_lines(Line::new(*current, next), line) {
                result.push(point);
            }
        }
    }
    if result.is_empty() {
        return Polygon::default();
    }

    let centroid = result.iter().fold(Point::default(), |acc, p| acc + *p) / result.len() as Scalar;
    let angle = |point: &Point| {
        let Point([x, y]) = *point - centroid;
        y.atan2(x)
    };
    result.sort_by(|a, b| angle(a).total_cmp(&angle(b)));
    Polygon(result)
}

/// Visible half of the projected surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HalfPlane {
    /// Projected intersection of the surface with the clip plane,
    /// `None` if the planes are parallel
    pub line: Option<Line>,
    /// Side of `line` that is visible (see [`Line::side`]). Without a line
    /// `+1` means the whole surface is visible and `-1` that it is hidden.
    pub side: Scalar,
}

impl HalfPlane {
    pub fn is_fully_visible(&self) -> bool {
        self.line.is_none() && self.side > 0.0
    }

    pub fn is_fully_clipped(&self) -> bool {
        self.line.is_none() && self.side < 0.0
    }
}

/// Whether `plane` lies strictly between `eye` and `target`
fn separates(plane: &Plane, eye: Point3, target: Point3) -> bool {
    plane
        .ray_param(eye, target)
        .is_some_and(|t| t > 0.0 && t < 1.0)
}

/// Find the visible half-plane of the projected surface
///
/// Returns `None` if the perspective has no clip plane.
pub fn half_plane_in_xy(perspective: &Perspective) -> Result<Option<HalfPlane>, ProjectionError> {
    let Some(clip) = perspective.clip else {
        return Ok(None);
    };
    let surface = perspective.surface()?;
    let eye = perspective.eye;

    let Some(line) = intersect_planes(&surface, &clip) else {
        let side = if separates(&clip, eye, surface.point) {
            -1.0
        } else {
            1.0
        };
        tracing::debug!(side, "[clip] clip plane is parallel to the surface");
        return Ok(Some(HalfPlane { line: None, side }));
    };

    // reference point on the surface, on the positive side of the clip plane
    let inward = surface.normal.cross(line.direction);
    let inward = if inward.dot(clip.normal) < 0.0 {
        -inward
    } else {
        inward
    };
    let reference = line.point + inward;

    let line_2d = Line::new(
        perspective.project_point3(line.point),
        perspective.project_point3(line.at(1.0)),
    );
    let side = line_2d
        .side(perspective.project_point3(reference))
        .signum();
    let side = if separates(&clip, eye, reference) {
        -side
    } else {
        side
    };
    Ok(Some(HalfPlane {
        line: Some(line_2d),
        side,
    }))
}

/// Part of the view box where the surface is visible
///
/// `None` means no clipping is required, an empty polygon means the surface
/// is hidden entirely.
pub fn clip_viewport_polygon(
    view_box: &BBox,
    perspective: &Perspective,
) -> Result<Option<Polygon>, ProjectionError> {
    let Some(half_plane) = half_plane_in_xy(perspective)? else {
        return Ok(None);
    };
    Ok(match half_plane.line {
        Some(line) => Some(clip_polygon_to_line(
            line.start(),
            line.end(),
            half_plane.side,
            &view_box.corners(),
        )),
        None if half_plane.is_fully_visible() => None,
        None => Some(Polygon::default()),
    })
}
