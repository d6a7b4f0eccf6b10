//! Elliptical arcs and their perspective projection
use crate::{EPSILON, Ellipse, Line, PI, Perspective, Point, ProjectionError, Scalar};
use std::fmt;

/// Arc in SVG endpoint parameterization, starting at the current point
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvgArc {
    /// Radii `rx` and `ry`
    pub radii: Point,
    /// Rotation of the `x` radius in degrees
    #[cfg_attr(feature = "serde", serde(default))]
    pub x_axis_rot: Scalar,
    #[cfg_attr(feature = "serde", serde(default))]
    pub large: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub sweep: bool,
    /// End point of the arc
    pub dst: Point,
}

impl SvgArc {
    pub fn new(
        radii: impl Into<Point>,
        x_axis_rot: Scalar,
        large: bool,
        sweep: bool,
        dst: impl Into<Point>,
    ) -> Self {
        Self {
            radii: radii.into(),
            x_axis_rot,
            large,
            sweep,
            dst: dst.into(),
        }
    }
}

/// Elliptical Arc
#[derive(Clone, Copy, PartialEq)]
pub struct EllipArc {
    /// center of the ellipse
    center: Point,
    /// radius along x-axis before the rotation
    rx: Scalar,
    /// radius along y-axis before the rotation
    ry: Scalar,
    /// rotation
    phi: Scalar,
    /// angular start
    eta: Scalar,
    /// angular size
    eta_delta: Scalar,
}

impl fmt::Debug for EllipArc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Arc center:{:?} radius:{:?} phi:{:.3?} eta:{:.3?} eta_delta:{:.3?}",
            self.center,
            Point([self.rx, self.ry]),
            self.phi,
            self.eta,
            self.eta_delta
        )
    }
}

impl EllipArc {
    /// Arc of the ellipse from parametric angle `eta` spanning `eta_delta`
    pub fn new(ellipse: &Ellipse, eta: Scalar, eta_delta: Scalar) -> Self {
        Self {
            center: ellipse.center(),
            rx: ellipse.rx,
            ry: ellipse.ry,
            phi: ellipse.theta,
            eta,
            eta_delta,
        }
    }

    /// Convert arc from SVG arguments to center parameterization
    ///
    /// Follows the arc implementation notes of the SVG specification
    /// (Arc to Parametric)[https://www.w3.org/TR/SVG/implnote.html#ArcImplementationNotes]
    /// including the correction of radii too small to span the chord.
    /// Returns `None` if one of the radii is zero or the end points coincide.
    pub fn from_endpoint(src: Point, arc: &SvgArc) -> Option<Self> {
        let Point([rx, ry]) = arc.radii;
        let rx = rx.abs();
        let ry = ry.abs();
        if rx < EPSILON || ry < EPSILON || src.is_close_to(arc.dst, EPSILON) {
            return None;
        }
        let phi = arc.x_axis_rot.to_radians();
        let dst = arc.dst;

        // Eq 5.1
        let Point([x1, y1]) = (0.5 * (src - dst)).rotate(-phi);
        // scale/normalize radii
        let s = (x1 / rx).powi(2) + (y1 / ry).powi(2);
        let (rx, ry) = if s > 1.0 {
            let s = s.sqrt();
            (rx * s, ry * s)
        } else {
            (rx, ry)
        };
        // Eq 5.2
        let sq = ((rx * ry).powi(2) / ((rx * y1).powi(2) + (ry * x1).powi(2)) - 1.0)
            .max(0.0)
            .sqrt();
        let sq = if arc.large == arc.sweep { -sq } else { sq };
        let center = sq * Point([rx * y1 / ry, -ry * x1 / rx]);
        let Point([cx, cy]) = center;
        // Eq 5.3 convert center to initial coordinates
        let center = center.rotate(phi) + 0.5 * (dst + src);
        // Eq 5.5-6
        let v0 = Point([1.0, 0.0]);
        let v1 = Point([(x1 - cx) / rx, (y1 - cy) / ry]);
        let v2 = Point([(-x1 - cx) / rx, (-y1 - cy) / ry]);
        // initial angle
        let eta = v0.angle_between(v1)?;
        // delta angle to be covered when t changes from 0..1
        let eta_delta = v1.angle_between(v2)?.rem_euclid(2.0 * PI);
        let eta_delta = if !arc.sweep && eta_delta > 0.0 {
            eta_delta - 2.0 * PI
        } else if arc.sweep && eta_delta < 0.0 {
            eta_delta + 2.0 * PI
        } else {
            eta_delta
        };

        Some(Self {
            center,
            rx,
            ry,
            phi,
            eta,
            eta_delta,
        })
    }

    /// Convert arc back to SVG arguments, `src` being [`EllipArc::start`]
    pub fn to_endpoint(&self) -> SvgArc {
        SvgArc {
            radii: Point([self.rx, self.ry]),
            x_axis_rot: self.phi.to_degrees(),
            large: self.eta_delta.abs() > PI,
            sweep: self.eta_delta > 0.0,
            dst: self.end(),
        }
    }

    /// Full ellipse this arc belongs to
    pub fn ellipse(&self) -> Ellipse {
        Ellipse {
            cx: self.center.x(),
            cy: self.center.y(),
            rx: self.rx,
            ry: self.ry,
            theta: self.phi,
        }
    }

    pub fn eta(&self) -> Scalar {
        self.eta
    }

    pub fn eta_delta(&self) -> Scalar {
        self.eta_delta
    }

    pub fn at(&self, t: Scalar) -> Point {
        let (angle_sin, angle_cos) = (self.eta + t * self.eta_delta).sin_cos();
        let point = Point([self.rx * angle_cos, self.ry * angle_sin]);
        point.rotate(self.phi) + self.center
    }

    pub fn start(&self) -> Point {
        self.at(0.0)
    }

    pub fn end(&self) -> Point {
        self.at(1.0)
    }

    pub fn reverse(&self) -> Self {
        Self {
            center: self.center,
            rx: self.rx,
            ry: self.ry,
            phi: self.phi,
            eta: self.eta + self.eta_delta,
            eta_delta: -self.eta_delta,
        }
    }
}

/// Projected arc, or a line when the arc is degenerate or seen edge-on
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArcProjection {
    Line(Line),
    Arc { src: Point, arc: SvgArc },
}

/// Project an SVG arc starting at `src` of the local `XY` plane
///
/// The ellipse of the arc is projected with [`Perspective::ellipse`]. The
/// projected end points are expressed as parametric angles of the fitted
/// ellipse and the sweep is picked so that the new arc passes through the
/// projected middle of the original one.
pub fn arc_with_perspective(
    src: Point,
    arc: &SvgArc,
    perspective: &Perspective,
) -> Result<ArcProjection, ProjectionError> {
    let src_proj = perspective.project_point(src)?;
    let dst_proj = perspective.project_point(arc.dst)?;
    let Some(param) = EllipArc::from_endpoint(src, arc) else {
        return Ok(ArcProjection::Line(Line::new(src_proj, dst_proj)));
    };

    let projected = perspective.ellipse(&param.ellipse())?;
    if projected.segment.is_degenerate() || !projected.ellipse.is_finite() {
        tracing::debug!(
            error = projected.segment.error,
            "[arc] edge-on, using line"
        );
        return Ok(ArcProjection::Line(Line::new(src_proj, dst_proj)));
    }
    // keep `rx` on the image of the source `x` radius
    let axis_proj = perspective
        .project_point(param.center + Point([param.rx, 0.0]).rotate(param.phi))?
        - perspective.project_point(param.center)?;
    let fitted = align_axes(projected.ellipse, axis_proj.y().atan2(axis_proj.x()));
    let mid_proj = perspective.project_point(param.at(0.5))?;

    let start = fitted.angle_of(src_proj);
    let end = (fitted.angle_of(dst_proj) - start).rem_euclid(2.0 * PI);
    let mid = (fitted.angle_of(mid_proj) - start).rem_euclid(2.0 * PI);
    let eta_delta = if mid <= end { end } else { end - 2.0 * PI };

    let svg_arc = SvgArc {
        dst: dst_proj,
        ..EllipArc::new(&fitted, start, eta_delta).to_endpoint()
    };
    Ok(ArcProjection::Arc {
        src: src_proj,
        arc: svg_arc,
    })
}

/// Swap radii of the ellipse if its `y` radius is closer to `direction`
fn align_axes(ellipse: Ellipse, direction: Scalar) -> Ellipse {
    let diff = (direction - ellipse.theta).rem_euclid(PI);
    if diff.min(PI - diff) <= PI / 4.0 {
        return ellipse;
    }
    let theta = ellipse.theta + PI / 2.0;
    Ellipse {
        rx: ellipse.ry,
        ry: ellipse.rx,
        theta: if theta > PI / 2.0 { theta - PI } else { theta },
        ..ellipse
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Axis, Matrix, TransformStep, assert_approx_eq};

    #[test]
    fn test_from_endpoint() {
        let src = Point::new(14.0, 5.0);
        let dst = Point::new(10.0, 7.0);

        let arc = EllipArc::from_endpoint(src, &SvgArc::new((4.0, 2.0), 0.0, false, true, dst))
            .unwrap();
        assert!(arc.ellipse().center().is_close_to(Point::new(10.0, 5.0), 1e-9));
        assert_approx_eq!(arc.eta(), 0.0, 1e-9);
        assert_approx_eq!(arc.eta_delta(), PI / 2.0, 1e-9);
        assert!(arc.start().is_close_to(src, 1e-9));
        assert!(arc.end().is_close_to(dst, 1e-9));

        // same end points, the other center
        let arc = EllipArc::from_endpoint(src, &SvgArc::new((4.0, 2.0), 0.0, false, false, dst))
            .unwrap();
        assert!(arc.ellipse().center().is_close_to(Point::new(14.0, 7.0), 1e-9));
        assert_approx_eq!(arc.eta_delta(), -PI / 2.0, 1e-9);

        let reversed = arc.reverse();
        assert!(reversed.start().is_close_to(dst, 1e-9));
        assert!(reversed.end().is_close_to(src, 1e-9));
    }

    #[test]
    fn test_from_endpoint_small_radii() {
        // radii are scaled up to span the chord
        let arc = EllipArc::from_endpoint(
            Point::new(0.0, 0.0),
            &SvgArc::new((1.0, 1.0), 0.0, false, true, (4.0, 0.0)),
        )
        .unwrap();
        let ellipse = arc.ellipse();
        assert_approx_eq!(ellipse.rx, 2.0, 1e-9);
        assert_approx_eq!(ellipse.ry, 2.0, 1e-9);
        assert!(ellipse.center().is_close_to(Point::new(2.0, 0.0), 1e-9));
        assert_approx_eq!(arc.eta_delta().abs(), PI, 1e-9);
    }

    #[test]
    fn test_from_endpoint_degenerate() {
        let src = Point::new(1.0, 1.0);
        assert!(EllipArc::from_endpoint(src, &SvgArc::new((0.0, 2.0), 0.0, false, true, (3.0, 3.0))).is_none());
        assert!(EllipArc::from_endpoint(src, &SvgArc::new((2.0, 2.0), 0.0, false, true, src)).is_none());
    }

    #[test]
    fn test_to_endpoint() {
        let src = Point::new(-3.0, 2.0);
        for (large, sweep) in [(false, false), (false, true), (true, false), (true, true)] {
            let svg_arc = SvgArc::new((5.0, 3.0), 25.0, large, sweep, (1.0, -1.0));
            let arc = EllipArc::from_endpoint(src, &svg_arc).unwrap();
            assert!(arc.start().is_close_to(src, 1e-9));
            let result = arc.to_endpoint();
            assert_eq!(result.large, large);
            assert_eq!(result.sweep, sweep);
            assert_approx_eq!(result.x_axis_rot, 25.0, 1e-9);
            assert!(result.radii.is_close_to(svg_arc.radii, 1e-9));
            assert!(result.dst.is_close_to(svg_arc.dst, 1e-9));
        }
    }

    #[test]
    fn test_arc_identity() -> Result<(), ProjectionError> {
        let perspective = Perspective::identity([0.0, 0.0, 100.0]);
        let src = Point::new(14.0, 5.0);
        let dst = Point::new(10.0, 7.0);
        for sweep in [true, false] {
            let svg_arc = SvgArc::new((4.0, 2.0), 0.0, false, sweep, dst);
            let ArcProjection::Arc { src: result_src, arc } =
                arc_with_perspective(src, &svg_arc, &perspective)?
            else {
                panic!("arc expected");
            };
            assert!(result_src.is_close_to(src, 1e-12));
            assert!(arc.dst.is_close_to(dst, 1e-12));
            assert_approx_eq!(arc.radii.x(), 4.0, 1e-6);
            assert_approx_eq!(arc.radii.y(), 2.0, 1e-6);
            assert_approx_eq!(arc.x_axis_rot, 0.0, 1e-6);
            assert!(!arc.large);
            assert_eq!(arc.sweep, sweep);
        }

        // rotated large arc
        let svg_arc = SvgArc::new((3.0, 1.0), 30.0, true, true, (4.0, 4.0));
        let src = Point::new(2.0, 1.0);
        let ArcProjection::Arc { arc, .. } = arc_with_perspective(src, &svg_arc, &perspective)?
        else {
            panic!("arc expected");
        };
        let expected = EllipArc::from_endpoint(src, &svg_arc).unwrap().ellipse();
        assert_approx_eq!(arc.radii.x(), expected.rx, 1e-6);
        assert_approx_eq!(arc.radii.y(), expected.ry, 1e-6);
        assert_approx_eq!(arc.x_axis_rot, 30.0, 1e-6);
        assert!(arc.large);
        assert!(arc.sweep);
        Ok(())
    }

    #[test]
    fn test_arc_identity_tall() -> Result<(), ProjectionError> {
        // `y` radius is the major one, radii keep their labels
        let perspective = Perspective::identity([0.0, 0.0, 100.0]);
        let src = Point::new(0.0, 0.0);
        let svg_arc = SvgArc::new((2.0, 4.0), 0.0, false, true, (2.0, 4.0));
        let ArcProjection::Arc { arc, .. } = arc_with_perspective(src, &svg_arc, &perspective)?
        else {
            panic!("arc expected");
        };
        assert_approx_eq!(arc.radii.x(), 2.0, 1e-6);
        assert_approx_eq!(arc.radii.y(), 4.0, 1e-6);
        assert_approx_eq!(arc.x_axis_rot, 0.0, 1e-6);
        assert!(!arc.large);
        assert!(arc.sweep);
        assert!(arc.dst.is_close_to(svg_arc.dst, 1e-12));

        let svg_arc = SvgArc::new((1.0, 3.0), 20.0, true, false, (1.0, 2.0));
        let ArcProjection::Arc { arc, .. } = arc_with_perspective(src, &svg_arc, &perspective)?
        else {
            panic!("arc expected");
        };
        let expected = EllipArc::from_endpoint(src, &svg_arc).unwrap().ellipse();
        assert_approx_eq!(arc.radii.x(), expected.rx, 1e-6);
        assert_approx_eq!(arc.radii.y(), expected.ry, 1e-6);
        assert_approx_eq!(arc.x_axis_rot, 20.0, 1e-6);
        assert!(arc.large);
        assert!(!arc.sweep);
        Ok(())
    }

    #[test]
    fn test_align_axes() {
        let ellipse = Ellipse::new(1.0, 2.0, 4.0, 2.0).with_rotation(PI / 2.0);
        assert_eq!(align_axes(ellipse, 1.4), ellipse);
        assert_eq!(align_axes(ellipse, -1.4), ellipse);
        let result = align_axes(ellipse, 0.1);
        assert_approx_eq!(result.rx, 2.0);
        assert_approx_eq!(result.ry, 4.0);
        assert_approx_eq!(result.theta, 0.0, 1e-12);
        assert_eq!(result.center(), ellipse.center());
    }

    #[test]
    fn test_arc_perspective() -> Result<(), ProjectionError> {
        let transform = Matrix::from_steps(&[
            TransformStep::translate([0.0, 0.0, -50.0]),
            TransformStep::rotate(Axis::Y, 0.7),
        ])?;
        let perspective = Perspective::new([0.0, 0.0, 200.0], transform);
        let src = Point::new(10.0, 0.0);
        let svg_arc = SvgArc::new((10.0, 10.0), 0.0, false, true, (0.0, 10.0));
        let ArcProjection::Arc { src: result_src, arc } =
            arc_with_perspective(src, &svg_arc, &perspective)?
        else {
            panic!("arc expected");
        };
        // the projected arc passes through the projected middle point
        let param = EllipArc::from_endpoint(result_src, &arc).unwrap();
        let mid = perspective.project_point(src.rotate(PI / 4.0))?;
        let ellipse = param.ellipse();
        let unit = ellipse.to_unit(mid);
        assert_approx_eq!(unit.length(), 1.0, 1e-6);
        let start = ellipse.angle_of(result_src);
        let offset = (ellipse.angle_of(mid) - start).rem_euclid(2.0 * PI);
        let sweep = param.eta_delta().rem_euclid(2.0 * PI);
        assert!(offset < sweep, "{} >= {}", offset, sweep);
        Ok(())
    }

    #[test]
    fn test_arc_degenerate() -> Result<(), ProjectionError> {
        let perspective = Perspective::identity([0.0, 0.0, 10.0]);
        let result = arc_with_perspective(
            Point::new(0.0, 0.0),
            &SvgArc::new((0.0, 0.0), 0.0, false, false, (3.0, 4.0)),
            &perspective,
        )?;
        assert_eq!(result, ArcProjection::Line(Line::new((0.0, 0.0), (3.0, 4.0))));

        // plane seen edge-on
        let transform = Matrix::from_steps(&[TransformStep::rotate(Axis::X, PI / 2.0)])?;
        let perspective = Perspective::new([0.0, 0.0, 10.0], transform);
        let src = Point::new(2.0, 0.0);
        let result = arc_with_perspective(
            src,
            &SvgArc::new((2.0, 1.0), 0.0, false, true, (-2.0, 0.0)),
            &perspective,
        )?;
        let ArcProjection::Line(line) = result else {
            panic!("line expected");
        };
        assert!(line.start().is_close_to(perspective.project_point(src)?, 1e-12));
        assert_approx_eq!(line.length(), 4.0, 1e-9);
        Ok(())
    }
}
