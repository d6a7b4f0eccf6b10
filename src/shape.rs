//! Tree of planar shapes rendered into projected primitives
//!
//! [`Shape::render`] walks the tree passing an immutable [`RenderContext`]
//! down by reference. A perspective node replaces the context for its
//! subtree, so the nearest enclosing perspective wins.
use crate::{
    ArcProjection, BBox, Ellipse, Line, Perspective, Point, Polygon, ProjectionError, Projected,
    Scalar, SvgArc, arc_with_perspective, clip_viewport_polygon,
};
use std::{fmt, sync::Arc};

/// Path command in the local coordinates of the shape
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCmd {
    MoveTo(Point),
    LineTo(Point),
    ArcTo(SvgArc),
    Close,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeInner {
    Circle {
        cx: Scalar,
        cy: Scalar,
        r: Scalar,
    },
    Ellipse(Ellipse),
    Path(Vec<PathCmd>),
    Group(Vec<Shape>),
    Perspective {
        perspective: Perspective,
        child: Shape,
    },
}

/// Immutable shape tree node
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Clone, PartialEq)]
pub struct Shape {
    inner: Arc<ShapeInner>,
}

impl AsRef<ShapeInner> for Shape {
    fn as_ref(&self) -> &ShapeInner {
        self.inner.as_ref()
    }
}

impl From<ShapeInner> for Shape {
    fn from(inner: ShapeInner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

/// Projected primitive produced by [`Shape::render`]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Ellipse(Ellipse),
    Line(Line),
    Path(Vec<PathCmd>),
}

/// State inherited by a shape from its ancestors
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderContext<'a> {
    perspective: Option<&'a Perspective>,
}

impl<'a> RenderContext<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_perspective(self, perspective: &'a Perspective) -> Self {
        Self {
            perspective: Some(perspective),
        }
    }

    pub fn perspective(&self) -> Option<&'a Perspective> {
        self.perspective
    }

    /// Project point of the local plane, identity without perspective
    pub fn project(&self, point: Point) -> Result<Point, ProjectionError> {
        match self.perspective {
            Some(perspective) => perspective.project_point(point),
            None => Ok(point),
        }
    }

    /// Visible part of the view box, see [`clip_viewport_polygon`]
    pub fn clip_path(&self, view_box: &BBox) -> Result<Option<Polygon>, ProjectionError> {
        match self.perspective {
            Some(perspective) => clip_viewport_polygon(view_box, perspective),
            None => Ok(None),
        }
    }
}

impl Shape {
    pub fn circle(cx: Scalar, cy: Scalar, r: Scalar) -> Self {
        ShapeInner::Circle { cx, cy, r }.into()
    }

    pub fn ellipse(ellipse: Ellipse) -> Self {
        ShapeInner::Ellipse(ellipse).into()
    }

    pub fn path(commands: Vec<PathCmd>) -> Self {
        ShapeInner::Path(commands).into()
    }

    pub fn group(children: Vec<Shape>) -> Self {
        match children.as_slice() {
            [child] => child.clone(),
            _ => ShapeInner::Group(children).into(),
        }
    }

    /// Place this shape in 3D with the given perspective
    pub fn perspective(&self, perspective: Perspective) -> Self {
        ShapeInner::Perspective {
            perspective,
            child: self.clone(),
        }
        .into()
    }

    /// Load shape tree from JSON
    #[cfg(feature = "serde")]
    pub fn from_json(reader: impl std::io::Read) -> Result<Self, ProjectionError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Render shape tree into projected primitives
    pub fn render(&self, ctx: &RenderContext<'_>) -> Result<Vec<Primitive>, ProjectionError> {
        let mut primitives = Vec::new();
        self.render_rec(ctx, &mut primitives)?;
        Ok(primitives)
    }

    fn render_rec(
        &self,
        ctx: &RenderContext<'_>,
        primitives: &mut Vec<Primitive>,
    ) -> Result<(), ProjectionError> {
        match self.as_ref() {
            ShapeInner::Circle { cx, cy, r } => {
                primitives.push(render_ellipse(ctx, &Ellipse::circle(*cx, *cy, *r))?);
            }
            ShapeInner::Ellipse(ellipse) => primitives.push(render_ellipse(ctx, ellipse)?),
            ShapeInner::Path(commands) => {
                primitives.push(Primitive::Path(render_path(ctx, commands)?))
            }
            ShapeInner::Group(children) => {
                for child in children {
                    child.render_rec(ctx, primitives)?;
                }
            }
            ShapeInner::Perspective { perspective, child } => {
                let ctx = ctx.with_perspective(perspective);
                child.render_rec(&ctx, primitives)?;
            }
        }
        Ok(())
    }
}

fn render_ellipse(ctx: &RenderContext<'_>, ellipse: &Ellipse) -> Result<Primitive, ProjectionError> {
    let Some(perspective) = ctx.perspective() else {
        return Ok(Primitive::Ellipse(*ellipse));
    };
    Ok(match perspective.ellipse(ellipse)?.shape() {
        Projected::Ellipse(ellipse) => Primitive::Ellipse(ellipse),
        Projected::Line(line) => Primitive::Line(line),
    })
}

fn render_path(
    ctx: &RenderContext<'_>,
    commands: &[PathCmd],
) -> Result<Vec<PathCmd>, ProjectionError> {
    let mut result = Vec::with_capacity(commands.len());
    // current point and start of the sub-path in local coordinates
    let mut current = Point::default();
    let mut start = Point::default();
    for cmd in commands {
        match *cmd {
            PathCmd::MoveTo(point) => {
                current = point;
                start = point;
                result.push(PathCmd::MoveTo(ctx.project(point)?));
            }
            PathCmd::LineTo(point) => {
                current = point;
                result.push(PathCmd::LineTo(ctx.project(point)?));
            }
            PathCmd::ArcTo(arc) => {
                let projected = match ctx.perspective() {
                    None => PathCmd::ArcTo(arc),
                    Some(perspective) => match arc_with_perspective(current, &arc, perspective)? {
                        ArcProjection::Line(line) => PathCmd::LineTo(line.end()),
                        ArcProjection::Arc { arc, .. } => PathCmd::ArcTo(arc),
                    },
                };
                current = arc.dst;
                result.push(projected);
            }
            PathCmd::Close => {
                current = start;
                result.push(PathCmd::Close);
            }
        }
    }
    Ok(result)
}
