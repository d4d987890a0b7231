//! Path building operations for Canvas2dContext.

use super::Canvas2dContext;
use crate::geometry::{ArcParams, RectParams};
use tiny_skia::{PathSegment, Transform};

impl Canvas2dContext {
    /// Begin a new path.
    pub fn begin_path(&mut self) {
        log::debug!(target: "canvas", "beginPath");
        self.path_builder = tiny_skia::PathBuilder::new();
        self.has_current_point = false;
    }

    /// Transform a point by the current transformation matrix.
    /// Path coordinates are transformed when they are added to the path.
    pub(crate) fn transform_point(&self, x: f32, y: f32) -> (f32, f32) {
        Self::map_point_with_transform(&self.state.transform, x, y)
    }

    pub(crate) fn map_point_with_transform(transform: &Transform, x: f32, y: f32) -> (f32, f32) {
        (
            transform.sx * x + transform.kx * y + transform.tx,
            transform.ky * x + transform.sy * y + transform.ty,
        )
    }

    /// Append all segments from a user-space path to the current path builder,
    /// transforming each point by the given transform.
    ///
    /// With `connect_first_move`, the first move becomes a line from the
    /// current point, as `arc()` requires.
    pub(crate) fn append_transformed_path(
        &mut self,
        path: &tiny_skia::Path,
        transform: Transform,
        connect_first_move: bool,
    ) {
        let mut saw_first_move = false;

        for segment in path.segments() {
            match segment {
                PathSegment::MoveTo(p) => {
                    let (x, y) = Self::map_point_with_transform(&transform, p.x, p.y);
                    if !saw_first_move && connect_first_move && self.has_current_point {
                        self.path_builder.line_to(x, y);
                    } else {
                        self.path_builder.move_to(x, y);
                    }
                    saw_first_move = true;
                    self.has_current_point = true;
                }
                PathSegment::LineTo(p) => {
                    let (x, y) = Self::map_point_with_transform(&transform, p.x, p.y);
                    self.path_builder.line_to(x, y);
                }
                PathSegment::QuadTo(ctrl, p) => {
                    let (cx, cy) = Self::map_point_with_transform(&transform, ctrl.x, ctrl.y);
                    let (x, y) = Self::map_point_with_transform(&transform, p.x, p.y);
                    self.path_builder.quad_to(cx, cy, x, y);
                }
                PathSegment::CubicTo(ctrl1, ctrl2, p) => {
                    let (c1x, c1y) = Self::map_point_with_transform(&transform, ctrl1.x, ctrl1.y);
                    let (c2x, c2y) = Self::map_point_with_transform(&transform, ctrl2.x, ctrl2.y);
                    let (x, y) = Self::map_point_with_transform(&transform, p.x, p.y);
                    self.path_builder.cubic_to(c1x, c1y, c2x, c2y, x, y);
                }
                PathSegment::Close => {
                    self.path_builder.close();
                }
            }
        }
    }

    /// Close the current subpath.
    pub fn close_path(&mut self) {
        log::debug!(target: "canvas", "closePath");
        self.path_builder.close();
    }

    /// Add a rectangle to the path.
    pub fn rect(&mut self, params: &RectParams) {
        log::debug!(target: "canvas", "rect {} {} {} {}", params.x, params.y, params.width, params.height);
        let (x0, y0) = self.transform_point(params.x, params.y);
        let (x1, y1) = self.transform_point(params.x + params.width, params.y);
        let (x2, y2) = self.transform_point(params.x + params.width, params.y + params.height);
        let (x3, y3) = self.transform_point(params.x, params.y + params.height);

        self.path_builder.move_to(x0, y0);
        self.path_builder.line_to(x1, y1);
        self.path_builder.line_to(x2, y2);
        self.path_builder.line_to(x3, y3);
        self.path_builder.close();

        self.has_current_point = true;
    }

    /// Add an arc to the path.
    pub fn arc(&mut self, params: &ArcParams) {
        log::debug!(target: "canvas", "arc {:?}", params);
        let mut arc_builder = tiny_skia::PathBuilder::new();
        crate::arc::arc(&mut arc_builder, params);

        if let Some(path) = arc_builder.finish() {
            self.append_transformed_path(&path, self.state.transform, true);
        }
    }
}
