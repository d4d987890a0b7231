//! Fill operations and paint helpers for Canvas2dContext.

use super::Canvas2dContext;
use crate::filter::apply_gaussian_blur;
use crate::geometry::RectParams;
use crate::gradient::CanvasGradient;
use crate::style::FillStyle;
use tiny_skia::Transform;

impl Canvas2dContext {
    /// Fill the current path using the non-zero winding rule.
    pub fn fill(&mut self) {
        log::debug!(target: "canvas", "fill");
        // Clone the path builder so we don't consume the current path
        let Some(path) = self.path_builder.clone().finish() else {
            return;
        };

        match self.state.filter.device_sigma(self.transform_scale()) {
            Some(sigma) => self.fill_path_filtered(&path, sigma),
            None => {
                // Path coordinates are already in device space (pre-transformed)
                let _ = self.with_fill_paint(|ctx, paint| {
                    ctx.pixmap.fill_path(
                        &path,
                        paint,
                        tiny_skia::FillRule::Winding,
                        Transform::identity(),
                        None,
                    );
                });
            }
        }
    }

    /// Fill a rectangle.
    pub fn fill_rect(&mut self, params: &RectParams) {
        log::debug!(target: "canvas", "fillRect {} {} {} {}", params.x, params.y, params.width, params.height);
        self.begin_path();
        self.rect(params);
        self.fill();
    }

    // --- Private paint helpers ---

    /// Average axis scale of the current transform.
    pub(crate) fn transform_scale(&self) -> f32 {
        let t = &self.state.transform;
        ((t.sx * t.sx + t.ky * t.ky).sqrt() + (t.kx * t.kx + t.sy * t.sy).sqrt()) / 2.0
    }

    /// Fill `path` through the current filter.
    ///
    /// The path is rendered into a scratch layer covering its bounds plus three
    /// standard deviations, blurred, then composited with the current blend mode.
    /// The layer may extend up to three standard deviations past the canvas so
    /// shapes crossing the edge blur the same as they would on a larger canvas.
    fn fill_path_filtered(&mut self, path: &tiny_skia::Path, sigma: f32) {
        let bounds = path.bounds();
        let pad = (sigma * 3.0).ceil();
        let left = (bounds.left() - pad).floor().max(-pad) as i32;
        let top = (bounds.top() - pad).floor().max(-pad) as i32;
        let right = (bounds.right() + pad).ceil().min(self.width as f32 + pad) as i32;
        let bottom = (bounds.bottom() + pad).ceil().min(self.height as f32 + pad) as i32;
        if right <= left || bottom <= top {
            return;
        }

        let Some(mut layer) = tiny_skia::Pixmap::new((right - left) as u32, (bottom - top) as u32)
        else {
            return;
        };
        let layer_transform = Transform::from_translate(-left as f32, -top as f32);
        let blend_mode = self.state.global_composite_operation;

        let painted = self.with_fill_paint(|_, paint| {
            let mut layer_paint = paint.clone();
            layer_paint.blend_mode = tiny_skia::BlendMode::SourceOver;
            layer.fill_path(
                path,
                &layer_paint,
                tiny_skia::FillRule::Winding,
                layer_transform,
                None,
            );
        });
        if painted.is_none() {
            return;
        }

        apply_gaussian_blur(&mut layer, sigma);

        let composite = tiny_skia::PixmapPaint {
            opacity: 1.0,
            blend_mode,
            quality: tiny_skia::FilterQuality::Nearest,
        };
        self.pixmap.draw_pixmap(
            left,
            top,
            layer.as_ref(),
            &composite,
            Transform::identity(),
            None,
        );
    }

    pub(crate) fn with_fill_paint<R>(
        &mut self,
        draw: impl for<'a> FnOnce(&mut Self, &tiny_skia::Paint<'a>) -> R,
    ) -> Option<R> {
        let mut paint = tiny_skia::Paint {
            anti_alias: true,
            blend_mode: self.state.global_composite_operation,
            ..Default::default()
        };

        match self.state.fill_style.clone() {
            FillStyle::Color(mut color) => {
                if self.state.global_alpha < 1.0 {
                    color.set_alpha((color.alpha() * self.state.global_alpha).clamp(0.0, 1.0));
                }
                paint.set_color(color);
                Some(draw(self, &paint))
            }
            FillStyle::LinearGradient(gradient) => {
                paint.shader = self.create_gradient_shader(&gradient)?;
                Some(draw(self, &paint))
            }
        }
    }

    pub(crate) fn create_gradient_shader(
        &self,
        gradient: &CanvasGradient,
    ) -> Option<tiny_skia::Shader<'static>> {
        if gradient.stops.is_empty() {
            return None;
        }

        let stops: Vec<tiny_skia::GradientStop> = gradient
            .stops
            .iter()
            .map(|stop| {
                let mut color: tiny_skia::Color = stop.color.into();
                if self.state.global_alpha < 1.0 {
                    color.set_alpha((color.alpha() * self.state.global_alpha).clamp(0.0, 1.0));
                }
                tiny_skia::GradientStop::new(stop.offset as f32, color)
            })
            .collect();

        tiny_skia::LinearGradient::new(
            tiny_skia::Point {
                x: gradient.x0,
                y: gradient.y0,
            },
            tiny_skia::Point {
                x: gradient.x1,
                y: gradient.y1,
            },
            stops,
            tiny_skia::SpreadMode::Pad,
            self.state.transform,
        )
    }
}
