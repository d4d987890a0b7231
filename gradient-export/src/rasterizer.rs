//! DOM-to-canvas rasterization capability.
//!
//! Snapshot export of general elements depends on an external renderer. It is
//! injected through [`SnapshotRasterizer`] so it can be swapped or stubbed
//! without touching parametric export.

use crate::dom::{Bounds, Element};
use crate::error::ExportResult;
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use gradient_canvas2d::{Canvas2dContext, RectParams};
use tiny_skia::Pixmap;

/// Options passed to a rasterizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterizeOptions {
    /// Device pixels per CSS pixel.
    pub scale: f32,
    /// Request cross-origin resources with CORS.
    pub use_cors: bool,
    /// Keep going when a cross-origin resource taints the canvas.
    pub allow_taint: bool,
}

impl RasterizeOptions {
    /// Cross-origin tolerant options at the given scale.
    pub fn tolerant(scale: f32) -> Self {
        Self {
            scale,
            use_cors: true,
            allow_taint: true,
        }
    }
}

/// Renders an attached element tree into pixels.
pub trait SnapshotRasterizer {
    /// Rasterize `element` (and its descendants) at `options.scale`.
    ///
    /// The output covers the element's bounds, with the element's top-left
    /// corner at the pixmap origin.
    fn rasterize<'a>(
        &'a self,
        element: &'a Element,
        options: RasterizeOptions,
    ) -> LocalBoxFuture<'a, ExportResult<Pixmap>>;
}

/// Paints element boxes: background color and per-side solid borders.
///
/// Text, images and background images are not drawn, which is enough for flat
/// composed views built from colored boxes.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxRasterizer;

const SIDES: [&str; 4] = ["top", "right", "bottom", "left"];

/// Parse a CSS length in pixels, e.g. `2px` or `0`.
fn parse_px(value: &str) -> Option<f32> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value).trim();
    number.parse::<f32>().ok().filter(|v| v.is_finite() && *v >= 0.0)
}

impl BoxRasterizer {
    fn render(&self, element: &Element, options: RasterizeOptions) -> ExportResult<Pixmap> {
        let bounds = element.bounds;
        let width = (bounds.width * options.scale).round() as u32;
        let height = (bounds.height * options.scale).round() as u32;
        let mut ctx = Canvas2dContext::new(width, height)?;
        ctx.scale(options.scale, options.scale);
        ctx.translate(-bounds.x, -bounds.y);
        self.paint(&mut ctx, element);
        log::debug!(target: "export", "rasterized <{}> at {}x{}", element.tag, width, height);
        Ok(ctx.pixmap().clone())
    }

    fn paint(&self, ctx: &mut Canvas2dContext, element: &Element) {
        if let Some(color) = element.style("background-color") {
            if set_fill(ctx, color) {
                ctx.fill_rect(&to_rect(element.bounds));
            }
        }
        for (side, rect) in SIDES.iter().zip(border_rects(element)) {
            let Some(rect) = rect else { continue };
            let color = element
                .style(&format!("border-{}-color", side))
                .or_else(|| element.style("border-color"));
            if let Some(color) = color {
                if set_fill(ctx, color) {
                    ctx.fill_rect(&rect);
                }
            }
        }
        for child in &element.children {
            self.paint(ctx, child);
        }
    }
}

fn set_fill(ctx: &mut Canvas2dContext, color: &str) -> bool {
    match ctx.set_fill_style(color) {
        Ok(()) => true,
        Err(err) => {
            log::debug!(target: "export", "skipping unpaintable color: {}", err);
            false
        }
    }
}

fn to_rect(bounds: Bounds) -> RectParams {
    RectParams {
        x: bounds.x,
        y: bounds.y,
        width: bounds.width,
        height: bounds.height,
    }
}

/// Border rectangles in top, right, bottom, left order.
fn border_rects(element: &Element) -> [Option<RectParams>; 4] {
    let b = element.bounds;
    let width_of = |side: &str| {
        element
            .style(&format!("border-{}-width", side))
            .or_else(|| element.style("border-width"))
            .and_then(parse_px)
            .filter(|w| *w > 0.0)
    };
    let rect = |x, y, width, height| RectParams {
        x,
        y,
        width,
        height,
    };
    [
        width_of("top").map(|w| rect(b.x, b.y, b.width, w)),
        width_of("right").map(|w| rect(b.x + b.width - w, b.y, w, b.height)),
        width_of("bottom").map(|w| rect(b.x, b.y + b.height - w, b.width, w)),
        width_of("left").map(|w| rect(b.x, b.y, w, b.height)),
    ]
}

impl SnapshotRasterizer for BoxRasterizer {
    fn rasterize<'a>(
        &'a self,
        element: &'a Element,
        options: RasterizeOptions,
    ) -> LocalBoxFuture<'a, ExportResult<Pixmap>> {
        async move { self.render(element, options) }.boxed_local()
    }
}
