//! Snapshot export: rasterizing an on-screen node.

use super::RasterExporter;
use crate::color::{normalize, normalize_definition};
use crate::dom::{Document, Element, SvgNode};
use crate::error::{ExportError, ExportResult};
use crate::rasterizer::{RasterizeOptions, SnapshotRasterizer};
use crate::request::{ExportFormat, RasterResult, ScaleFactor};
use gradient_canvas2d::Canvas2dContext;
use tiny_skia::Pixmap;

/// Style properties that may carry a color or gradient value.
pub const COLOR_PROPERTIES: &[&str] = &[
    "background-color",
    "color",
    "border-top-color",
    "border-right-color",
    "border-bottom-color",
    "border-left-color",
    "box-shadow",
    "text-shadow",
    "background-image",
];

/// Properties whose values embed colors among other syntax.
const COMPOSITE_PROPERTIES: &[&str] = &["box-shadow", "text-shadow", "background-image"];

/// File name base for snapshots when the caller does not provide one.
const DEFAULT_SNAPSHOT_BASE: &str = "gradient";

/// The on-screen node to export.
#[derive(Debug, Clone, Copy)]
pub enum SnapshotTarget<'a> {
    Svg(&'a SvgNode),
    Element(&'a Element),
}

/// Rewrite every color-bearing style property of `element` and its
/// descendants into canvas-drawable notation.
pub fn normalize_element_colors(element: &mut Element) {
    element.walk_mut(&mut |e| {
        for &property in COLOR_PROPERTIES {
            let Some(value) = e.style(property) else {
                continue;
            };
            let normalized = if COMPOSITE_PROPERTIES.contains(&property) {
                normalize_definition(value)
            } else {
                normalize(value)
            };
            e.set_style(property, &normalized);
        }
    });
}

/// Keep the clone laid out at its full size while keeping it off screen.
fn hide_offscreen(element: &mut Element) {
    for (property, value) in [
        ("position", "fixed"),
        ("left", "-100000px"),
        ("top", "0"),
        ("pointer-events", "none"),
    ] {
        element.set_style(property, value);
    }
}

/// Parse and render SVG markup at `width`×`height` device pixels.
fn render_svg(markup: &str, width: u32, height: u32) -> ExportResult<Pixmap> {
    let tree = usvg::Tree::from_str(markup, &usvg::Options::default())
        .map_err(|e| ExportError::ImageDecodeFailure(format!("invalid SVG: {}", e)))?;
    let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
        ExportError::CanvasContextUnavailable(format!("cannot allocate {}x{} image", width, height))
    })?;
    let size = tree.size();
    let transform = tiny_skia::Transform::from_scale(
        width as f32 / size.width(),
        height as f32 / size.height(),
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());
    Ok(pixmap)
}

fn device_size(width: f32, height: f32, scale: f32) -> ExportResult<(u32, u32)> {
    let (w, h) = ((width * scale).round(), (height * scale).round());
    if w.is_nan() || h.is_nan() || w < 1.0 || h < 1.0 {
        return Err(ExportError::InvalidRequest(format!(
            "node has no visible size ({}x{})",
            width, height
        )));
    }
    Ok((w as u32, h as u32))
}

impl RasterExporter {
    /// Rasterize an on-screen node and encode it.
    ///
    /// SVG nodes are rendered in-process. Other elements are cloned with
    /// their colors normalized, attached off screen to `document` and handed
    /// to `rasterizer`; the clone is detached again on every exit path. When
    /// no rasterizer is available the export fails with
    /// [`ExportError::RasterizationCapabilityMissing`].
    pub async fn export_snapshot(
        &self,
        target: SnapshotTarget<'_>,
        document: &Document,
        rasterizer: Option<&dyn SnapshotRasterizer>,
        scale: ScaleFactor,
        format: ExportFormat,
        file_name_base: Option<&str>,
    ) -> ExportResult<RasterResult> {
        let s = scale.value() as f32;
        let base = file_name_base.unwrap_or(DEFAULT_SNAPSHOT_BASE);

        let ctx = match target {
            SnapshotTarget::Svg(node) => {
                let (width, height) = device_size(node.width, node.height, s)?;
                let markup = node.markup.clone();
                let image = tokio::task::spawn_blocking(move || render_svg(&markup, width, height))
                    .await
                    .map_err(|e| {
                        ExportError::ImageDecodeFailure(format!("SVG render task failed: {}", e))
                    })??;

                let mut ctx = Canvas2dContext::new(width, height)?;
                ctx.scale(s, s);
                ctx.draw_pixmap_scaled(image.as_ref(), 0.0, 0.0, node.width, node.height);
                ctx
            }
            SnapshotTarget::Element(element) => {
                let rasterizer = rasterizer.ok_or(ExportError::RasterizationCapabilityMissing)?;
                let mut clone = element.clone();
                normalize_element_colors(&mut clone);
                hide_offscreen(&mut clone);

                let image = {
                    let attached = document.attach(clone);
                    rasterizer
                        .rasterize(attached.element(), RasterizeOptions::tolerant(s))
                        .await?
                };

                let mut ctx = Canvas2dContext::new(image.width(), image.height())?;
                ctx.draw_pixmap_scaled(
                    image.as_ref(),
                    0.0,
                    0.0,
                    image.width() as f32,
                    image.height() as f32,
                );
                ctx
            }
        };

        self.finish(&ctx, format, base)
    }
}
