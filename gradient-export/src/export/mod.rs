//! Raster export.
//!
//! Two independent strategies produce pixels on an offscreen canvas:
//! - [`RasterExporter::export`] paints a [`GradientSpec`](crate::GradientSpec)
//!   directly. It depends on nothing but the description and its blob layout,
//!   and is the path used for gradients.
//! - [`RasterExporter::export_snapshot`] rasterizes an on-screen SVG node or
//!   element tree, for arbitrary composed views.
//!
//! Both end in [`encode_canvas`](crate::encode::encode_canvas).

mod parametric;
mod snapshot;

pub use snapshot::{normalize_element_colors, SnapshotTarget, COLOR_PROPERTIES};

use crate::config::ExportConfig;
use crate::encode::encode_canvas;
use crate::error::ExportResult;
use crate::request::{file_name, ExportFormat, RasterResult};
use gradient_canvas2d::Canvas2dContext;

/// Converts gradient descriptions and snapshots into encoded images.
///
/// Holds only tuning configuration; no state carries over between exports.
#[derive(Debug, Clone, Default)]
pub struct RasterExporter {
    config: ExportConfig,
}

impl RasterExporter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    fn finish(
        &self,
        ctx: &Canvas2dContext,
        format: ExportFormat,
        file_name_base: &str,
    ) -> ExportResult<RasterResult> {
        let bytes = encode_canvas(ctx, format, &self.config)?;
        let result = RasterResult {
            bytes,
            width: ctx.width(),
            height: ctx.height(),
            format,
            file_name: file_name(file_name_base, format),
        };
        log::info!(
            target: "export",
            "exported {} ({}x{}, {} bytes)",
            result.file_name,
            result.width,
            result.height,
            result.bytes.len()
        );
        Ok(result)
    }
}
