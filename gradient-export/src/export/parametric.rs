//! Parametric export: painting a gradient description onto a fresh canvas.

use super::RasterExporter;
use crate::color::normalize;
use crate::error::{ExportError, ExportResult};
use crate::geometry::{generate_blobs, linear_endpoints, linear_stops, Blob};
use crate::request::{ExportRequest, RasterResult, ScaleFactor};
use crate::spec::{BlobVariant, GradientSpec, LinearVariant};
use gradient_canvas2d::{parse_color, Canvas2dContext, CanvasColor, CanvasFilter, RectParams};

/// Painted when a token survives normalization but still cannot be parsed.
const SENTINEL: CanvasColor = CanvasColor::from_rgba8(255, 0, 255, 255);

/// Normalize a color token and resolve it to a canvas color.
fn canvas_color(token: &str) -> CanvasColor {
    let normalized = normalize(token);
    match parse_color(&normalized) {
        Ok(color) => color.into(),
        Err(err) => {
            log::warn!(target: "export", "{}; using sentinel color", err);
            SENTINEL
        }
    }
}

fn full_rect(width: u32, height: u32) -> RectParams {
    RectParams {
        x: 0.0,
        y: 0.0,
        width: width as f32,
        height: height as f32,
    }
}

impl RasterExporter {
    /// Paint `spec` onto a canvas of `width*scale` × `height*scale` pixels.
    ///
    /// Geometry is computed in `width`×`height` space and mapped to device
    /// pixels with a scale transform, blur included.
    pub fn paint(
        &self,
        spec: &GradientSpec,
        width: u32,
        height: u32,
        scale: ScaleFactor,
    ) -> ExportResult<Canvas2dContext> {
        spec.validate()?;
        if width == 0 || height == 0 {
            return Err(ExportError::InvalidRequest(format!(
                "export size must be positive, got {}x{}",
                width, height
            )));
        }
        let s = scale.value();
        let (device_width, device_height) = width
            .checked_mul(s)
            .zip(height.checked_mul(s))
            .ok_or_else(|| ExportError::InvalidRequest("export size overflows".to_string()))?;

        let mut ctx = Canvas2dContext::new(device_width, device_height)?;
        ctx.scale(s as f32, s as f32);
        log::debug!(
            target: "export",
            "painting {} gradient at {}x{} (scale {})",
            spec.kind_name(),
            device_width,
            device_height,
            s
        );

        match spec {
            GradientSpec::Linear {
                colors,
                angle_degrees,
                variant,
            } => self.paint_linear(&mut ctx, colors, *angle_degrees, *variant, width, height),
            GradientSpec::Blob {
                colors,
                variant,
                blobs,
            } => self.paint_blobs(&mut ctx, colors, *variant, blobs, width, height)?,
        }
        Ok(ctx)
    }

    /// Paint and encode one export request.
    pub fn export(&self, request: &ExportRequest) -> ExportResult<RasterResult> {
        let ctx = self.paint(&request.spec, request.width, request.height, request.scale)?;
        self.finish(&ctx, request.format, &request.file_name_base)
    }

    /// Run [`RasterExporter::export`] on the blocking pool so the caller's
    /// event loop keeps running while pixels are painted and encoded.
    pub async fn export_in_background(&self, request: ExportRequest) -> ExportResult<RasterResult> {
        let exporter = self.clone();
        tokio::task::spawn_blocking(move || exporter.export(&request))
            .await
            .map_err(|e| ExportError::EncodeFailure(format!("export task failed: {}", e)))?
    }

    fn paint_linear(
        &self,
        ctx: &mut Canvas2dContext,
        colors: &[String],
        angle_degrees: f64,
        variant: LinearVariant,
        width: u32,
        height: u32,
    ) {
        let e = linear_endpoints(angle_degrees, width as f64, height as f64);
        let mut gradient =
            ctx.create_linear_gradient(e.x0 as f32, e.y0 as f32, e.x1 as f32, e.y1 as f32);
        for stop in linear_stops(colors, variant) {
            gradient.add_color_stop(stop.offset, canvas_color(&stop.color));
        }
        ctx.set_fill_style_gradient(gradient);
        ctx.fill_rect(&full_rect(width, height));
    }

    fn paint_blobs(
        &self,
        ctx: &mut Canvas2dContext,
        colors: &[String],
        variant: BlobVariant,
        blobs: &[Blob],
        width: u32,
        height: u32,
    ) -> ExportResult<()> {
        let config = &self.config;
        let background = match variant {
            BlobVariant::Dark => Some(&config.dark_background),
            BlobVariant::Light => Some(&config.light_background),
            BlobVariant::Random => None,
        };
        if let Some(background) = background {
            ctx.set_fill_style_color(canvas_color(background));
            ctx.fill_rect(&full_rect(width, height));
        }

        // Blobs are derived data; a description without a layout gets a fresh one.
        let generated;
        let blobs = if blobs.is_empty() {
            generated = generate_blobs(
                colors,
                width as f64,
                height as f64,
                &config.blob_options(false),
                &mut fastrand::Rng::new(),
            );
            &generated
        } else {
            blobs
        };

        ctx.save();
        if !ctx.set_global_composite_operation(&config.blob_composite_operation) {
            ctx.restore();
            return Err(ExportError::InvalidRequest(format!(
                "unknown composite operation: {}",
                config.blob_composite_operation
            )));
        }
        ctx.set_filter_value(CanvasFilter::Blur(config.blur_radius));
        ctx.set_global_alpha(config.blob_opacity);
        for blob in blobs {
            ctx.set_fill_style_color(canvas_color(&blob.color));
            ctx.begin_path();
            for arc in blob.path.arcs() {
                ctx.arc(&arc);
            }
            ctx.close_path();
            ctx.fill();
        }
        ctx.restore();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExportConfig;
    use crate::geometry::{BlobPath, BlobRegion};
    use crate::request::ExportFormat;

    fn rgba_at(ctx: &Canvas2dContext, x: i32, y: i32) -> Vec<u8> {
        ctx.get_image_data(x, y, 1, 1)
    }

    fn linear(colors: &[&str], angle: f64, variant: LinearVariant) -> GradientSpec {
        GradientSpec::Linear {
            colors: colors.iter().map(|c| c.to_string()).collect(),
            angle_degrees: angle,
            variant,
        }
    }

    #[test]
    fn test_linear_left_to_right() {
        let exporter = RasterExporter::default();
        let spec = linear(&["#ff0000", "#0000ff"], 90.0, LinearVariant::Default);
        let ctx = exporter.paint(&spec, 100, 10, ScaleFactor::X1).unwrap();
        let left = rgba_at(&ctx, 0, 5);
        let right = rgba_at(&ctx, 99, 5);
        assert!(left[0] > 245 && left[2] < 10, "{:?}", left);
        assert!(right[2] > 245 && right[0] < 10, "{:?}", right);
    }

    #[test]
    fn test_smooth_midpoint_uses_second_color() {
        let exporter = RasterExporter::default();
        let spec = linear(
            &["#ff0000", "#00ff00", "#0000ff", "#ffffff"],
            90.0,
            LinearVariant::Smooth,
        );
        let ctx = exporter.paint(&spec, 101, 4, ScaleFactor::X1).unwrap();
        let mid = rgba_at(&ctx, 50, 2);
        assert!(mid[1] > 240 && mid[0] < 15 && mid[2] < 15, "{:?}", mid);
        // The fourth color is ignored
        let right = rgba_at(&ctx, 100, 2);
        assert!(right[2] > 240 && right[0] < 15, "{:?}", right);
    }

    #[test]
    fn test_lab_colors_are_normalized_before_drawing() {
        let exporter = RasterExporter::default();
        let spec = linear(&["lab(53.23% 80.11 67.22)"], 0.0, LinearVariant::Default);
        let ctx = exporter.paint(&spec, 8, 8, ScaleFactor::X1).unwrap();
        let px = rgba_at(&ctx, 4, 4);
        assert!(px[0] >= 253 && px[1] <= 2 && px[2] <= 2, "{:?}", px);
    }

    #[test]
    fn test_unknown_color_paints_sentinel() {
        let exporter = RasterExporter::default();
        let spec = linear(&["not-a-color"], 0.0, LinearVariant::Default);
        let ctx = exporter.paint(&spec, 4, 4, ScaleFactor::X1).unwrap();
        assert_eq!(rgba_at(&ctx, 1, 1), vec![255, 0, 255, 255]);
    }

    #[test]
    fn test_dark_blob_background_is_opaque() {
        let exporter = RasterExporter::default();
        let spec = GradientSpec::Blob {
            colors: vec!["#ff0000".to_string(), "#00ff00".to_string()],
            variant: BlobVariant::Dark,
            blobs: vec![],
        };
        let ctx = exporter.paint(&spec, 120, 80, ScaleFactor::X1).unwrap();
        let data = ctx.get_image_data(0, 0, 120, 80);
        assert!(data.chunks_exact(4).all(|px| px[3] == 255));
    }

    #[test]
    fn test_random_variant_without_coverage_stays_transparent() {
        let config = ExportConfig {
            blur_radius: 4.0,
            ..Default::default()
        };
        let exporter = RasterExporter::new(config);
        let spec = GradientSpec::Blob {
            colors: vec!["#ff0000".to_string()],
            variant: BlobVariant::Random,
            blobs: vec![Blob {
                path: BlobPath {
                    cx: 20.0,
                    cy: 20.0,
                    radius: 10.0,
                },
                color: "#ff0000".to_string(),
                region: BlobRegion::Center,
            }],
        };
        let ctx = exporter.paint(&spec, 200, 200, ScaleFactor::X2).unwrap();
        assert_eq!(rgba_at(&ctx, 399, 399)[3], 0);
        let center = rgba_at(&ctx, 40, 40);
        assert!(center[0] > 200 && center[1] < 20, "{:?}", center);
        // Opacity 0.9 caps coverage
        assert!(center[3] <= 231, "{:?}", center);
        assert!(center[3] >= 200, "{:?}", center);
    }

    #[test]
    fn test_invalid_composite_operation() {
        let config = ExportConfig {
            blob_composite_operation: "sideways".to_string(),
            ..Default::default()
        };
        let spec = GradientSpec::Blob {
            colors: vec!["red".to_string()],
            variant: BlobVariant::Light,
            blobs: vec![],
        };
        assert!(matches!(
            RasterExporter::new(config).paint(&spec, 10, 10, ScaleFactor::X1),
            Err(ExportError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_zero_size_rejected() {
        let spec = linear(&["red"], 0.0, LinearVariant::Default);
        assert!(matches!(
            RasterExporter::default().paint(&spec, 0, 10, ScaleFactor::X1),
            Err(ExportError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_export_names_file() {
        let spec = linear(&["red", "blue"], 45.0, LinearVariant::Default);
        let request = ExportRequest::new(spec, 20, 10, ScaleFactor::X3, ExportFormat::Jpg);
        let result = RasterExporter::default().export(&request).unwrap();
        assert_eq!(result.file_name, "gradient-linear.jpg");
        assert_eq!((result.width, result.height), (60, 30));
    }

    #[tokio::test]
    async fn test_export_in_background() {
        let spec = linear(&["red", "blue"], 45.0, LinearVariant::Default);
        let request = ExportRequest::new(spec, 16, 16, ScaleFactor::X1, ExportFormat::Png)
            .with_file_name_base("bg");
        let result = RasterExporter::default()
            .export_in_background(request)
            .await
            .unwrap();
        assert_eq!(result.file_name, "bg.png");
    }
}
