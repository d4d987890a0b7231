//! Canvas encoding and ordered dithering.

use crate::config::ExportConfig;
use crate::error::{ExportError, ExportResult};
use crate::request::ExportFormat;
use gradient_canvas2d::Canvas2dContext;
use image::RgbImage;
use std::io::Cursor;

/// 4×4 Bayer threshold matrix.
const BAYER_4X4: [[u8; 4]; 4] = [[0, 8, 2, 10], [12, 4, 14, 6], [3, 11, 1, 9], [15, 7, 13, 5]];

/// Offset added at pixel `(x, y)`, within `[-amplitude, amplitude]`.
fn dither_offset(x: usize, y: usize, amplitude: f32) -> i16 {
    let threshold = BAYER_4X4[y % 4][x % 4] as f32;
    let unit = (threshold + 0.5) / 16.0 * 2.0 - 1.0;
    (unit * amplitude).round() as i16
}

/// Apply ordered dithering to straight-alpha RGBA data in place.
///
/// Only the color channels move; alpha is left untouched.
pub fn dither(rgba: &mut [u8], width: u32, amplitude: f32) {
    if amplitude <= 0.0 || width == 0 {
        return;
    }
    let width = width as usize;
    for (i, px) in rgba.chunks_exact_mut(4).enumerate() {
        let offset = dither_offset(i % width, i / width, amplitude);
        for channel in &mut px[..3] {
            *channel = (*channel as i16 + offset).clamp(0, 255) as u8;
        }
    }
}

/// Encode the canvas contents.
///
/// PNG is written losslessly from the canvas as is. JPEG and WebP are lossy
/// at the configured qualities and are dithered first to hide banding in
/// smooth gradients.
pub fn encode_canvas(
    ctx: &Canvas2dContext,
    format: ExportFormat,
    config: &ExportConfig,
) -> ExportResult<Vec<u8>> {
    let (width, height) = (ctx.width(), ctx.height());
    let bytes = if format.is_lossy() {
        let mut rgba = ctx.get_image_data(0, 0, width, height);
        dither(&mut rgba, width, config.dither_amplitude);
        match format {
            ExportFormat::Jpg => encode_jpeg(rgba, width, height, config.jpeg_quality_percent())?,
            _ => encode_webp(&rgba, width, height, config.webp_quality_percent())?,
        }
    } else {
        ctx.to_png(None)?
    };
    if bytes.is_empty() {
        return Err(ExportError::EncodeFailure(format!(
            "{} encoder produced no data",
            format
        )));
    }
    log::debug!(target: "export", "encoded {}x{} {} ({} bytes)", width, height, format, bytes.len());
    Ok(bytes)
}

/// JPEG has no alpha channel; transparent areas come out black as in a browser canvas.
fn encode_jpeg(rgba: Vec<u8>, width: u32, height: u32, quality: u8) -> ExportResult<Vec<u8>> {
    let rgb: Vec<u8> = rgba
        .chunks_exact(4)
        .flat_map(|px| {
            let a = px[3] as u16;
            [0, 1, 2].map(|c| ((px[c] as u16 * a + 127) / 255) as u8)
        })
        .collect();
    let img = RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| ExportError::EncodeFailure("Failed to create RGB image".to_string()))?;

    let mut buffer = Vec::new();
    let mut cursor = Cursor::new(&mut buffer);
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality);
    img.write_with_encoder(encoder)?;
    Ok(buffer)
}

fn encode_webp(rgba: &[u8], width: u32, height: u32, quality: f32) -> ExportResult<Vec<u8>> {
    let encoder = webp::Encoder::from_rgba(rgba, width, height);
    let memory = encoder
        .encode_simple(false, quality)
        .map_err(|e| ExportError::EncodeFailure(format!("WebP encoding failed: {:?}", e)))?;
    Ok(memory.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gradient_canvas2d::RectParams;

    fn gray_canvas(width: u32, height: u32) -> Canvas2dContext {
        let mut ctx = Canvas2dContext::new(width, height).unwrap();
        ctx.set_fill_style("rgb(128, 128, 128)").unwrap();
        ctx.fill_rect(&RectParams {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
        });
        ctx
    }

    #[test]
    fn test_dither_bounded_and_alpha_untouched() {
        let mut data = vec![100, 0, 255, 77].repeat(64);
        let original = data.clone();
        dither(&mut data, 8, 2.0);
        for (px, orig) in data.chunks_exact(4).zip(original.chunks_exact(4)) {
            for c in 0..3 {
                assert!((px[c] as i16 - orig[c] as i16).abs() <= 2);
            }
            assert_eq!(px[3], 77);
        }
        // Clamped at the ends of the range
        assert!(data.chunks_exact(4).all(|px| px[1] <= 2 && px[2] >= 253));
        // The pattern actually varies across a tile
        assert!(data.chunks_exact(4).any(|px| px[0] != 100));
    }

    #[test]
    fn test_dither_offsets_average_to_zero() {
        let total: i16 = (0..4)
            .flat_map(|y| (0..4).map(move |x| dither_offset(x, y, 2.0)))
            .sum();
        assert_eq!(total, 0);
    }

    #[test]
    fn test_zero_amplitude_is_noop() {
        let mut data = vec![10, 20, 30, 255].repeat(16);
        let original = data.clone();
        dither(&mut data, 4, 0.0);
        assert_eq!(data, original);
    }

    #[test]
    fn test_png_is_exact() {
        let ctx = gray_canvas(16, 16);
        let png = encode_canvas(&ctx, ExportFormat::Png, &ExportConfig::default()).unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.into_raw(), ctx.get_image_data(0, 0, 16, 16));
    }

    #[test]
    fn test_jpeg_within_tolerance() {
        let ctx = gray_canvas(32, 32);
        let jpg = encode_canvas(&ctx, ExportFormat::Jpg, &ExportConfig::default()).unwrap();
        assert_eq!(&jpg[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&jpg).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (32, 32));
        assert!(decoded.pixels().all(|p| p.0.iter().all(|&c| (c as i16 - 128).abs() <= 8)));
    }

    fn gradient_canvas(width: u32, height: u32) -> Canvas2dContext {
        let mut ctx = Canvas2dContext::new(width, height).unwrap();
        let mut gradient = ctx.create_linear_gradient(0.0, 0.0, width as f32, height as f32);
        gradient.add_color_stop(0.0, gradient_canvas2d::CanvasColor::from_rgba8(255, 0, 80, 255));
        gradient.add_color_stop(1.0, gradient_canvas2d::CanvasColor::from_rgba8(0, 90, 255, 255));
        ctx.set_fill_style_gradient(gradient);
        ctx.fill_rect(&RectParams {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
        });
        ctx
    }

    #[test]
    fn test_webp_within_lossy_band() {
        let ctx = gray_canvas(16, 16);
        let webp = encode_canvas(&ctx, ExportFormat::Webp, &ExportConfig::default()).unwrap();
        assert_eq!(&webp[..4], b"RIFF");
        assert_eq!(&webp[8..12], b"WEBP");
        assert_ne!(&webp[12..16], b"VP8L");
        let decoded = image::load_from_memory(&webp).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (16, 16));
        for p in decoded.pixels() {
            assert!(p.0[..3].iter().all(|&c| (c as i16 - 128).abs() <= 8), "{:?}", p);
            assert_eq!(p.0[3], 255);
        }
    }

    #[test]
    fn test_webp_quality_is_applied() {
        let ctx = gradient_canvas(64, 64);
        let encode = |webp_quality| {
            let config = ExportConfig {
                webp_quality,
                ..Default::default()
            };
            encode_canvas(&ctx, ExportFormat::Webp, &config).unwrap().len()
        };
        assert!(encode(0.05) < encode(1.0));
    }

    #[test]
    fn test_only_lossy_formats_are_dithered() {
        assert!(!ExportFormat::Png.is_lossy());
        assert!(ExportFormat::Jpg.is_lossy());
        assert!(ExportFormat::Webp.is_lossy());
    }
}
