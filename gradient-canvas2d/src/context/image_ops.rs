//! Image drawing, pixel data, and PNG output operations for Canvas2dContext.

use super::Canvas2dContext;
use crate::error::Canvas2dResult;

impl Canvas2dContext {
    /// Draw a premultiplied pixmap scaled into the destination rectangle,
    /// honoring the current transform, alpha and composite operation.
    pub fn draw_pixmap_scaled(
        &mut self,
        pixmap: tiny_skia::PixmapRef<'_>,
        dx: f32,
        dy: f32,
        dw: f32,
        dh: f32,
    ) {
        log::debug!(target: "canvas", "drawImage {}x{} -> {} {} {} {}", pixmap.width(), pixmap.height(), dx, dy, dw, dh);
        if dw <= 0.0 || dh <= 0.0 {
            return;
        }
        let paint = tiny_skia::PixmapPaint {
            opacity: self.state.global_alpha,
            blend_mode: self.state.global_composite_operation,
            quality: tiny_skia::FilterQuality::Bilinear,
        };

        let scale_x = dw / pixmap.width() as f32;
        let scale_y = dh / pixmap.height() as f32;
        let transform = self
            .state
            .transform
            .pre_translate(dx, dy)
            .pre_scale(scale_x, scale_y);

        self.pixmap
            .draw_pixmap(0, 0, pixmap, &paint, transform, None);
    }

    /// Get image data for a region of the canvas as straight-alpha RGBA.
    ///
    /// Pixels outside the canvas are transparent black.
    pub fn get_image_data(&self, x: i32, y: i32, width: u32, height: u32) -> Vec<u8> {
        let mut data = vec![0u8; (width * height * 4) as usize];
        let pixels = self.pixmap.pixels();

        for dy in 0..height {
            let src_y = y + dy as i32;
            if src_y < 0 || src_y >= self.height as i32 {
                continue;
            }
            for dx in 0..width {
                let src_x = x + dx as i32;
                if src_x < 0 || src_x >= self.width as i32 {
                    continue;
                }
                let pixel = pixels[(src_y as u32 * self.width + src_x as u32) as usize].demultiply();
                let dst_idx = ((dy * width + dx) * 4) as usize;
                data[dst_idx] = pixel.red();
                data[dst_idx + 1] = pixel.green();
                data[dst_idx + 2] = pixel.blue();
                data[dst_idx + 3] = pixel.alpha();
            }
        }

        data
    }

    /// Export the canvas as PNG data.
    ///
    /// # Arguments
    /// * `ppi` - Optional pixels per inch for PNG metadata. Defaults to 72 if not specified.
    pub fn to_png(&self, ppi: Option<f32>) -> Canvas2dResult<Vec<u8>> {
        let ppi = ppi.unwrap_or(72.0);

        let mut buf = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut buf, self.width, self.height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);

            // Set pixel density metadata (pixels per meter)
            let ppm = (ppi.max(0.0) / 0.0254).round() as u32;
            encoder.set_pixel_dims(Some(png::PixelDimensions {
                xppu: ppm,
                yppu: ppm,
                unit: png::Unit::Meter,
            }));

            let mut writer = encoder.write_header()?;

            // Convert from premultiplied to straight alpha for PNG
            let data = self.get_image_data(0, 0, self.width, self.height);
            writer.write_image_data(&data)?;
        }
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::RectParams;

    #[test]
    fn test_get_image_data_is_straight_alpha() {
        let mut ctx = Canvas2dContext::new(2, 1).unwrap();
        ctx.set_fill_style("rgba(255, 0, 0, 0.5)").unwrap();
        ctx.fill_rect(&RectParams {
            x: 0.0,
            y: 0.0,
            width: 2.0,
            height: 1.0,
        });
        let data = ctx.get_image_data(0, 0, 2, 1);
        assert_eq!(data[0], 255);
        assert!((data[3] as i32 - 128).abs() <= 1);
    }

    #[test]
    fn test_get_image_data_out_of_bounds_is_transparent() {
        let mut ctx = Canvas2dContext::new(4, 4).unwrap();
        ctx.set_fill_style("#ffffff").unwrap();
        ctx.fill_rect(&RectParams {
            x: 0.0,
            y: 0.0,
            width: 4.0,
            height: 4.0,
        });
        let data = ctx.get_image_data(2, 2, 4, 4);
        assert_eq!(data[3], 255);
        assert_eq!(data[(3 * 4 + 3) * 4 + 3], 0);
    }

    #[test]
    fn test_to_png_has_signature() {
        let ctx = Canvas2dContext::new(3, 3).unwrap();
        let png = ctx.to_png(None).unwrap();
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    }
}
