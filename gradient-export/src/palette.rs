//! Palette extraction seam.
//!
//! Extraction is an upstream collaborator: whatever it returns is treated as
//! untrusted and normalized before it becomes part of a gradient.

use crate::color::normalize;
use crate::error::{ExportError, ExportResult};
use std::collections::HashMap;

/// Turns an image into an ordered list of colors.
pub trait PaletteExtractor {
    /// Extract up to `count` colors, most prominent first.
    fn extract(&self, image: &[u8], count: usize) -> Result<Vec<String>, String>;
}

/// Picks the most frequent colors of a coarse RGB histogram.
#[derive(Debug, Clone, Copy)]
pub struct HistogramPaletteExtractor {
    /// Bits kept per channel when bucketing.
    pub bits: u8,
    /// Pixels with lower alpha are ignored.
    pub min_alpha: u8,
}

impl Default for HistogramPaletteExtractor {
    fn default() -> Self {
        Self {
            bits: 4,
            min_alpha: 128,
        }
    }
}

#[derive(Default)]
struct Bucket {
    sum: [u64; 3],
    count: u64,
}

impl PaletteExtractor for HistogramPaletteExtractor {
    fn extract(&self, image: &[u8], count: usize) -> Result<Vec<String>, String> {
        let decoded = image::load_from_memory(image)
            .map_err(|e| format!("unreadable image: {}", e))?
            .to_rgba8();

        let shift = 8 - self.bits.clamp(1, 8);
        let mut buckets: HashMap<[u8; 3], Bucket> = HashMap::new();
        for px in decoded.pixels() {
            let [r, g, b, a] = px.0;
            if a < self.min_alpha {
                continue;
            }
            let bucket = buckets.entry([r >> shift, g >> shift, b >> shift]).or_default();
            bucket.sum[0] += r as u64;
            bucket.sum[1] += g as u64;
            bucket.sum[2] += b as u64;
            bucket.count += 1;
        }
        if buckets.is_empty() {
            return Err("image has no opaque pixels".to_string());
        }

        let mut ranked: Vec<([u8; 3], Bucket)> = buckets.into_iter().collect();
        ranked.sort_by(|(ka, a), (kb, b)| b.count.cmp(&a.count).then(ka.cmp(kb)));
        Ok(ranked
            .into_iter()
            .take(count)
            .map(|(_, bucket)| {
                let mean = |i: usize| (bucket.sum[i] + bucket.count / 2) / bucket.count;
                format!("#{:02x}{:02x}{:02x}", mean(0), mean(1), mean(2))
            })
            .collect())
    }
}

/// Re-validate colors from an extractor: drop blanks and normalize the rest.
pub fn sanitize_palette(colors: Vec<String>) -> Vec<String> {
    colors
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(normalize)
        .collect()
}

/// Extract and sanitize a palette, reporting extraction failures as decode errors.
pub fn extract_palette(
    extractor: &dyn PaletteExtractor,
    image: &[u8],
    count: usize,
) -> ExportResult<Vec<String>> {
    let colors = extractor
        .extract(image, count)
        .map_err(ExportError::ImageDecodeFailure)?;
    let palette = sanitize_palette(colors);
    log::debug!(target: "export", "extracted palette {:?}", palette);
    Ok(palette)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_with(pixels: &[(u32, [u8; 4])]) -> Vec<u8> {
        let total: u32 = pixels.iter().map(|(n, _)| n).sum();
        let mut img = RgbaImage::new(total, 1);
        let mut x = 0;
        for (n, color) in pixels {
            for _ in 0..*n {
                img.put_pixel(x, 0, Rgba(*color));
                x += 1;
            }
        }
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_histogram_orders_by_frequency() {
        let png = png_with(&[
            (3, [0, 0, 255, 255]),
            (5, [255, 0, 0, 255]),
            (1, [0, 255, 0, 255]),
            (9, [0, 0, 0, 0]),
        ]);
        let colors = HistogramPaletteExtractor::default().extract(&png, 2).unwrap();
        assert_eq!(colors, vec!["#ff0000", "#0000ff"]);
    }

    #[test]
    fn test_unreadable_image() {
        let err = extract_palette(&HistogramPaletteExtractor::default(), b"nope", 4).unwrap_err();
        assert!(matches!(err, ExportError::ImageDecodeFailure(_)));
    }

    #[test]
    fn test_transparent_image_fails() {
        let png = png_with(&[(4, [10, 10, 10, 0])]);
        assert!(HistogramPaletteExtractor::default().extract(&png, 4).is_err());
    }

    #[test]
    fn test_sanitize_palette() {
        let colors = vec![
            "#abcdef".to_string(),
            "  ".to_string(),
            "lab(100% 0 0)".to_string(),
            "bogus".to_string(),
        ];
        assert_eq!(
            sanitize_palette(colors),
            vec!["#abcdef", "rgb(255,255,255)", "rgb(255,0,255)"]
        );
    }
}
