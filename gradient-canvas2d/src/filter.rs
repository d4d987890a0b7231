//! CSS filters applied to fill operations.
//!
//! Only `blur(<length>)` is supported. The blur is a Gaussian approximated by
//! three successive box blurs, which keeps the cost independent of the radius.
//! Pixels outside the buffer are treated as transparent, as browsers do.

use crate::error::{Canvas2dError, Canvas2dResult};
use std::str::FromStr;
use tiny_skia::Pixmap;

/// Number of box passes used to approximate a Gaussian.
const BOX_PASSES: usize = 3;

/// Filter applied to subsequent fill operations.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CanvasFilter {
    #[default]
    None,
    /// Gaussian blur with the given standard deviation in user-space pixels.
    Blur(f32),
}

impl CanvasFilter {
    /// Standard deviation in device pixels given the current transform scale.
    pub(crate) fn device_sigma(&self, scale: f32) -> Option<f32> {
        match *self {
            CanvasFilter::Blur(sigma) if sigma > 0.0 => Some(sigma * scale),
            _ => None,
        }
    }
}

impl FromStr for CanvasFilter {
    type Err = Canvas2dError;

    fn from_str(s: &str) -> Canvas2dResult<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("none") || s.is_empty() {
            return Ok(CanvasFilter::None);
        }
        let inner = s
            .strip_prefix("blur(")
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| Canvas2dError::FilterParseError(s.to_string()))?
            .trim();
        let number = inner.strip_suffix("px").unwrap_or(inner).trim();
        let sigma: f32 = number
            .parse()
            .map_err(|_| Canvas2dError::FilterParseError(s.to_string()))?;
        if !sigma.is_finite() || sigma < 0.0 {
            return Err(Canvas2dError::FilterParseError(s.to_string()));
        }
        Ok(CanvasFilter::Blur(sigma))
    }
}

/// Box widths whose successive application approximates a Gaussian of `sigma`.
fn box_sizes_for_gauss(sigma: f32) -> [usize; BOX_PASSES] {
    let n = BOX_PASSES as f32;
    let w_ideal = (12.0 * sigma * sigma / n + 1.0).sqrt();
    let mut wl = w_ideal.floor() as i64;
    if wl % 2 == 0 {
        wl -= 1;
    }
    let wl = wl.max(1);
    let wu = wl + 2;
    let wlf = wl as f32;
    let m = ((12.0 * sigma * sigma - n * wlf * wlf - 4.0 * n * wlf - 3.0 * n) / (-4.0 * wlf - 4.0))
        .round() as i64;

    let mut sizes = [0usize; BOX_PASSES];
    for (i, size) in sizes.iter_mut().enumerate() {
        *size = if (i as i64) < m { wl as usize } else { wu as usize };
    }
    sizes
}

/// Blur a premultiplied pixmap in place.
pub fn apply_gaussian_blur(pixmap: &mut Pixmap, sigma: f32) {
    if !sigma.is_finite() || sigma < 0.5 {
        return;
    }
    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    log::debug!(target: "canvas", "blur sigma={} on {}x{}", sigma, width, height);

    let data = pixmap.data_mut();
    let mut scratch = vec![0u8; data.len()];
    for size in box_sizes_for_gauss(sigma) {
        let radius = (size - 1) / 2;
        if radius == 0 {
            continue;
        }
        box_blur_horizontal(data, &mut scratch, width, height, radius);
        box_blur_vertical(&scratch, data, width, height, radius);
    }
}

fn box_blur_horizontal(src: &[u8], dst: &mut [u8], width: usize, height: usize, radius: usize) {
    let div = (2 * radius + 1) as u32;
    for y in 0..height {
        let row = y * width;
        let mut acc = [0u32; 4];
        // Window for x = 0 covers [-radius, radius]; negative indices are transparent
        for x in 0..=radius.min(width - 1) {
            let idx = (row + x) * 4;
            for c in 0..4 {
                acc[c] += src[idx + c] as u32;
            }
        }
        for x in 0..width {
            let out = (row + x) * 4;
            for c in 0..4 {
                dst[out + c] = ((acc[c] + div / 2) / div) as u8;
            }
            let enter = x + radius + 1;
            if enter < width {
                let idx = (row + enter) * 4;
                for c in 0..4 {
                    acc[c] += src[idx + c] as u32;
                }
            }
            if x >= radius {
                let idx = (row + x - radius) * 4;
                for c in 0..4 {
                    acc[c] -= src[idx + c] as u32;
                }
            }
        }
    }
}

fn box_blur_vertical(src: &[u8], dst: &mut [u8], width: usize, height: usize, radius: usize) {
    let div = (2 * radius + 1) as u32;
    for x in 0..width {
        let mut acc = [0u32; 4];
        for y in 0..=radius.min(height - 1) {
            let idx = (y * width + x) * 4;
            for c in 0..4 {
                acc[c] += src[idx + c] as u32;
            }
        }
        for y in 0..height {
            let out = (y * width + x) * 4;
            for c in 0..4 {
                dst[out + c] = ((acc[c] + div / 2) / div) as u8;
            }
            let enter = y + radius + 1;
            if enter < height {
                let idx = (enter * width + x) * 4;
                for c in 0..4 {
                    acc[c] += src[idx + c] as u32;
                }
            }
            if y >= radius {
                let idx = ((y - radius) * width + x) * 4;
                for c in 0..4 {
                    acc[c] -= src[idx + c] as u32;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("none", CanvasFilter::None)]
    #[case("blur(40px)", CanvasFilter::Blur(40.0))]
    #[case(" blur( 2.5px ) ", CanvasFilter::Blur(2.5))]
    #[case("blur(0)", CanvasFilter::Blur(0.0))]
    fn test_parse_filter(#[case] input: &str, #[case] expected: CanvasFilter) {
        assert_eq!(input.parse::<CanvasFilter>().unwrap(), expected);
    }

    #[rstest]
    #[case("blur(-1px)")]
    #[case("grayscale(1)")]
    #[case("blur(abc)")]
    fn test_parse_filter_invalid(#[case] input: &str) {
        assert!(matches!(
            input.parse::<CanvasFilter>(),
            Err(Canvas2dError::FilterParseError(_))
        ));
    }

    #[test]
    fn test_box_sizes_are_odd() {
        for sigma in [1.0, 4.0, 40.0, 120.0] {
            for size in box_sizes_for_gauss(sigma) {
                assert_eq!(size % 2, 1, "sigma {} produced even box {}", sigma, size);
            }
        }
    }

    #[test]
    fn test_blur_spreads_and_preserves_premultiplication() {
        let mut pixmap = Pixmap::new(41, 41).unwrap();
        let mut paint = tiny_skia::Paint::default();
        paint.set_color_rgba8(255, 0, 0, 255);
        let rect = tiny_skia::Rect::from_xywh(15.0, 15.0, 11.0, 11.0).unwrap();
        pixmap.fill_rect(rect, &paint, tiny_skia::Transform::identity(), None);

        apply_gaussian_blur(&mut pixmap, 4.0);

        let data = pixmap.data();
        let center = (20 * 41 + 20) * 4;
        let near_edge = (20 * 41 + 8) * 4;
        assert!(data[center + 3] > 0 && data[center + 3] < 255);
        assert!(data[near_edge + 3] > 0);
        for px in data.chunks_exact(4) {
            assert!(px[0] <= px[3]);
            assert_eq!(px[1], 0);
        }
    }

    #[test]
    fn test_blur_small_sigma_is_noop() {
        let mut pixmap = Pixmap::new(4, 4).unwrap();
        pixmap.fill(tiny_skia::Color::WHITE);
        let before = pixmap.data().to_vec();
        apply_gaussian_blur(&mut pixmap, 0.1);
        assert_eq!(pixmap.data(), &before[..]);
    }
}
