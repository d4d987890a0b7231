//! Linear gradient brushes.

use crate::geometry::CanvasColor;

/// A color stop in a gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    /// Offset position (0.0 to 1.0).
    pub offset: f64,
    /// Color at this stop.
    pub color: CanvasColor,
}

/// Canvas linear gradient running from (x0, y0) to (x1, y1).
#[derive(Debug, Clone)]
pub struct CanvasGradient {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    /// Color stops, kept sorted by offset.
    pub stops: Vec<GradientStop>,
}

impl CanvasGradient {
    /// Create a new linear gradient.
    pub fn new_linear(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0,
            y0,
            x1,
            y1,
            stops: Vec::new(),
        }
    }

    /// Add a color stop to the gradient.
    ///
    /// Offsets outside 0.0..=1.0 (or non-finite) are ignored, matching the
    /// browser which throws and leaves the gradient unchanged.
    pub fn add_color_stop(&mut self, offset: f64, color: CanvasColor) {
        if !offset.is_finite() || !(0.0..=1.0).contains(&offset) {
            log::warn!(target: "canvas", "ignoring gradient stop at offset {}", offset);
            return;
        }
        self.stops.push(GradientStop { offset, color });
        // Stable sort keeps insertion order for equal offsets
        self.stops.sort_by(|a, b| {
            a.offset
                .partial_cmp(&b.offset)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }
}
