//! Canvas 2D rendering context implementation.

mod drawing;
mod image_ops;
mod path_ops;
mod transform;

use crate::drawing_state::DrawingState;
use crate::error::{Canvas2dError, Canvas2dResult};
use crate::filter::CanvasFilter;
use crate::geometry::CanvasColor;
use crate::gradient::CanvasGradient;
use crate::style::FillStyle;
use tiny_skia::Pixmap;

/// Maximum canvas dimension (same as Chrome).
const MAX_DIMENSION: u32 = 32767;

/// Canvas 2D rendering context backed by an offscreen pixmap.
pub struct Canvas2dContext {
    /// Width of the canvas in pixels.
    pub(crate) width: u32,
    /// Height of the canvas in pixels.
    pub(crate) height: u32,
    /// Pixel buffer (premultiplied RGBA).
    pub(crate) pixmap: Pixmap,
    /// Current drawing state.
    pub(crate) state: DrawingState,
    /// Stack of saved drawing states.
    state_stack: Vec<DrawingState>,
    /// Current path builder. Coordinates are stored in device space.
    pub(crate) path_builder: tiny_skia::PathBuilder,
    /// Whether the path has a current point (for arc line_to vs move_to).
    pub(crate) has_current_point: bool,
}

impl Canvas2dContext {
    /// Create a new Canvas2dContext with the specified dimensions.
    ///
    /// Fails with [`Canvas2dError::InvalidDimensions`] when either side is zero
    /// or larger than the browser limit, which is how an unavailable 2D context
    /// shows up for an offscreen canvas.
    pub fn new(width: u32, height: u32) -> Canvas2dResult<Self> {
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(Canvas2dError::InvalidDimensions { width, height });
        }

        let pixmap =
            Pixmap::new(width, height).ok_or(Canvas2dError::InvalidDimensions { width, height })?;

        log::debug!(target: "canvas", "new canvas {}x{}", width, height);
        Ok(Self {
            width,
            height,
            pixmap,
            state: DrawingState::default(),
            state_stack: Vec::new(),
            path_builder: tiny_skia::PathBuilder::new(),
            has_current_point: false,
        })
    }

    /// Get canvas width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get canvas height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Borrow the underlying premultiplied pixmap.
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Save the current drawing state.
    pub fn save(&mut self) {
        log::debug!(target: "canvas", "save");
        self.state_stack.push(self.state.clone());
    }

    /// Restore the previously saved drawing state.
    pub fn restore(&mut self) {
        log::debug!(target: "canvas", "restore");
        if let Some(state) = self.state_stack.pop() {
            self.state = state;
        }
    }

    // --- Style setters ---

    /// Set the fill style from a CSS color string.
    pub fn set_fill_style(&mut self, style: &str) -> Canvas2dResult<()> {
        let color = parse_color(style)?;
        self.state.fill_style = FillStyle::Color(color);
        Ok(())
    }

    /// Set the fill style from a CanvasColor.
    pub fn set_fill_style_color(&mut self, color: CanvasColor) {
        self.state.fill_style = FillStyle::Color(color.into());
    }

    /// Set the global alpha (opacity).
    /// Per spec: ignore non-finite or values outside [0.0, 1.0].
    pub fn set_global_alpha(&mut self, alpha: f32) {
        if alpha.is_finite() && (0.0..=1.0).contains(&alpha) {
            self.state.global_alpha = alpha;
        }
    }

    /// Get the global alpha.
    pub fn global_alpha(&self) -> f32 {
        self.state.global_alpha
    }

    /// Set the global composite operation (blend mode).
    /// Per spec: ignore invalid values, preserve previous mode.
    /// Returns true if the value was accepted.
    pub fn set_global_composite_operation(&mut self, op: &str) -> bool {
        let mode = match op {
            "source-over" => tiny_skia::BlendMode::SourceOver,
            "source-in" => tiny_skia::BlendMode::SourceIn,
            "source-out" => tiny_skia::BlendMode::SourceOut,
            "source-atop" => tiny_skia::BlendMode::SourceAtop,
            "destination-over" => tiny_skia::BlendMode::DestinationOver,
            "destination-in" => tiny_skia::BlendMode::DestinationIn,
            "destination-out" => tiny_skia::BlendMode::DestinationOut,
            "destination-atop" => tiny_skia::BlendMode::DestinationAtop,
            "lighter" => tiny_skia::BlendMode::Plus,
            "copy" => tiny_skia::BlendMode::Source,
            "xor" => tiny_skia::BlendMode::Xor,
            "multiply" => tiny_skia::BlendMode::Multiply,
            "screen" => tiny_skia::BlendMode::Screen,
            "overlay" => tiny_skia::BlendMode::Overlay,
            "darken" => tiny_skia::BlendMode::Darken,
            "lighten" => tiny_skia::BlendMode::Lighten,
            "color-dodge" => tiny_skia::BlendMode::ColorDodge,
            "color-burn" => tiny_skia::BlendMode::ColorBurn,
            "hard-light" => tiny_skia::BlendMode::HardLight,
            "soft-light" => tiny_skia::BlendMode::SoftLight,
            "difference" => tiny_skia::BlendMode::Difference,
            "exclusion" => tiny_skia::BlendMode::Exclusion,
            "hue" => tiny_skia::BlendMode::Hue,
            "saturation" => tiny_skia::BlendMode::Saturation,
            "color" => tiny_skia::BlendMode::Color,
            "luminosity" => tiny_skia::BlendMode::Luminosity,
            _ => return false,
        };
        self.state.global_composite_operation = mode;
        true
    }

    // --- Filters ---

    /// Set the filter from a CSS filter string such as `blur(40px)`.
    /// Per spec: unparseable values are ignored and the previous filter kept.
    /// Returns true if the value was accepted.
    pub fn set_filter(&mut self, filter: &str) -> bool {
        match filter.parse::<CanvasFilter>() {
            Ok(parsed) => {
                self.state.filter = parsed;
                true
            }
            Err(err) => {
                log::debug!(target: "canvas", "ignoring filter: {}", err);
                false
            }
        }
    }

    /// Set the filter from an already parsed value.
    pub fn set_filter_value(&mut self, filter: CanvasFilter) {
        self.state.filter = filter;
    }

    /// Get the current filter.
    pub fn filter(&self) -> CanvasFilter {
        self.state.filter
    }

    // --- Gradients ---

    /// Create a linear gradient.
    pub fn create_linear_gradient(&self, x0: f32, y0: f32, x1: f32, y1: f32) -> CanvasGradient {
        CanvasGradient::new_linear(x0, y0, x1, y1)
    }

    /// Set the fill style to a gradient.
    pub fn set_fill_style_gradient(&mut self, gradient: CanvasGradient) {
        self.state.fill_style = FillStyle::LinearGradient(gradient);
    }
}

/// Parse a CSS color string into a tiny_skia::Color.
pub fn parse_color(s: &str) -> Canvas2dResult<tiny_skia::Color> {
    let parsed = csscolorparser::parse(s)
        .map_err(|e| Canvas2dError::ColorParseError(format!("{}: {}", s, e)))?;

    let [r, g, b, a] = parsed.to_array();
    Ok(tiny_skia::Color::from_rgba(r, g, b, a).unwrap_or(tiny_skia::Color::BLACK))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::RectParams;

    #[test]
    fn test_new_context_defaults() {
        let ctx = Canvas2dContext::new(200, 150).unwrap();
        assert_eq!(ctx.width(), 200);
        assert_eq!(ctx.height(), 150);
        assert_eq!(ctx.state.global_alpha, 1.0);
        assert_eq!(ctx.filter(), CanvasFilter::None);
        // Canvas should be fully transparent
        assert!(ctx.pixmap.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_invalid_dimensions() {
        assert!(matches!(
            Canvas2dContext::new(0, 100),
            Err(Canvas2dError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            Canvas2dContext::new(100, MAX_DIMENSION + 1),
            Err(Canvas2dError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_global_alpha_ignore_invalid() {
        let mut ctx = Canvas2dContext::new(100, 100).unwrap();
        ctx.set_global_alpha(0.5);
        assert_eq!(ctx.state.global_alpha, 0.5);

        // Out-of-range values are ignored (not clamped)
        ctx.set_global_alpha(2.0);
        assert_eq!(ctx.state.global_alpha, 0.5);
        ctx.set_global_alpha(-0.5);
        assert_eq!(ctx.state.global_alpha, 0.5);
        ctx.set_global_alpha(f32::NAN);
        assert_eq!(ctx.state.global_alpha, 0.5);

        ctx.set_global_alpha(1.0);
        assert_eq!(ctx.state.global_alpha, 1.0);
    }

    #[test]
    fn test_global_composite_operation_ignore_invalid() {
        let mut ctx = Canvas2dContext::new(100, 100).unwrap();
        assert_eq!(
            ctx.state.global_composite_operation,
            tiny_skia::BlendMode::SourceOver
        );

        assert!(ctx.set_global_composite_operation("screen"));
        assert_eq!(
            ctx.state.global_composite_operation,
            tiny_skia::BlendMode::Screen
        );

        // Invalid value is ignored, previous mode preserved
        assert!(!ctx.set_global_composite_operation("invalid-mode"));
        assert_eq!(
            ctx.state.global_composite_operation,
            tiny_skia::BlendMode::Screen
        );
    }

    #[test]
    fn test_filter_invalid_keeps_previous() {
        let mut ctx = Canvas2dContext::new(10, 10).unwrap();
        assert!(ctx.set_filter("blur(4px)"));
        assert!(!ctx.set_filter("sepia(1)"));
        assert_eq!(ctx.filter(), CanvasFilter::Blur(4.0));
    }

    #[test]
    fn test_save_restore_state() {
        let mut ctx = Canvas2dContext::new(100, 100).unwrap();
        ctx.set_global_alpha(0.7);
        ctx.set_filter("blur(2px)");
        ctx.translate(10.0, 20.0);
        ctx.save();

        ctx.set_global_alpha(0.3);
        ctx.set_filter("none");
        ctx.translate(30.0, 40.0);
        let t = ctx.get_transform();
        assert_eq!(t.tx, 40.0);
        assert_eq!(t.ty, 60.0);

        ctx.restore();
        assert_eq!(ctx.state.global_alpha, 0.7);
        assert_eq!(ctx.filter(), CanvasFilter::Blur(2.0));
        let t = ctx.get_transform();
        assert_eq!(t.tx, 10.0);
        assert_eq!(t.ty, 20.0);
    }

    #[test]
    fn test_fill_rect_pixels() {
        let mut ctx = Canvas2dContext::new(100, 100).unwrap();
        ctx.set_fill_style("#ff0000").unwrap();
        ctx.fill_rect(&RectParams {
            x: 10.0,
            y: 10.0,
            width: 50.0,
            height: 50.0,
        });

        let data = ctx.get_image_data(0, 0, 100, 100);
        let idx = (30 * 100 + 30) * 4;
        assert_eq!(&data[idx..idx + 4], &[255, 0, 0, 255]);

        let idx_out = (5 * 100 + 5) * 4;
        assert_eq!(data[idx_out + 3], 0);
    }

    #[test]
    fn test_parse_color_variants() {
        let c = parse_color("rgba(0, 0, 255, 0.5)").unwrap();
        assert_eq!(c.blue(), 1.0);
        assert_eq!(c.alpha(), 0.5);
        assert!(matches!(
            parse_color("not-a-color"),
            Err(Canvas2dError::ColorParseError(_))
        ));
    }
}
