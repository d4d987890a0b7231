//! Offscreen Canvas 2D subset used for gradient export.
//!
//! This crate provides the handful of Canvas 2D operations needed to paint
//! parametric gradients without a browser:
//! - `tiny-skia` for 2D rasterization
//! - `csscolorparser` for CSS color strings
//! - `png` for lossless output
//!
//! # Example
//!
//! ```rust,ignore
//! use gradient_canvas2d::{Canvas2dContext, CanvasColor, RectParams};
//!
//! let mut ctx = Canvas2dContext::new(400, 300)?;
//! let mut gradient = ctx.create_linear_gradient(0.0, 0.0, 400.0, 0.0);
//! gradient.add_color_stop(0.0, CanvasColor::from_rgba8(255, 0, 0, 255));
//! gradient.add_color_stop(1.0, CanvasColor::from_rgba8(0, 0, 255, 255));
//! ctx.set_fill_style_gradient(gradient);
//! ctx.fill_rect(&RectParams { x: 0.0, y: 0.0, width: 400.0, height: 300.0 });
//! let png_data = ctx.to_png(None)?;
//! ```

mod arc;
mod context;
mod drawing_state;
mod error;
mod filter;
mod geometry;
mod gradient;
mod style;

// Re-export public API
pub use context::{parse_color, Canvas2dContext};
pub use drawing_state::DrawingState;
pub use error::{Canvas2dError, Canvas2dResult};
pub use filter::{apply_gaussian_blur, CanvasFilter};
pub use geometry::{ArcParams, CanvasColor, RectParams};
pub use gradient::{CanvasGradient, GradientStop};
pub use style::FillStyle;
