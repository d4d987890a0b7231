//! Drawing state that can be saved and restored.

use crate::filter::CanvasFilter;
use crate::style::FillStyle;
use tiny_skia::Transform;

/// Drawing state that can be saved and restored.
#[derive(Debug, Clone)]
pub struct DrawingState {
    /// Current fill style.
    pub fill_style: FillStyle,
    /// Current global alpha.
    pub global_alpha: f32,
    /// Current global composite operation (blend mode).
    pub global_composite_operation: tiny_skia::BlendMode,
    /// Current filter applied to fill operations.
    pub filter: CanvasFilter,
    /// Current transform matrix.
    pub transform: Transform,
}

impl Default for DrawingState {
    fn default() -> Self {
        Self {
            fill_style: FillStyle::default(),
            global_alpha: 1.0,
            global_composite_operation: tiny_skia::BlendMode::SourceOver,
            filter: CanvasFilter::None,
            transform: Transform::identity(),
        }
    }
}
