//! Error types for gradient export.

use gradient_canvas2d::Canvas2dError;
use thiserror::Error;

/// Result type alias using ExportError.
pub type ExportResult<T> = Result<T, ExportError>;

/// Errors that abort an export attempt and surface to the initiating action.
///
/// Color-level problems never appear here: they are recovered inside the
/// normalizer and degrade to a visible sentinel color.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The offscreen canvas could not be created.
    #[error("Canvas context unavailable: {0}")]
    CanvasContextUnavailable(String),

    /// An SVG or image source could not be decoded.
    #[error("Failed to load image: {0}")]
    ImageDecodeFailure(String),

    /// Snapshot export was requested but no DOM-to-canvas renderer is installed.
    #[error("Snapshot rasterization is not available; install or enable rasterization support")]
    RasterizationCapabilityMissing,

    /// Encoding the canvas produced no data.
    #[error("Failed to create image: {0}")]
    EncodeFailure(String),

    /// A serialized gradient carried a kind this build does not know.
    #[error("Unknown gradient type: {0}")]
    UnknownGradientType(String),

    /// The request or gradient description is malformed.
    #[error("Invalid export request: {0}")]
    InvalidRequest(String),

    /// Handing the encoded file to the download surface failed.
    #[error("Download failed: {0}")]
    DownloadFailure(String),
}

impl ExportError {
    /// Whether the message tells the user how to fix the problem, rather than
    /// reporting a generic failure.
    pub fn is_user_actionable(&self) -> bool {
        matches!(self, ExportError::RasterizationCapabilityMissing)
    }
}

impl From<Canvas2dError> for ExportError {
    fn from(err: Canvas2dError) -> Self {
        match err {
            Canvas2dError::InvalidDimensions { .. } => {
                ExportError::CanvasContextUnavailable(err.to_string())
            }
            Canvas2dError::PngError(_) => {
                ExportError::EncodeFailure(err.to_string())
            }
            Canvas2dError::ColorParseError(_) | Canvas2dError::FilterParseError(_) => {
                ExportError::InvalidRequest(err.to_string())
            }
        }
    }
}

impl From<image::ImageError> for ExportError {
    fn from(err: image::ImageError) -> Self {
        ExportError::EncodeFailure(err.to_string())
    }
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::DownloadFailure(err.to_string())
    }
}
