//! Export requests and their results.

use crate::error::{ExportError, ExportResult};
use crate::spec::GradientSpec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output resolution multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaleFactor {
    #[default]
    X1,
    X2,
    X3,
}

impl ScaleFactor {
    pub fn value(self) -> u32 {
        match self {
            ScaleFactor::X1 => 1,
            ScaleFactor::X2 => 2,
            ScaleFactor::X3 => 3,
        }
    }
}

impl TryFrom<u32> for ScaleFactor {
    type Error = ExportError;

    fn try_from(value: u32) -> ExportResult<Self> {
        match value {
            1 => Ok(ScaleFactor::X1),
            2 => Ok(ScaleFactor::X2),
            3 => Ok(ScaleFactor::X3),
            _ => Err(ExportError::InvalidRequest(format!(
                "scale factor must be 1, 2 or 3, got {}",
                value
            ))),
        }
    }
}

/// Encoded output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    #[serde(alias = "jpeg")]
    Jpg,
    Webp,
}

impl ExportFormat {
    /// File extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpg => "jpg",
            ExportFormat::Webp => "webp",
        }
    }

    /// Whether the encoder may discard information, which is when dithering pays off.
    pub fn is_lossy(self) -> bool {
        !matches!(self, ExportFormat::Png)
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> ExportResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpg" | "jpeg" => Ok(ExportFormat::Jpg),
            "webp" => Ok(ExportFormat::Webp),
            _ => Err(ExportError::InvalidRequest(format!(
                "unsupported format: {}",
                s
            ))),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// One parametric export, immutable once handed to the exporter.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    pub spec: GradientSpec,
    pub width: u32,
    pub height: u32,
    pub scale: ScaleFactor,
    pub format: ExportFormat,
    pub file_name_base: String,
}

impl ExportRequest {
    /// A request using the gradient's default file name base.
    pub fn new(
        spec: GradientSpec,
        width: u32,
        height: u32,
        scale: ScaleFactor,
        format: ExportFormat,
    ) -> Self {
        let file_name_base = spec.default_file_base();
        Self {
            spec,
            width,
            height,
            scale,
            format,
            file_name_base,
        }
    }

    pub fn with_file_name_base(mut self, base: impl Into<String>) -> Self {
        self.file_name_base = base.into();
        self
    }

    /// Pixel dimensions of the output.
    pub fn output_size(&self) -> (u32, u32) {
        let s = self.scale.value();
        (self.width * s, self.height * s)
    }
}

/// `{base}.{extension}`
pub fn file_name(base: &str, format: ExportFormat) -> String {
    format!("{}.{}", base, format.extension())
}

/// Encoded bytes of one export plus their pixel dimensions.
///
/// Deliberately not `Clone`: the download surface consumes it exactly once.
#[derive(Debug, PartialEq)]
pub struct RasterResult {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: ExportFormat,
    pub file_name: String,
}
