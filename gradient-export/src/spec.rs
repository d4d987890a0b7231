//! Declarative gradient descriptions.

use crate::error::{ExportError, ExportResult};
use crate::geometry::Blob;
use serde::{Deserialize, Serialize};

/// Stop placement for linear gradients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinearVariant {
    /// Up to four colors, evenly spaced.
    #[default]
    Default,
    /// Exactly three stops at 0%, 50% and 100%.
    Smooth,
}

/// Background treatment for blob gradients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlobVariant {
    Light,
    #[default]
    Dark,
    /// No background; the blobs alone cover the canvas.
    Random,
}

impl std::str::FromStr for LinearVariant {
    type Err = ExportError;

    fn from_str(s: &str) -> ExportResult<Self> {
        match s {
            "default" => Ok(LinearVariant::Default),
            "smooth" => Ok(LinearVariant::Smooth),
            _ => Err(ExportError::InvalidRequest(format!(
                "unknown linear variant: {}",
                s
            ))),
        }
    }
}

impl std::str::FromStr for BlobVariant {
    type Err = ExportError;

    fn from_str(s: &str) -> ExportResult<Self> {
        match s {
            "light" => Ok(BlobVariant::Light),
            "dark" => Ok(BlobVariant::Dark),
            "random" => Ok(BlobVariant::Random),
            _ => Err(ExportError::InvalidRequest(format!(
                "unknown blob variant: {}",
                s
            ))),
        }
    }
}

/// A gradient's colors and geometry.
///
/// Blob layouts are derived data: they are recomputed on every regeneration
/// and are skipped when serializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GradientSpec {
    Linear {
        colors: Vec<String>,
        #[serde(rename = "angleDegrees", alias = "angle", default)]
        angle_degrees: f64,
        #[serde(default)]
        variant: LinearVariant,
    },
    Blob {
        colors: Vec<String>,
        #[serde(default)]
        variant: BlobVariant,
        #[serde(skip)]
        blobs: Vec<Blob>,
    },
}

const KNOWN_KINDS: &[&str] = &["linear", "blob"];

impl GradientSpec {
    /// Parse a serialized description.
    ///
    /// An unrecognized `"type"` is reported as [`ExportError::UnknownGradientType`]
    /// so callers can skip that gradient and carry on.
    pub fn from_json(json: &str) -> ExportResult<Self> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| ExportError::InvalidRequest(format!("invalid gradient JSON: {}", e)))?;
        let kind = value
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or_else(|| ExportError::InvalidRequest("gradient is missing \"type\"".to_string()))?;
        if !KNOWN_KINDS.contains(&kind) {
            log::warn!(target: "export", "skipping gradient of unknown type {:?}", kind);
            return Err(ExportError::UnknownGradientType(kind.to_string()));
        }
        let spec: GradientSpec = serde_json::from_value(value)
            .map_err(|e| ExportError::InvalidRequest(format!("invalid gradient: {}", e)))?;
        spec.validate()?;
        Ok(spec)
    }

    /// Serialize to JSON, without derived blob data.
    pub fn to_json(&self) -> ExportResult<String> {
        serde_json::to_string(self)
            .map_err(|e| ExportError::InvalidRequest(format!("cannot serialize gradient: {}", e)))
    }

    /// Check structural requirements that serde cannot express.
    pub fn validate(&self) -> ExportResult<()> {
        match self {
            GradientSpec::Linear {
                colors,
                angle_degrees,
                ..
            } => {
                if colors.is_empty() {
                    return Err(ExportError::InvalidRequest(
                        "a linear gradient needs at least one color".to_string(),
                    ));
                }
                if !angle_degrees.is_finite() {
                    return Err(ExportError::InvalidRequest(
                        "gradient angle must be finite".to_string(),
                    ));
                }
            }
            GradientSpec::Blob { .. } => {}
        }
        Ok(())
    }

    /// The gradient kind as it appears in serialized form.
    pub fn kind_name(&self) -> &'static str {
        match self {
            GradientSpec::Linear { .. } => "linear",
            GradientSpec::Blob { .. } => "blob",
        }
    }

    /// File name base used when the caller does not pick one.
    pub fn default_file_base(&self) -> String {
        format!("gradient-{}", self.kind_name())
    }

    pub fn colors(&self) -> &[String] {
        match self {
            GradientSpec::Linear { colors, .. } | GradientSpec::Blob { colors, .. } => colors,
        }
    }
}
