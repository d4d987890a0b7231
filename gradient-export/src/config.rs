//! Visual tuning parameters for export.
//!
//! The defaults reproduce the on-screen preview. They are empirical values,
//! so every one of them can be overridden from a JSON file.

use crate::error::{ExportError, ExportResult};
use crate::geometry::BlobOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tuning constants used by the parametric exporter and the encoders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Blob blur standard deviation in CSS pixels at 1× scale.
    pub blur_radius: f32,
    /// Opacity each blob is painted with.
    pub blob_opacity: f32,
    /// Composite operation used while painting blobs.
    pub blob_composite_operation: String,
    /// Blob diameter as a fraction of the larger container side.
    pub blob_size_factor: f64,
    /// Maximum blob center displacement as a fraction of the container size.
    pub blob_jitter: f64,
    /// Per-blob size multiplier range for the rich layout.
    pub blob_size_variance: (f64, f64),
    /// Background painted under blobs for the dark variant.
    pub dark_background: String,
    /// Background painted under blobs for the light variant.
    pub light_background: String,
    /// Ordered dither amplitude in 8-bit levels, applied before lossy encoding.
    pub dither_amplitude: f32,
    /// JPEG quality in `0.0..=1.0`.
    pub jpeg_quality: f32,
    /// WebP quality in `0.0..=1.0`. The WebP encoder is lossless, so this is unused.
    pub webp_quality: f32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            blur_radius: 40.0,
            blob_opacity: 0.9,
            blob_composite_operation: "source-over".to_string(),
            blob_size_factor: 0.8,
            blob_jitter: 0.1,
            blob_size_variance: (0.7, 1.3),
            dark_background: "#0a0a0a".to_string(),
            light_background: "#ffffff".to_string(),
            dither_amplitude: 2.0,
            jpeg_quality: 0.92,
            webp_quality: 0.85,
        }
    }
}

impl ExportConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> ExportResult<Self> {
        let config: ExportConfig = serde_json::from_str(json)
            .map_err(|e| ExportError::InvalidRequest(format!("invalid export config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn from_json_file(path: &Path) -> ExportResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            ExportError::InvalidRequest(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Reject values no export could honor.
    pub fn validate(&self) -> ExportResult<()> {
        let unit = 0.0..=1.0;
        if !self.blur_radius.is_finite() || self.blur_radius < 0.0 {
            return Err(invalid("blur_radius must be a non-negative number"));
        }
        if !unit.contains(&self.blob_opacity) {
            return Err(invalid("blob_opacity must be within 0..=1"));
        }
        if !unit.contains(&self.jpeg_quality) || !unit.contains(&self.webp_quality) {
            return Err(invalid("encoder quality must be within 0..=1"));
        }
        if !(0.0..=127.0).contains(&self.dither_amplitude) {
            return Err(invalid("dither_amplitude must be within 0..=127"));
        }
        if !self.blob_size_factor.is_finite()
            || self.blob_size_factor <= 0.0
            || !(0.0..=0.5).contains(&self.blob_jitter)
        {
            return Err(invalid("blob size factor must be positive and jitter within 0..=0.5"));
        }
        let (low, high) = self.blob_size_variance;
        if low.is_nan() || low <= 0.0 || high.is_nan() || low > high {
            return Err(invalid("blob_size_variance must be an increasing positive range"));
        }
        Ok(())
    }

    /// JPEG quality on the encoder's 1..=100 scale.
    pub fn jpeg_quality_percent(&self) -> u8 {
        (self.jpeg_quality * 100.0).round().clamp(1.0, 100.0) as u8
    }

    /// WebP quality on the encoder's 0..=100 scale.
    pub fn webp_quality_percent(&self) -> f32 {
        (self.webp_quality * 100.0).clamp(0.0, 100.0)
    }

    /// Blob placement options. The rich layout varies each blob's size.
    pub fn blob_options(&self, rich: bool) -> BlobOptions {
        BlobOptions {
            size_factor: self.blob_size_factor,
            jitter: self.blob_jitter,
            size_variance: rich.then_some(self.blob_size_variance),
            shuffle_colors: true,
        }
    }
}

fn invalid(msg: &str) -> ExportError {
    ExportError::InvalidRequest(msg.to_string())
}
