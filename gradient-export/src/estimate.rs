//! Advisory output size estimates.
//!
//! The numbers are a heuristic shown before exporting. They never influence
//! the export itself and real files may differ considerably.

use crate::request::{ExportFormat, ScaleFactor};

/// Extra headroom over the compressed estimate.
const SAFETY_MARGIN: f64 = 1.2;

fn compression_ratio(format: ExportFormat) -> f64 {
    match format {
        ExportFormat::Png => 0.3,
        ExportFormat::Webp => 0.2,
        ExportFormat::Jpg => 0.15,
    }
}

/// Estimated encoded size in bytes.
pub fn estimate_bytes(width: u32, height: u32, scale: ScaleFactor, format: ExportFormat) -> u64 {
    let s = scale.value() as f64;
    let raw = width as f64 * height as f64 * s * s * 4.0;
    (raw * compression_ratio(format) * SAFETY_MARGIN).round() as u64
}

/// Format a byte count as `B`, `KB` or `MB` using 1024-based units.
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = 1024.0 * 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{} B", bytes)
    } else if b < MB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / MB)
    }
}

/// Human readable size estimate for an export.
pub fn estimate(width: u32, height: u32, scale: ScaleFactor, format: ExportFormat) -> String {
    format_size(estimate_bytes(width, height, scale, format))
}
