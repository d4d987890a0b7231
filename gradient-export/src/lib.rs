// Allow uninlined format args for cleaner log!/format! macros
#![allow(clippy::uninlined_format_args)]
#![doc = include_str!("../README.md")]

#[macro_use]
extern crate lazy_static;

pub mod card;
pub mod color;
pub mod config;
pub mod dom;
pub mod download;
pub mod encode;
pub mod error;
pub mod estimate;
pub mod export;
pub mod geometry;
pub mod palette;
pub mod rasterizer;
pub mod request;
pub mod spec;

pub use card::{ExportState, GradientCard};
pub use color::{normalize, normalize_all, ColorSet, SENTINEL_COLOR};
pub use config::ExportConfig;
pub use download::{download, BlobStore, DirectorySink, DownloadSink, ObjectUrl};
pub use error::{ExportError, ExportResult};
pub use estimate::estimate;
pub use export::RasterExporter;
pub use geometry::{Blob, BlobLayout, BlobRegion};
pub use rasterizer::{BoxRasterizer, RasterizeOptions, SnapshotRasterizer};
pub use request::{ExportFormat, ExportRequest, RasterResult, ScaleFactor};
pub use spec::{BlobVariant, GradientSpec, LinearVariant};

pub use gradient_canvas2d;
