//! View state of one gradient card.

use crate::download::{download, BlobStore, DownloadSink};
use crate::error::{ExportError, ExportResult};
use crate::export::RasterExporter;
use crate::geometry::{Blob, BlobLayout};
use crate::request::{ExportFormat, ExportRequest, ScaleFactor};
use crate::spec::GradientSpec;
use std::cell::Cell;

/// Whether an export is in flight for a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportState {
    #[default]
    Idle,
    Exporting,
}

/// Resets the card to idle however the export ends, cancellation included.
struct ExportingGuard<'a>(&'a Cell<ExportState>);

impl Drop for ExportingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(ExportState::Idle);
    }
}

/// A gradient on screen: its description, container size and blob layout.
#[derive(Debug)]
pub struct GradientCard {
    spec: GradientSpec,
    width: u32,
    height: u32,
    layout: Option<BlobLayout>,
    rng: fastrand::Rng,
    file_name_base: Option<String>,
    state: Cell<ExportState>,
}

impl GradientCard {
    /// Create a card. Blob cards lay out their blobs immediately.
    pub fn new(
        spec: GradientSpec,
        width: u32,
        height: u32,
        exporter: &RasterExporter,
        mut rng: fastrand::Rng,
        rich: bool,
    ) -> Self {
        let layout = match &spec {
            GradientSpec::Blob { colors, .. } => Some(BlobLayout::new(
                colors.clone(),
                width as f64,
                height as f64,
                exporter.config().blob_options(rich),
                fastrand::Rng::with_seed(rng.u64(..)),
            )),
            GradientSpec::Linear { .. } => None,
        };
        let mut card = Self {
            spec,
            width,
            height,
            layout,
            rng,
            file_name_base: None,
            state: Cell::new(ExportState::Idle),
        };
        card.sync_blobs();
        card
    }

    /// Name downloads `{base}.{ext}` instead of after the gradient kind.
    pub fn with_file_name_base(mut self, base: &str) -> Self {
        self.file_name_base = Some(base.to_string());
        self
    }

    pub fn spec(&self) -> &GradientSpec {
        &self.spec
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn state(&self) -> ExportState {
        self.state.get()
    }

    pub fn blobs(&self) -> &[Blob] {
        self.layout.as_ref().map(|layout| layout.blobs()).unwrap_or(&[])
    }

    /// Container size changed. Returns true if the blob layout was recomputed.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        self.width = width;
        self.height = height;
        let recomputed = self
            .layout
            .as_mut()
            .is_some_and(|layout| layout.resize(width as f64, height as f64));
        if recomputed {
            self.sync_blobs();
        }
        recomputed
    }

    /// Regenerate the composition: a new color order for linear gradients,
    /// a new layout for blob gradients.
    pub fn shuffle(&mut self) {
        match (&mut self.spec, &mut self.layout) {
            (GradientSpec::Linear { colors, .. }, _) => self.rng.shuffle(colors),
            (GradientSpec::Blob { .. }, Some(layout)) => layout.shuffle(),
            (GradientSpec::Blob { .. }, None) => {}
        }
        self.sync_blobs();
    }

    fn sync_blobs(&mut self) {
        if let (GradientSpec::Blob { blobs, .. }, Some(layout)) = (&mut self.spec, &self.layout) {
            *blobs = layout.blobs().to_vec();
        }
    }

    /// Export the card as it is on screen and hand the file to `sink`.
    ///
    /// Refuses to start while another export of this card is pending, and
    /// always returns to [`ExportState::Idle`] afterwards.
    pub async fn export(
        &self,
        exporter: &RasterExporter,
        scale: ScaleFactor,
        format: ExportFormat,
        store: &BlobStore,
        sink: &mut dyn DownloadSink,
    ) -> ExportResult<String> {
        if self.state.get() == ExportState::Exporting {
            return Err(ExportError::InvalidRequest(
                "an export of this gradient is already in progress".to_string(),
            ));
        }
        self.state.set(ExportState::Exporting);
        let _guard = ExportingGuard(&self.state);

        let mut request =
            ExportRequest::new(self.spec.clone(), self.width, self.height, scale, format);
        if let Some(base) = &self.file_name_base {
            request = request.with_file_name_base(base);
        }
        let result = exporter.export_in_background(request).await.map_err(|err| {
            log::error!(target: "export", "export of {} failed: {}", self.spec.kind_name(), err);
            err
        })?;
        download(result, store, sink)
    }
}
