//! Download surface: object URLs and sinks for encoded files.

use crate::error::{ExportError, ExportResult};
use crate::request::RasterResult;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

const URL_PREFIX: &str = "blob:gradient-export/";

/// Holds encoded bytes behind `blob:` URLs.
#[derive(Debug, Default)]
pub struct BlobStore {
    entries: RefCell<HashMap<String, Rc<[u8]>>>,
    next_id: Cell<u64>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `bytes` under a fresh URL, revoked when the guard is dropped.
    pub fn create_object_url(&self, bytes: Vec<u8>) -> ObjectUrl<'_> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let url = format!("{}{}", URL_PREFIX, id);
        self.entries.borrow_mut().insert(url.clone(), bytes.into());
        ObjectUrl { store: self, url }
    }

    /// Bytes behind a live URL.
    pub fn resolve(&self, url: &str) -> Option<Rc<[u8]>> {
        self.entries.borrow().get(url).cloned()
    }

    pub fn revoke(&self, url: &str) {
        if self.entries.borrow_mut().remove(url).is_some() {
            log::debug!(target: "export", "revoked {}", url);
        }
    }

    /// Number of URLs not yet revoked.
    pub fn live_count(&self) -> usize {
        self.entries.borrow().len()
    }
}

/// A live object URL; revoked on drop.
#[derive(Debug)]
pub struct ObjectUrl<'a> {
    store: &'a BlobStore,
    url: String,
}

impl ObjectUrl<'_> {
    pub fn as_str(&self) -> &str {
        &self.url
    }
}

impl Drop for ObjectUrl<'_> {
    fn drop(&mut self) {
        self.store.revoke(&self.url);
    }
}

/// Receives downloaded files.
pub trait DownloadSink {
    /// Save one file. Called exactly once per successful export.
    fn save(&mut self, file_name: &str, bytes: &[u8]) -> ExportResult<()>;
}

/// Writes downloads into a directory, creating it if needed.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }
}

impl DownloadSink for DirectorySink {
    fn save(&mut self, file_name: &str, bytes: &[u8]) -> ExportResult<()> {
        // Only a bare file name may come through; anything else would escape the directory.
        if file_name.is_empty()
            || Path::new(file_name).file_name().and_then(|n| n.to_str()) != Some(file_name)
        {
            return Err(ExportError::DownloadFailure(format!(
                "invalid file name: {:?}",
                file_name
            )));
        }
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(file_name);
        std::fs::write(&path, bytes)?;
        log::info!(target: "export", "saved {}", path.display());
        Ok(())
    }
}

/// Hand an export to the download surface.
///
/// The result is consumed. Its bytes live behind an object URL only for the
/// duration of the hand-off; the URL is revoked whether or not the sink
/// succeeds. Returns the downloaded file name.
pub fn download(
    result: RasterResult,
    store: &BlobStore,
    sink: &mut dyn DownloadSink,
) -> ExportResult<String> {
    let RasterResult {
        bytes, file_name, ..
    } = result;
    let url = store.create_object_url(bytes);
    let data = store
        .resolve(url.as_str())
        .ok_or_else(|| ExportError::DownloadFailure(format!("{} was revoked", url.as_str())))?;
    log::debug!(target: "export", "downloading {} from {}", file_name, url.as_str());
    sink.save(&file_name, &data)?;
    Ok(file_name)
}
