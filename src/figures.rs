//! Figures document synchronization.
//!
//! The figures document is a single JSON file at the tutorial root
//! listing named diagram assets. It is small, monolithic, and edited
//! atomically, so every sync re-parses it wholesale and republishes
//! the referenced assets; there is no incremental diff. A parse
//! failure is fail-safe: the previously published document and assets
//! stay in place.
//!
//! Figures never touch the content tree; content nodes reference
//! figures by name only.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::importer::ImportError;

/// One named diagram asset, `file` relative to the figures document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Figure {
    pub name: String,
    pub file: PathBuf,
}

/// Parsed figures document. Replaced wholesale on every re-parse.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FiguresDocument {
    #[serde(default)]
    pub figures: Vec<Figure>,
}

/// Destination for published figure assets.
pub trait AssetStore: Send + Sync {
    fn publish(&self, name: &str, bytes: &[u8]) -> std::io::Result<()>;
}

/// Asset store writing each figure into a flat directory by name.
pub struct DirAssetStore {
    dir: PathBuf,
}

impl DirAssetStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl AssetStore for DirAssetStore {
    fn publish(&self, name: &str, bytes: &[u8]) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.dir.join(name), bytes)
    }
}

/// Owns the figures document for one tutorial root and republishes its
/// assets on change.
pub struct FiguresSync {
    figures_path: PathBuf,
    store: Box<dyn AssetStore>,
    document: Option<FiguresDocument>,
}

impl FiguresSync {
    pub fn new(figures_path: PathBuf, store: Box<dyn AssetStore>) -> Self {
        Self {
            figures_path,
            store,
            document: None,
        }
    }

    pub fn figures_path(&self) -> &Path {
        &self.figures_path
    }

    /// The last successfully parsed document, if any.
    pub fn document(&self) -> Option<&FiguresDocument> {
        self.document.as_ref()
    }

    /// Re-parse the figures document in full and publish its assets.
    ///
    /// Returns the number of assets published. A missing asset file is
    /// logged and skipped; a document that fails to parse leaves the
    /// prior document (and everything already published) untouched.
    pub fn sync_figures(&mut self) -> Result<usize, ImportError> {
        let raw = fs::read_to_string(&self.figures_path).map_err(|source| {
            ImportError::FilesystemUnreadable {
                path: self.figures_path.clone(),
                source,
            }
        })?;

        let document: FiguresDocument =
            serde_json::from_str(&raw).map_err(|e| ImportError::MalformedContent {
                path: self.figures_path.clone(),
                reason: e.to_string(),
            })?;

        let base = self
            .figures_path
            .parent()
            .unwrap_or_else(|| Path::new("."));

        let mut published = 0;
        for figure in &document.figures {
            let source = base.join(&figure.file);
            match fs::read(&source) {
                Ok(bytes) => match self.store.publish(&figure.name, &bytes) {
                    Ok(()) => published += 1,
                    Err(e) => {
                        tracing::warn!("failed to publish figure {}: {e}", figure.name);
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        "figure {} references missing file {}: {e}",
                        figure.name,
                        source.display()
                    );
                }
            }
        }

        tracing::info!(
            "figures synced: {published} of {} assets published",
            document.figures.len()
        );
        self.document = Some(document);
        Ok(published)
    }
}
