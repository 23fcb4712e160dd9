//! Error types for import operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from importing or re-synchronizing tutorial content.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("cannot read {}: {source}", path.display())]
    FilesystemUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed content in {}: {reason}", path.display())]
    MalformedContent { path: PathBuf, reason: String },
}
