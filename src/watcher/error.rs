//! Error types for the watch loop.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from watcher operations.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("failed to initialize watcher: {reason}")]
    InitFailed { reason: String },

    #[error("cannot watch path {}: {reason}", path.display())]
    PathWatchFailed { path: PathBuf, reason: String },

    #[error("event channel closed unexpectedly")]
    ChannelClosed,
}

impl From<notify::Error> for WatchError {
    fn from(e: notify::Error) -> Self {
        WatchError::InitFailed {
            reason: e.to_string(),
        }
    }
}
