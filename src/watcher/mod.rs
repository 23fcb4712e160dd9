//! Filesystem watcher for live tutorial synchronization.
//!
//! One watcher task per tutorial root drives the whole live-update
//! path:
//!
//! ```text
//! notify events -> classify -> Debouncer (subtree merge)
//!                                  |
//!                         quiet for debounce_ms
//!                                  |
//!               Importer::sync / FiguresSync::sync_figures
//!                                  |
//!                            ChangeNotifier
//! ```
//!
//! Directory removals bypass the debounce window and are applied to
//! the tree immediately; everything else is coalesced per subtree.

mod debouncer;
mod error;
mod tutorial;

pub use debouncer::Debouncer;
pub use error::WatchError;
pub use tutorial::{TutorialWatcher, TutorialWatcherBuilder};
