//! Tutorial content import and live synchronization.
//!
//! Ingests a tree of numbered tutorial content (sections, tasks,
//! articles, plus a figures document) from disk into an in-memory
//! [`tree::ContentTree`], and keeps it synchronized: a one-shot bulk
//! import at startup, and a watch mode that re-syncs subtrees on
//! debounced filesystem events and broadcasts changed node ids to a
//! live-reload collaborator.

pub mod classify;
pub mod config;
pub mod figures;
pub mod importer;
pub mod logging;
pub mod notifier;
pub mod parser;
pub mod tree;
pub mod watcher;

pub use classify::{Classification, Role, classify};
pub use config::Settings;
pub use figures::{AssetStore, DirAssetStore, FiguresDocument, FiguresSync};
pub use importer::{ImportError, Importer, SyncOutcome, calculate_hash};
pub use notifier::{ChangeNotifier, TreeChangeEvent};
pub use tree::{ContentNode, ContentTree, NodeKind, NodeMeta};
pub use watcher::{Debouncer, TutorialWatcher, WatchError};
