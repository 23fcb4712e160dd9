//! The per-root watch loop.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{Event, EventKind, RecursiveMode, Watcher};
use tokio::sync::{RwLock, mpsc};
use tokio::time::{Duration, sleep};

use crate::classify::{Classification, Role, classify};
use crate::config::Settings;
use crate::figures::{AssetStore, DirAssetStore, FiguresSync};
use crate::importer::Importer;
use crate::notifier::{ChangeNotifier, TreeChangeEvent};
use crate::tree::ContentTree;

use super::debouncer::Debouncer;
use super::error::WatchError;

/// Watches one tutorial root and keeps its [`ContentTree`] synchronized
/// with disk.
///
/// Raw events are classified, noise is dropped, and the rest is
/// debounced per subtree before [`Importer::sync`] (or the figures
/// sync) runs. Changed node ids go to the [`ChangeNotifier`] after
/// each completed sync. Errors during event processing are logged and
/// never fatal.
pub struct TutorialWatcher {
    root: PathBuf,
    figures_filename: String,
    tree: Arc<RwLock<ContentTree>>,
    importer: Importer,
    figures: FiguresSync,
    notifier: ChangeNotifier,
    debouncer: Debouncer,
    /// The figures document is debounced on its own: a pending subtree
    /// job covering the root must not absorb (and thereby drop) a
    /// queued figures sync.
    figures_debouncer: Debouncer,
    /// Channel for receiving file events.
    event_rx: mpsc::Receiver<notify::Result<Event>>,
    /// The underlying file watcher (kept alive by storing it).
    _watcher: notify::RecommendedWatcher,
}

impl TutorialWatcher {
    /// Create a builder for configuring the watcher.
    pub fn builder() -> TutorialWatcherBuilder {
        TutorialWatcherBuilder::new()
    }

    /// Run the watch loop until the event channel closes.
    ///
    /// The loop:
    /// 1. Receives file events from notify
    /// 2. Classifies and debounces them per subtree
    /// 3. Applies directory removals immediately
    /// 4. Syncs paths once they have been quiet for the debounce window
    /// 5. Broadcasts changed ids after each sync
    pub async fn watch(mut self) -> Result<(), WatchError> {
        self._watcher
            .watch(&self.root, RecursiveMode::Recursive)
            .map_err(|e| WatchError::PathWatchFailed {
                path: self.root.clone(),
                reason: e.to_string(),
            })?;

        crate::log_event!("watcher", "started", "{}", self.root.display());

        loop {
            // Periodic check for debounced jobs
            let timeout = sleep(Duration::from_millis(100));
            tokio::pin!(timeout);

            tokio::select! {
                maybe = self.event_rx.recv() => match maybe {
                    Some(Ok(event)) => self.handle_event(event).await,
                    Some(Err(e)) => tracing::error!("[watcher] file watch error: {e}"),
                    None => return Err(WatchError::ChannelClosed),
                },

                // Process jobs that survived the debounce window
                _ = &mut timeout => {
                    for path in self.figures_debouncer.take_ready() {
                        self.run_sync(&path).await;
                    }
                    for path in self.debouncer.take_ready() {
                        self.run_sync(&path).await;
                    }
                }
            }
        }
    }

    /// Classify and queue (or directly apply) one raw event.
    async fn handle_event(&mut self, event: Event) {
        let Event { kind, paths, .. } = event;

        for path in paths {
            match classify(&self.root, &self.figures_filename, &path) {
                Classification::Ignored => {
                    crate::debug_event!("watcher", "ignored", "{kind:?} {}", path.display());
                }

                Classification::Matched {
                    role: Role::Figures,
                    ..
                } => match kind {
                    EventKind::Remove(_) => {
                        // Nothing to republish; keep prior assets.
                        self.figures_debouncer.remove(&path);
                    }
                    EventKind::Create(_) | EventKind::Modify(_) => {
                        self.figures_debouncer.record(path);
                    }
                    _ => {}
                },

                Classification::Matched {
                    role: Role::Section,
                    ..
                } => match kind {
                    // Directory removal is synchronous: the tree
                    // invariant requires nodes to vanish with their
                    // backing directory while descendant events may
                    // still be queued.
                    EventKind::Remove(_) => self.remove_directory(&path).await,
                    EventKind::Create(_) | EventKind::Modify(_) => {
                        self.debouncer.record(path);
                    }
                    _ => {}
                },

                Classification::Matched {
                    role: Role::Task | Role::Article,
                    parent,
                    ..
                } => match kind {
                    // A leaf event re-syncs its containing section.
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {
                        self.debouncer.record(parent);
                    }
                    _ => {}
                },
            }
        }
    }

    /// Apply a directory removal immediately, bypassing the debounce.
    async fn remove_directory(&mut self, path: &Path) {
        self.debouncer.remove_subtree(path);

        let removed = {
            let mut tree = self.tree.write().await;
            tree.remove(path)
        };

        match removed {
            Some(node) => {
                let mut ids = Vec::new();
                node.collect_ids(&mut ids);
                crate::log_event!(
                    "watcher",
                    "removed",
                    "{} ({} nodes)",
                    path.display(),
                    ids.len()
                );
                self.notifier.notify(TreeChangeEvent::PathsRemoved { ids });
            }
            None => {
                crate::debug_event!("watcher", "stale remove", "{}", path.display());
            }
        }
    }

    /// Run the sync for a debounced path.
    async fn run_sync(&mut self, path: &Path) {
        if path == self.figures.figures_path() {
            match self.figures.sync_figures() {
                Ok(count) => {
                    crate::log_event!("figures", "synced", "{count} assets");
                    self.notifier.notify(TreeChangeEvent::FiguresChanged);
                }
                Err(e) => tracing::error!("[figures] sync failed: {e}"),
            }
            return;
        }

        // The subtree may have vanished while the job was pending;
        // climb to the nearest surviving ancestor and re-evaluate there.
        let target = self.existing_target(path);

        let result = {
            let mut tree = self.tree.write().await;
            self.importer.sync(&mut tree, &target)
        };

        match result {
            Ok(outcome) => {
                if !outcome.changed.is_empty() {
                    crate::log_event!(
                        "watcher",
                        "synced",
                        "{} ({} changed)",
                        target.display(),
                        outcome.changed.len()
                    );
                    self.notifier.notify(TreeChangeEvent::PathsChanged {
                        ids: outcome.changed,
                    });
                }
                if !outcome.removed.is_empty() {
                    self.notifier.notify(TreeChangeEvent::PathsRemoved {
                        ids: outcome.removed,
                    });
                }
            }
            Err(e) => {
                tracing::error!("[watcher] sync failed for {}: {e}", target.display());
            }
        }
    }

    fn existing_target(&self, path: &Path) -> PathBuf {
        let mut current = path;
        while current != self.root && !current.exists() {
            match current.parent() {
                Some(parent) if parent.starts_with(&self.root) => current = parent,
                _ => break,
            }
        }
        current.to_path_buf()
    }
}

/// Builder for constructing a [`TutorialWatcher`].
pub struct TutorialWatcherBuilder {
    root: Option<PathBuf>,
    settings: Option<Arc<Settings>>,
    tree: Option<Arc<RwLock<ContentTree>>>,
    notifier: Option<ChangeNotifier>,
    asset_store: Option<Box<dyn AssetStore>>,
    debounce_ms: Option<u64>,
}

impl TutorialWatcherBuilder {
    pub fn new() -> Self {
        Self {
            root: None,
            settings: None,
            tree: None,
            notifier: None,
            asset_store: None,
            debounce_ms: None,
        }
    }

    /// Set the tutorial root directory (required).
    pub fn root(mut self, root: PathBuf) -> Self {
        self.root = Some(root);
        self
    }

    /// Set the settings (defaults when omitted).
    pub fn settings(mut self, settings: Arc<Settings>) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Set the shared content tree (required).
    pub fn tree(mut self, tree: Arc<RwLock<ContentTree>>) -> Self {
        self.tree = Some(tree);
        self
    }

    /// Set the change notifier (required).
    pub fn notifier(mut self, notifier: ChangeNotifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Override where figure assets are published.
    pub fn asset_store(mut self, store: Box<dyn AssetStore>) -> Self {
        self.asset_store = Some(store);
        self
    }

    /// Override the configured debounce duration in milliseconds.
    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = Some(ms);
        self
    }

    /// Build the watcher. Fails if a required collaborator is missing
    /// or the notify backend cannot be initialized.
    pub fn build(self) -> Result<TutorialWatcher, WatchError> {
        let root = self.root.ok_or_else(|| WatchError::InitFailed {
            reason: "root is required".to_string(),
        })?;
        let tree = self.tree.ok_or_else(|| WatchError::InitFailed {
            reason: "content tree is required".to_string(),
        })?;
        let notifier = self.notifier.ok_or_else(|| WatchError::InitFailed {
            reason: "change notifier is required".to_string(),
        })?;
        let settings = self
            .settings
            .unwrap_or_else(|| Arc::new(Settings::default()));

        let debounce_ms = self.debounce_ms.unwrap_or(settings.watch.debounce_ms);
        let importer = Importer::new(root.clone(), &settings);

        let figures_path = root.join(&settings.figures.filename);
        let store = self.asset_store.unwrap_or_else(|| {
            Box::new(DirAssetStore::new(settings.figures.assets_dir.clone()))
        });
        let figures = FiguresSync::new(figures_path, store);

        // Create channel for events
        let (tx, rx) = mpsc::channel(100);

        // Create the notify watcher with our channel
        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = tx.blocking_send(res);
        })?;

        Ok(TutorialWatcher {
            root,
            figures_filename: settings.figures.filename.clone(),
            tree,
            importer,
            figures,
            notifier,
            debouncer: Debouncer::new(debounce_ms),
            figures_debouncer: Debouncer::new(debounce_ms),
            event_rx: rx,
            _watcher: watcher,
        })
    }
}

impl Default for TutorialWatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
