//! Diff-based tutorial tree synchronization.
//!
//! [`Importer::sync`] reconciles one subtree of the [`ContentTree`]
//! with current disk state: entries present on disk but not in the tree
//! are created, tree entries whose backing path vanished are removed,
//! and entries present in both are re-parsed only when their content
//! hash changed. Rebuilding from scratch is deliberately avoided; node
//! identity (and the render caches keyed on it) survives a sync, so
//! minimizing churn is the central goal.
//!
//! Failures are isolated per entry: a malformed file or unreadable
//! subdirectory is logged and skipped while siblings proceed. Only an
//! unreadable target directory fails the whole call.

pub mod content;
mod error;

pub use error::ImportError;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::classify::{Classification, Role, classify, numeric_prefix};
use crate::config::Settings;
use crate::tree::{ContentTree, NodeMeta, section_title};

/// SHA-256 of a file body, hex encoded. Used to skip re-parsing
/// unchanged files on re-sync.
pub fn calculate_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// What one sync call did to the tree.
#[derive(Debug, Default, Clone)]
pub struct SyncOutcome {
    /// Ids of nodes created or re-synced (version changed).
    pub changed: Vec<String>,
    /// Ids of nodes removed, descendants included.
    pub removed: Vec<String>,
    /// Entries skipped because of per-file failures.
    pub skipped: usize,
}

impl SyncOutcome {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.removed.is_empty()
    }
}

/// Walks a subtree on disk and applies create/update/delete mutations
/// to the content tree.
pub struct Importer {
    root: PathBuf,
    figures_filename: String,
    web_root: String,
}

impl Importer {
    pub fn new(root: PathBuf, settings: &Settings) -> Self {
        Self {
            root,
            figures_filename: settings.figures.filename.clone(),
            web_root: settings.content.web_root.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Re-synchronize everything under `path`.
    ///
    /// `path` is resolved to the nearest ancestor that is itself a
    /// numbered directory, so syncing a leaf file re-syncs its
    /// containing section; the root itself syncs every numbered
    /// top-level section. Fails only when the target directory cannot
    /// be enumerated.
    pub fn sync(&self, tree: &mut ContentTree, path: &Path) -> Result<SyncOutcome, ImportError> {
        let target = self.resolve_target(path);
        let mut outcome = SyncOutcome::default();
        self.sync_dir(tree, &target, &mut outcome)?;
        // Conflicting siblings share an id and sync it twice in one
        // pass; report it once.
        let mut seen = HashSet::new();
        outcome.changed.retain(|id| seen.insert(id.clone()));
        Ok(outcome)
    }

    /// Nearest self-or-ancestor that is a numbered directory, falling
    /// back to the root.
    fn resolve_target(&self, path: &Path) -> PathBuf {
        let mut current = path;
        loop {
            if current == self.root {
                return self.root.clone();
            }
            if let Classification::Matched {
                role: Role::Section,
                ..
            } = classify(&self.root, &self.figures_filename, current)
            {
                return current.to_path_buf();
            }
            match current.parent() {
                Some(parent) if parent.starts_with(&self.root) => current = parent,
                _ => return self.root.clone(),
            }
        }
    }

    fn sync_dir(
        &self,
        tree: &mut ContentTree,
        dir: &Path,
        outcome: &mut SyncOutcome,
    ) -> Result<(), ImportError> {
        let entries = fs::read_dir(dir).map_err(|source| ImportError::FilesystemUnreadable {
            path: dir.to_path_buf(),
            source,
        })?;

        // Classified children in filesystem enumeration order; a later
        // duplicate numeric key wins (structural conflict, warned by
        // the tree on insert).
        let mut disk: Vec<(PathBuf, Role, u32)> = Vec::new();
        for entry in entries {
            let Ok(entry) = entry else { continue };
            let path = entry.path();
            match classify(&self.root, &self.figures_filename, &path) {
                Classification::Matched {
                    role: Role::Figures,
                    ..
                }
                | Classification::Ignored => {}
                Classification::Matched {
                    role, numeric_key, ..
                } => disk.push((path, role, numeric_key)),
            }
        }

        // Make sure the section itself exists before touching children.
        if dir != tree.root()
            && tree.find(dir).is_none()
            && let Some(key) = dir.file_name().and_then(|n| n.to_str()).and_then(numeric_prefix)
            && let Some(up) = tree.upsert(dir, key, None, || NodeMeta::Section {
                title: dir.file_name().map(section_title).unwrap_or_default(),
            })
        {
            outcome.changed.push(up.id);
        }

        self.remove_vanished(tree, dir, &disk, outcome);

        for (path, role, numeric_key) in disk {
            match role {
                Role::Section => {
                    if let Err(e) = self.sync_dir(tree, &path, outcome) {
                        tracing::warn!("skipping unreadable section {}: {e}", path.display());
                        outcome.skipped += 1;
                    }
                }
                Role::Task | Role::Article => {
                    self.sync_leaf(tree, &path, role, numeric_key, outcome);
                }
                Role::Figures => {}
            }
        }

        Ok(())
    }

    /// Remove tree children of `dir` whose backing entry left the disk.
    fn remove_vanished(
        &self,
        tree: &mut ContentTree,
        dir: &Path,
        disk: &[(PathBuf, Role, u32)],
        outcome: &mut SyncOutcome,
    ) {
        let on_disk: HashSet<&Path> = disk.iter().map(|(p, _, _)| p.as_path()).collect();

        let tracked: Vec<PathBuf> = if dir == tree.root() {
            tree.children()
                .iter()
                .map(|c| c.source_path.clone())
                .collect()
        } else {
            match tree.find(dir) {
                Some(node) => node
                    .children()
                    .iter()
                    .map(|c| c.source_path.clone())
                    .collect(),
                None => return,
            }
        };

        for path in tracked {
            if !on_disk.contains(path.as_path())
                && let Some(removed) = tree.remove(&path)
            {
                removed.collect_ids(&mut outcome.removed);
                tracing::info!("removed {} ({})", removed.id, path.display());
            }
        }
    }

    /// Hash-gated upsert of a single leaf file. Failures skip the file,
    /// leaving any existing node at its prior version and metadata.
    fn sync_leaf(
        &self,
        tree: &mut ContentTree,
        path: &Path,
        role: Role,
        numeric_key: u32,
        outcome: &mut SyncOutcome,
    ) {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("skipping unreadable file {}: {e}", path.display());
                outcome.skipped += 1;
                return;
            }
        };

        let hash = calculate_hash(&text);
        if let Some(node) = tree.find(path)
            && node.content_hash.as_deref() == Some(hash.as_str())
        {
            return;
        }

        let Some(id) = self.node_id(path) else {
            return;
        };
        let resource_web_root = format!("{}/{id}", self.web_root);

        let meta = match content::load_leaf(role, &text, &resource_web_root) {
            Ok(meta) => meta,
            Err(reason) => {
                let err = ImportError::MalformedContent {
                    path: path.to_path_buf(),
                    reason,
                };
                tracing::warn!("skipping: {err}");
                outcome.skipped += 1;
                return;
            }
        };

        if let Some(up) = tree.upsert(path, numeric_key, Some(hash), || meta) {
            tracing::debug!("synced {} (v{})", up.id, up.version);
            outcome.changed.push(up.id);
        }
    }

    /// Slash-joined numeric keys of `path` relative to the root.
    fn node_id(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let keys: Option<Vec<String>> = rel
            .iter()
            .map(|c| c.to_str().and_then(numeric_prefix).map(|k| k.to_string()))
            .collect();
        Some(keys?.join("/"))
    }
}
