//! In-memory tutorial content tree.
//!
//! One [`ContentTree`] owns every node for a single tutorial root.
//! Nodes are owned exclusively by their parent; siblings stay sorted
//! strictly ascending by numeric key with no duplicates, and every
//! mutator maintains that invariant on its own.
//!
//! The tree is shared between the importer (writer) and the rendering
//! layer (readers) behind `Arc<tokio::sync::RwLock<_>>`; a sync holds
//! the write guard for its whole run, so readers never observe a tree
//! mid-mutation.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::classify::numeric_prefix;

/// Kind of a content unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Section,
    Task,
    Article,
    Figures,
}

/// Kind-specific node metadata. Dispatch is by exhaustive matching,
/// never by probing for fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeMeta {
    Section {
        title: String,
    },
    Article {
        title: String,
        content: String,
        resource_web_root: String,
    },
    Task {
        title: String,
        content: String,
        /// Raw solution body; empty when the task ships no solution yet.
        solution: String,
        resource_web_root: String,
    },
}

impl NodeMeta {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeMeta::Section { .. } => NodeKind::Section,
            NodeMeta::Article { .. } => NodeKind::Article,
            NodeMeta::Task { .. } => NodeKind::Task,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            NodeMeta::Section { title }
            | NodeMeta::Article { title, .. }
            | NodeMeta::Task { title, .. } => title,
        }
    }
}

/// One unit in the tutorial hierarchy.
#[derive(Debug, Clone)]
pub struct ContentNode {
    /// Stable identifier: slash-joined numeric keys relative to the
    /// root, e.g. "2/3" for section 2, item 3.
    pub id: String,
    /// Numeric sort key within the parent.
    pub numeric_key: u32,
    /// Absolute filesystem path backing this node.
    pub source_path: PathBuf,
    /// Bumped on every successful re-sync; render caches key on this.
    pub version: u64,
    /// SHA-256 of the leaf file body at last sync. `None` for sections.
    pub content_hash: Option<String>,
    pub meta: NodeMeta,
    children: Vec<ContentNode>,
}

impl ContentNode {
    fn new(
        id: String,
        numeric_key: u32,
        source_path: PathBuf,
        meta: NodeMeta,
        content_hash: Option<String>,
    ) -> Self {
        Self {
            id,
            numeric_key,
            source_path,
            version: 1,
            content_hash,
            meta,
            children: Vec::new(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.meta.kind()
    }

    /// Children ordered ascending by numeric key.
    pub fn children(&self) -> &[ContentNode] {
        &self.children
    }

    /// Collect this node's id and every descendant id, depth first.
    pub fn collect_ids(&self, out: &mut Vec<String>) {
        out.push(self.id.clone());
        for child in &self.children {
            child.collect_ids(out);
        }
    }

    fn count(&self) -> usize {
        1 + self.children.iter().map(ContentNode::count).sum::<usize>()
    }
}

/// Result of an upsert: the node's id, its version after the call, and
/// whether the call created it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub id: String,
    pub version: u64,
    pub created: bool,
}

/// Root owner of all [`ContentNode`] instances for one tutorial root
/// directory.
#[derive(Debug)]
pub struct ContentTree {
    root: PathBuf,
    children: Vec<ContentNode>,
}

impl ContentTree {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            children: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Top-level sections, ordered ascending by numeric key.
    pub fn children(&self) -> &[ContentNode] {
        &self.children
    }

    /// Drop the entire tree. No-op if already empty.
    pub fn destroy_all(&mut self) {
        self.children.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Total number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.children.iter().map(ContentNode::count).sum()
    }

    /// Read-only lookup by source path. Never allocates.
    pub fn find(&self, path: &Path) -> Option<&ContentNode> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let mut components = rel.iter();
        let first = components.next()?;
        let mut node = find_child(&self.children, first)?;
        for component in components {
            node = find_child(&node.children, component)?;
        }
        Some(node)
    }

    /// Create or replace the node at `path`.
    ///
    /// Missing ancestors are created on demand as placeholder sections,
    /// mirroring directory creation on disk. An existing node has its
    /// metadata replaced via `load` and its version bumped; a new node
    /// is inserted at the position given by its numeric key. A sibling
    /// already holding the same key but a different path loses it:
    /// last write wins, logged as a structural conflict.
    ///
    /// Returns `None` if `path` is outside the root or a segment lacks
    /// a numeric prefix.
    pub fn upsert(
        &mut self,
        path: &Path,
        numeric_key: u32,
        content_hash: Option<String>,
        load: impl FnOnce() -> NodeMeta,
    ) -> Option<UpsertOutcome> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let components: Vec<&OsStr> = rel.iter().collect();
        let (leaf, ancestors) = components.split_last()?;

        let mut children = &mut self.children;
        let mut current = self.root.clone();
        let mut id = String::new();

        for component in ancestors {
            current.push(component);
            let key = numeric_prefix(component.to_str()?)?;
            push_key(&mut id, key);

            let idx = match children
                .iter()
                .position(|c| c.source_path.file_name() == Some(*component))
            {
                Some(idx) => idx,
                None => {
                    evict_conflicting_key(children, key, &current);
                    let node = ContentNode::new(
                        id.clone(),
                        key,
                        current.clone(),
                        NodeMeta::Section {
                            title: section_title(component),
                        },
                        None,
                    );
                    insert_ordered(children, node)
                }
            };

            children = &mut children[idx].children;
        }

        current.push(leaf);
        push_key(&mut id, numeric_key);

        match children
            .iter()
            .position(|c| c.source_path.file_name() == Some(*leaf))
        {
            Some(idx) => {
                let node = &mut children[idx];
                node.meta = load();
                node.content_hash = content_hash;
                node.version += 1;
                Some(UpsertOutcome {
                    id,
                    version: node.version,
                    created: false,
                })
            }
            None => {
                evict_conflicting_key(children, numeric_key, &current);
                let node =
                    ContentNode::new(id.clone(), numeric_key, current, load(), content_hash);
                insert_ordered(children, node);
                Some(UpsertOutcome {
                    id,
                    version: 1,
                    created: true,
                })
            }
        }
    }

    /// Delete the node at `path`, returning the removed subtree.
    /// Idempotent: `None` if the path is not present.
    pub fn remove(&mut self, path: &Path) -> Option<ContentNode> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let components: Vec<&OsStr> = rel.iter().collect();
        let (leaf, ancestors) = components.split_last()?;

        let mut children = &mut self.children;
        for component in ancestors {
            let idx = children
                .iter()
                .position(|c| c.source_path.file_name() == Some(*component))?;
            children = &mut children[idx].children;
        }

        let idx = children
            .iter()
            .position(|c| c.source_path.file_name() == Some(*leaf))?;
        Some(children.remove(idx))
    }
}

fn push_key(id: &mut String, key: u32) {
    if id.is_empty() {
        *id = key.to_string();
    } else {
        *id = format!("{id}/{key}");
    }
}

/// Same key under a different name: evict the prior holder so siblings
/// stay duplicate-free. Last write wins.
fn evict_conflicting_key(children: &mut Vec<ContentNode>, key: u32, incoming: &Path) {
    if let Some(dup) = children.iter().position(|c| c.numeric_key == key) {
        tracing::warn!(
            "structural conflict: key {key} held by {}, replaced by {}",
            children[dup].source_path.display(),
            incoming.display()
        );
        children.remove(dup);
    }
}

/// Insert keeping siblings sorted ascending; returns the insert index.
fn insert_ordered(children: &mut Vec<ContentNode>, node: ContentNode) -> usize {
    let at = children
        .iter()
        .position(|c| c.numeric_key > node.numeric_key)
        .unwrap_or(children.len());
    children.insert(at, node);
    at
}

fn find_child<'a>(children: &'a [ContentNode], component: &OsStr) -> Option<&'a ContentNode> {
    children
        .iter()
        .find(|c| c.source_path.file_name() == Some(component))
}

/// Placeholder title for a section created from its directory name:
/// digits and separator punctuation stripped ("02-functions" -> "functions").
pub(crate) fn section_title(component: &OsStr) -> String {
    let name = component.to_string_lossy();
    let stripped = name
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .trim_start_matches(['-', '_', '.', ' ']);
    if stripped.is_empty() {
        name.into_owned()
    } else {
        stripped.to_string()
    }
}
