//! Tests for figures document synchronization.

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use tutorsync::{ContentTree, DirAssetStore, FiguresSync, ImportError, Importer, Settings};

fn figures_sync(root: &Path, out: &Path) -> FiguresSync {
    FiguresSync::new(
        root.join("figures.json"),
        Box::new(DirAssetStore::new(out.to_path_buf())),
    )
}

#[test]
fn test_sync_publishes_referenced_assets() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let out = root.join("published");

    fs::create_dir_all(root.join("assets")).unwrap();
    fs::write(root.join("assets/flow.svg"), b"<svg>flow</svg>").unwrap();
    fs::write(
        root.join("figures.json"),
        r#"{"figures": [{"name": "flow.svg", "file": "assets/flow.svg"}]}"#,
    )
    .unwrap();

    let mut sync = figures_sync(root, &out);
    let published = sync.sync_figures().unwrap();

    assert_eq!(published, 1);
    assert_eq!(fs::read(out.join("flow.svg")).unwrap(), b"<svg>flow</svg>");
    assert_eq!(sync.document().unwrap().figures.len(), 1);
}

#[test]
fn test_malformed_document_is_fail_safe() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let out = root.join("published");

    fs::create_dir_all(root.join("assets")).unwrap();
    fs::write(root.join("assets/flow.svg"), b"<svg>flow</svg>").unwrap();
    fs::write(
        root.join("figures.json"),
        r#"{"figures": [{"name": "flow.svg", "file": "assets/flow.svg"}]}"#,
    )
    .unwrap();

    let mut sync = figures_sync(root, &out);
    sync.sync_figures().unwrap();

    // The document goes bad mid-edit.
    fs::write(root.join("figures.json"), "{not json").unwrap();
    let err = sync.sync_figures().unwrap_err();
    assert!(matches!(err, ImportError::MalformedContent { .. }));

    // Prior document and published assets stay in place.
    assert_eq!(sync.document().unwrap().figures.len(), 1);
    assert!(out.join("flow.svg").exists());
}

#[test]
fn test_missing_asset_file_is_skipped() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let out = root.join("published");

    fs::create_dir_all(root.join("assets")).unwrap();
    fs::write(root.join("assets/a.svg"), b"<svg>a</svg>").unwrap();
    fs::write(
        root.join("figures.json"),
        r#"{"figures": [
            {"name": "a.svg", "file": "assets/a.svg"},
            {"name": "b.svg", "file": "assets/does-not-exist.svg"}
        ]}"#,
    )
    .unwrap();

    let mut sync = figures_sync(root, &out);
    assert_eq!(sync.sync_figures().unwrap(), 1);
    assert!(out.join("a.svg").exists());
    assert!(!out.join("b.svg").exists());
}

#[test]
fn test_figures_sync_leaves_content_versions_alone() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    fs::create_dir_all(root.join("1-basics")).unwrap();
    fs::write(
        root.join("1-basics/1-intro.md"),
        "# Intro\n\nSee figure [flow].\n",
    )
    .unwrap();
    fs::create_dir_all(root.join("assets")).unwrap();
    fs::write(root.join("assets/flow.svg"), b"<svg>flow</svg>").unwrap();
    fs::write(
        root.join("figures.json"),
        r#"{"figures": [{"name": "flow.svg", "file": "assets/flow.svg"}]}"#,
    )
    .unwrap();

    let mut tree = ContentTree::new(root.to_path_buf());
    let importer = Importer::new(root.to_path_buf(), &Settings::default());
    importer.sync(&mut tree, root).unwrap();

    let leaf = root.join("1-basics/1-intro.md");
    let version_before = tree.find(&leaf).unwrap().version;

    let mut sync = figures_sync(root, &root.join("published"));
    sync.sync_figures().unwrap();

    // Editing/publishing figures never touches content node versions.
    assert_eq!(tree.find(&leaf).unwrap().version, version_before);
    assert!(tree.find(&root.join("figures.json")).is_none());
}
