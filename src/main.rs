use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tokio::sync::RwLock;

use tutorsync::{
    ChangeNotifier, ContentTree, Importer, Settings, SyncOutcome, TreeChangeEvent, TutorialWatcher,
    logging,
};

#[derive(Parser)]
#[command(name = "tutorsync")]
#[command(about = "Tutorial content importer with live filesystem synchronization")]
#[command(version)]
struct Cli {
    /// Path to an alternate settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import the tutorial tree once and print a summary
    Import {
        /// Path to the tutorial root directory
        root: PathBuf,
    },

    /// Import, then watch the tree and live-sync changes
    Watch {
        /// Path to the tutorial root directory
        root: PathBuf,

        /// Override the configured debounce window (milliseconds)
        #[arg(long)]
        debounce_ms: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .map_err(|e| anyhow::anyhow!("failed to load settings: {e}"))?;
    let settings = Arc::new(settings);

    logging::init_with_config(&settings.logging);

    match cli.command {
        Commands::Import { root } => {
            let root = resolve_root(&root)?;
            let mut tree = ContentTree::new(root.clone());
            let outcome = bulk_import(&settings, &root, &mut tree)?;
            println!(
                "Imported {} nodes ({} synced, {} skipped)",
                tree.len(),
                outcome.changed.len(),
                outcome.skipped
            );
            Ok(())
        }

        Commands::Watch { root, debounce_ms } => {
            let root = resolve_root(&root)?;
            let mut tree = ContentTree::new(root.clone());
            let outcome = bulk_import(&settings, &root, &mut tree)?;
            tutorsync::log_event!(
                "import",
                "complete",
                "{} nodes, {} skipped",
                tree.len(),
                outcome.skipped
            );

            let tree = Arc::new(RwLock::new(tree));
            let notifier = ChangeNotifier::new(64);
            spawn_livereload_logger(&notifier);
            notifier.notify(TreeChangeEvent::TreeRebuilt);

            let mut builder = TutorialWatcher::builder()
                .root(root)
                .settings(settings)
                .tree(tree)
                .notifier(notifier);
            if let Some(ms) = debounce_ms {
                builder = builder.debounce_ms(ms);
            }

            let watcher = builder.build().context("failed to start watcher")?;
            watcher.watch().await.context("watch loop ended")?;
            Ok(())
        }
    }
}

/// Canonicalize the root argument; a missing or non-directory root is
/// fatal at startup.
fn resolve_root(root: &Path) -> anyhow::Result<PathBuf> {
    let resolved = root
        .canonicalize()
        .with_context(|| format!("tutorial root does not exist: {}", root.display()))?;
    if !resolved.is_dir() {
        bail!("tutorial root is not a directory: {}", resolved.display());
    }
    Ok(resolved)
}

/// Full rebuild of the tree from disk. The watcher only starts after
/// this returns, so live events never interleave with the initial scan.
fn bulk_import(
    settings: &Settings,
    root: &Path,
    tree: &mut ContentTree,
) -> anyhow::Result<SyncOutcome> {
    tree.destroy_all();
    let importer = Importer::new(root.to_path_buf(), settings);
    let outcome = importer
        .sync(tree, root)
        .with_context(|| format!("failed to import {}", root.display()))?;
    if outcome.skipped > 0 {
        tracing::warn!("import skipped {} entries", outcome.skipped);
    }
    Ok(outcome)
}

/// Stand-in live-reload consumer: subscribes to change events and logs
/// them where a browser-reload broadcaster would hook in.
fn spawn_livereload_logger(notifier: &ChangeNotifier) {
    let mut rx = notifier.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(TreeChangeEvent::PathsChanged { ids }) => {
                    tutorsync::log_event!("livereload", "changed", "{}", ids.join(", "));
                }
                Ok(TreeChangeEvent::PathsRemoved { ids }) => {
                    tutorsync::log_event!("livereload", "removed", "{}", ids.join(", "));
                }
                Ok(TreeChangeEvent::FiguresChanged) => {
                    tutorsync::log_event!("livereload", "figures changed");
                }
                Ok(TreeChangeEvent::TreeRebuilt) => {
                    tutorsync::log_event!("livereload", "tree rebuilt");
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("[livereload] lagged by {n} events");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}
