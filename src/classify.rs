//! Path classification for the tutorial tree.
//!
//! Decides whether a filesystem path belongs to the tutorial hierarchy
//! and extracts its structural role. Tutorial entries are numbered:
//! every path segment below the root must carry a leading integer
//! prefix ("2-functions", "10-closures.md"). Everything else, plus
//! editor temp files, is noise.

use std::path::{Path, PathBuf};

/// Structural role of a path inside the tutorial tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// A numbered directory grouping child tasks/articles.
    Section,
    /// A leaf exercise with a content body and a solution body (`*.task.md`).
    Task,
    /// A leaf content unit (`*.md`).
    Article,
    /// The figures document directly under the root.
    Figures,
}

/// Result of classifying a path against a tutorial root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Not part of the tutorial tree. Never becomes a node.
    Ignored,
    Matched {
        role: Role,
        /// Numeric sort key parsed from the leading digits of the basename.
        numeric_key: u32,
        /// Parent directory of the classified path.
        parent: PathBuf,
    },
}

/// Classify `path` relative to `root`. Pure; the only filesystem access
/// is an existence probe, and paths that no longer exist are classified
/// by shape (anything that was not a markdown leaf must have been a
/// section directory) so delete events still resolve.
pub fn classify(root: &Path, figures_filename: &str, path: &Path) -> Classification {
    let Ok(rel) = path.strip_prefix(root) else {
        return Classification::Ignored;
    };

    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return Classification::Ignored;
    };

    if is_editor_temp(name) {
        return Classification::Ignored;
    }

    let parent = match path.parent() {
        Some(p) => p.to_path_buf(),
        None => return Classification::Ignored,
    };

    // The figures document sits directly under the root, unnumbered.
    if rel.iter().count() == 1 && name == figures_filename {
        return Classification::Matched {
            role: Role::Figures,
            numeric_key: 0,
            parent,
        };
    }

    // Every segment below the root must be numbered.
    for segment in rel.iter() {
        let ok = segment
            .to_str()
            .and_then(numeric_prefix)
            .is_some();
        if !ok {
            return Classification::Ignored;
        }
    }

    let Some(numeric_key) = numeric_prefix(name) else {
        return Classification::Ignored;
    };

    let role = if path.is_dir() {
        Role::Section
    } else if name.ends_with(".task.md") {
        Role::Task
    } else if name.ends_with(".md") {
        Role::Article
    } else if path.exists() {
        // A live non-markdown file is noise.
        return Classification::Ignored;
    } else {
        // Gone from disk: a dotted directory name ("7.1-floats") must
        // still resolve as a section so its node is dropped right away.
        Role::Section
    };

    Classification::Matched {
        role,
        numeric_key,
        parent,
    }
}

/// Parse the leading digit run of a basename as a sort key.
pub fn numeric_prefix(name: &str) -> Option<u32> {
    let digits: String = name.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Known editor temp-file shapes: JetBrains `___jb_` swaps, vim swap
/// files, emacs autosaves, backup tildes, and macOS droppings.
fn is_editor_temp(name: &str) -> bool {
    name.contains("___jb_")
        || name.ends_with('~')
        || name.ends_with(".swp")
        || name.ends_with(".swx")
        || name.ends_with(".tmp")
        || (name.starts_with('#') && name.ends_with('#'))
        || name == ".DS_Store"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matched(c: Classification) -> (Role, u32) {
        match c {
            Classification::Matched {
                role, numeric_key, ..
            } => (role, numeric_key),
            Classification::Ignored => panic!("expected a match"),
        }
    }

    #[test]
    fn test_classify_leaf_roles_by_extension() {
        let root = Path::new("/tut");
        let c = classify(root, "figures.json", Path::new("/tut/2-code/10-loops.md"));
        assert_eq!(matched(c), (Role::Article, 10));

        let c = classify(root, "figures.json", Path::new("/tut/2-code/3-sum.task.md"));
        assert_eq!(matched(c), (Role::Task, 3));
    }

    #[test]
    fn test_non_numeric_segment_is_ignored() {
        let root = Path::new("/tut");
        let c = classify(root, "figures.json", Path::new("/tut/drafts/1-intro.md"));
        assert_eq!(c, Classification::Ignored);

        let c = classify(root, "figures.json", Path::new("/tut/readme.md"));
        assert_eq!(c, Classification::Ignored);
    }

    #[test]
    fn test_figures_filename_matches_at_root_only() {
        let root = Path::new("/tut");
        let c = classify(root, "figures.json", Path::new("/tut/figures.json"));
        assert_eq!(matched(c).0, Role::Figures);

        // Nested figures.json is not the figures document.
        let c = classify(root, "figures.json", Path::new("/tut/1-intro/figures.json"));
        assert_eq!(c, Classification::Ignored);
    }

    #[test]
    fn test_editor_temp_files_are_ignored() {
        let root = Path::new("/tut");
        for name in [
            "1-intro.md___jb_old___",
            "1-intro.md~",
            "1-intro.md.swp",
            "2.tmp",
            "#1-intro.md#",
        ] {
            let path = root.join("1-basics").join(name);
            assert_eq!(
                classify(root, "figures.json", &path),
                Classification::Ignored,
                "{name} should be ignored"
            );
        }
    }

    #[test]
    fn test_missing_directory_classifies_by_shape() {
        // Delete events arrive after the entry is gone; no extension
        // means the path was a section directory.
        let root = Path::new("/tut");
        let c = classify(root, "figures.json", Path::new("/tut/3-objects"));
        assert_eq!(matched(c), (Role::Section, 3));
    }

    #[test]
    fn test_missing_dotted_directory_is_still_a_section() {
        // A directory name may contain a dot; once deleted there is no
        // is_dir probe left, and the extension must not demote it.
        let root = Path::new("/tut");
        let c = classify(root, "figures.json", Path::new("/tut/7.1-floats"));
        assert_eq!(matched(c), (Role::Section, 7));
    }

    #[test]
    fn test_paths_outside_root_are_ignored() {
        let root = Path::new("/tut");
        let c = classify(root, "figures.json", Path::new("/elsewhere/1-intro.md"));
        assert_eq!(c, Classification::Ignored);
    }

    #[test]
    fn test_numeric_prefix() {
        assert_eq!(numeric_prefix("10-closures.md"), Some(10));
        assert_eq!(numeric_prefix("2"), Some(2));
        assert_eq!(numeric_prefix("0-intro"), Some(0));
        assert_eq!(numeric_prefix("intro"), None);
        assert_eq!(numeric_prefix(""), None);
    }
}
