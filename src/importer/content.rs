//! Leaf content loading.
//!
//! Turns the raw body of a task/article file into node metadata: the
//! title comes from the leading level-1 heading, and task files are
//! split into content and solution halves at a level-1 `Solution`
//! heading. Offsets from the parser keep the raw markdown slices
//! intact; rendering to markup is the rendering layer's job.

use std::ops::Range;

use pulldown_cmark::{Event, HeadingLevel, Tag, TagEnd};

use crate::classify::Role;
use crate::parser;
use crate::tree::NodeMeta;

/// Structural pieces of a leaf document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafDoc {
    pub title: String,
    pub content: String,
    pub solution: String,
}

/// Build node metadata for a leaf file from its raw body.
///
/// Fails with a human-readable reason when the document is structurally
/// malformed; the caller maps that onto the malformed-content taxonomy.
pub fn load_leaf(role: Role, text: &str, resource_web_root: &str) -> Result<NodeMeta, String> {
    match role {
        Role::Task => {
            let doc = parse_leaf(text, true)?;
            Ok(NodeMeta::Task {
                title: doc.title,
                content: doc.content,
                solution: doc.solution,
                resource_web_root: resource_web_root.to_string(),
            })
        }
        Role::Article => {
            let doc = parse_leaf(text, false)?;
            Ok(NodeMeta::Article {
                title: doc.title,
                content: doc.content,
                resource_web_root: resource_web_root.to_string(),
            })
        }
        Role::Section | Role::Figures => Err("not a leaf role".to_string()),
    }
}

/// Parse a leaf document into title/content(/solution) slices.
///
/// The document must open with a level-1 heading; with `split_solution`
/// a later level-1 heading titled "Solution" (any case) divides the body.
pub fn parse_leaf(text: &str, split_solution: bool) -> Result<LeafDoc, String> {
    let mut events = parser::parse_with_offsets(text).into_iter();

    let Some((
        Event::Start(Tag::Heading {
            level: HeadingLevel::H1,
            ..
        }),
        title_range,
    )) = events.next()
    else {
        return Err("document must start with a level-1 title heading".to_string());
    };

    let mut title = String::new();
    for (event, _) in events.by_ref() {
        match event {
            Event::Text(t) | Event::Code(t) => title.push_str(&t),
            Event::End(TagEnd::Heading(HeadingLevel::H1)) => break,
            _ => {}
        }
    }
    let title = title.trim().to_string();
    if title.is_empty() {
        return Err("title heading is empty".to_string());
    }

    let body_start = title_range.end;
    let mut content_end = text.len();
    let mut solution_start = None;

    if split_solution {
        // Scan for a level-1 heading whose text is "solution".
        let mut heading: Option<(Range<usize>, String)> = None;
        for (event, range) in events {
            match event {
                Event::Start(Tag::Heading {
                    level: HeadingLevel::H1,
                    ..
                }) => heading = Some((range, String::new())),
                Event::Text(t) | Event::Code(t) => {
                    if let Some((_, buf)) = heading.as_mut() {
                        buf.push_str(&t);
                    }
                }
                Event::End(TagEnd::Heading(HeadingLevel::H1)) => {
                    if let Some((range, buf)) = heading.take()
                        && buf.trim().eq_ignore_ascii_case("solution")
                    {
                        content_end = range.start;
                        solution_start = Some(range.end);
                        break;
                    }
                }
                _ => {}
            }
        }
    }

    let content = text[body_start..content_end].trim().to_string();
    let solution = solution_start
        .map(|at| text[at..].trim().to_string())
        .unwrap_or_default();

    Ok(LeafDoc {
        title,
        content,
        solution,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_extraction() {
        let doc = parse_leaf("# Loops\n\nHow `for` works.\n", false).unwrap();
        assert_eq!(doc.title, "Loops");
        assert_eq!(doc.content, "How `for` works.");
        assert_eq!(doc.solution, "");
    }

    #[test]
    fn test_missing_title_is_malformed() {
        let err = parse_leaf("Just a paragraph, no heading.\n", false).unwrap_err();
        assert!(err.contains("level-1 title"));
    }

    #[test]
    fn test_second_level_heading_is_not_a_title() {
        assert!(parse_leaf("## Not a title\n\nbody\n", false).is_err());
    }

    #[test]
    fn test_task_solution_split() {
        let text = "# Sum numbers\n\nWrite a sum.\n\n# Solution\n\nUse a loop.\n";
        let doc = parse_leaf(text, true).unwrap();
        assert_eq!(doc.title, "Sum numbers");
        assert_eq!(doc.content, "Write a sum.");
        assert_eq!(doc.solution, "Use a loop.");
    }

    #[test]
    fn test_solution_heading_is_case_insensitive() {
        let text = "# T\n\nbody\n\n# SOLUTION\n\nanswer\n";
        let doc = parse_leaf(text, true).unwrap();
        assert_eq!(doc.solution, "answer");
    }

    #[test]
    fn test_article_keeps_solution_heading_in_content() {
        let text = "# Essay\n\nintro\n\n# Solution\n\nstill part of the article\n";
        let doc = parse_leaf(text, false).unwrap();
        assert!(doc.content.contains("# Solution"));
        assert_eq!(doc.solution, "");
    }

    #[test]
    fn test_task_without_solution_section() {
        let doc = parse_leaf("# Open task\n\nNo answer shipped yet.\n", true).unwrap();
        assert_eq!(doc.solution, "");
        assert_eq!(doc.content, "No answer shipped yet.");
    }
}
