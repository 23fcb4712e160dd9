//! Content parser seam.
//!
//! The import engine treats markdown parsing as a black box. This
//! module wraps `pulldown-cmark` behind two one-shot operations: parse
//! a document into a finite, materialized token sequence and render a
//! token sequence to markup. Nothing here is lazy; tutorial documents
//! are small and bounded.

use std::ops::Range;

use pulldown_cmark::{Event, Options, Parser, html};

fn options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_FOOTNOTES
}

/// Parse `text` into a materialized token sequence.
pub fn parse(text: &str) -> Vec<Event<'_>> {
    Parser::new_ext(text, options()).collect()
}

/// Parse `text` into tokens paired with their byte ranges in the
/// source. Structural extraction (titles, section splits) works on
/// these so raw markdown slices stay intact.
pub fn parse_with_offsets(text: &str) -> Vec<(Event<'_>, Range<usize>)> {
    Parser::new_ext(text, options()).into_offset_iter().collect()
}

/// Render a token sequence to an HTML string.
pub fn render(tokens: Vec<Event<'_>>) -> String {
    let mut out = String::new();
    html::push_html(&mut out, tokens.into_iter());
    out
}
