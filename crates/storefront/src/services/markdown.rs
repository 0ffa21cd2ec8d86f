//! Markdown rendering for articles and blog posts.

use comrak::{Options, markdown_to_html};

/// Render article markdown to HTML.
///
/// Raw HTML in the source is escaped, not passed through.
#[must_use]
pub fn render(markdown: &str) -> String {
    let mut options = Options::default();

    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.superscript = true;
    options.extension.header_ids = Some(String::new());
    options.extension.footnotes = true;

    options.render.escape = true;

    markdown_to_html(markdown, &options)
}

/// Estimated reading time at 200 words per minute, at least one minute.
#[must_use]
pub fn reading_time_minutes(markdown: &str) -> u32 {
    let words = u32::try_from(markdown.split_whitespace().count()).unwrap_or(u32::MAX);
    words.div_ceil(200).max(1)
}
