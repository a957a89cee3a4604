//! Output writers used by [`MarkdownRenderer`](crate::MarkdownRenderer).

/// Writes the leaf elements of a rendered document.
///
/// The renderer owns the block structure and the id namespace: it computes
/// prefixed heading ids and rewrites `#fragment` hrefs before calling the
/// backend. A backend only decides the markup around those values and must
/// escape every attribute it writes.
pub trait RenderBackend {
    /// Write a heading element. `html` is already rendered inline content.
    fn heading(level: u8, id: &str, html: &str, out: &mut String);

    /// Open a link. `href` already carries the id prefix for fragment links.
    fn link_start(href: &str, out: &mut String);

    /// Write a fenced or indented block no processor claimed.
    fn code_block(lang: Option<&str>, content: &str, out: &mut String);

    fn blockquote_start(out: &mut String);

    fn blockquote_end(out: &mut String);

    /// `title` is empty when the image has none.
    fn image(src: &str, alt: &str, title: &str, out: &mut String);

    fn hard_break(out: &mut String) {
        out.push_str("<br>");
    }

    fn horizontal_rule(out: &mut String) {
        out.push_str("<hr>");
    }

    /// GFM task list checkbox, always disabled.
    fn task_list_marker(checked: bool, out: &mut String) {
        out.push_str(if checked {
            r#"<input type="checkbox" checked disabled> "#
        } else {
            r#"<input type="checkbox" disabled> "#
        });
    }
}
