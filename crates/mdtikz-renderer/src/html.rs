//! HTML5 output.

use std::fmt::Write;

use crate::backend::RenderBackend;
use crate::state::escape_html;

/// Writes plain HTML5, the format nested fragments are spliced into.
pub struct HtmlBackend;

impl RenderBackend for HtmlBackend {
    fn heading(level: u8, id: &str, html: &str, out: &mut String) {
        write!(out, r#"<h{level} id="{}">{html}</h{level}>"#, escape_html(id)).unwrap();
    }

    fn link_start(href: &str, out: &mut String) {
        write!(out, r#"<a href="{}">"#, escape_html(href)).unwrap();
    }

    fn code_block(lang: Option<&str>, content: &str, out: &mut String) {
        out.push_str("<pre><code");
        if let Some(lang) = lang {
            write!(out, r#" class="language-{}""#, escape_html(lang)).unwrap();
        }
        write!(out, ">{}</code></pre>", escape_html(content)).unwrap();
    }

    fn blockquote_start(out: &mut String) {
        out.push_str("<blockquote>");
    }

    fn blockquote_end(out: &mut String) {
        out.push_str("</blockquote>");
    }

    fn image(src: &str, alt: &str, title: &str, out: &mut String) {
        write!(out, r#"<img src="{}""#, escape_html(src)).unwrap();
        if !title.is_empty() {
            write!(out, r#" title="{}""#, escape_html(title)).unwrap();
        }
        write!(out, r#" alt="{}">"#, escape_html(alt)).unwrap();
    }
}
