//! Heading policy hooks for nested documents.
//!
//! A nested document may contain headings of its own. The policy decides
//! which of them the host table of contents lists and whether they stay in
//! the nested HTML.

use std::collections::HashSet;
use std::sync::LazyLock;

use mdtikz_renderer::{TocEntry, escape_html};
use regex::{Captures, Regex};

use crate::error::HeadingPolicyError;

/// A rendered nested document, before payload substitution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NestedDocument {
    /// Rendered HTML, still containing stash tokens.
    pub html: String,
    /// Headings rendered in the document, ids already prefixed.
    pub headings: Vec<TocEntry>,
}

/// Decides how headings of nested documents reach the host.
pub trait HeadingPolicy: Send + Sync {
    /// Headings to append to the host table of contents.
    fn extract_headings(&self, doc: &NestedDocument) -> Vec<TocEntry>;

    /// Remove headings from the nested document, if the policy wants to.
    fn strip_headings(&self, doc: &mut NestedDocument) -> Result<(), HeadingPolicyError>;
}

/// Leaves nested headings in the HTML and out of the host TOC.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeepHeadings;

impl HeadingPolicy for KeepHeadings {
    fn extract_headings(&self, _doc: &NestedDocument) -> Vec<TocEntry> {
        Vec::new()
    }

    fn strip_headings(&self, _doc: &mut NestedDocument) -> Result<(), HeadingPolicyError> {
        Ok(())
    }
}

/// Lists nested headings in the host TOC and keeps them in the HTML.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReportHeadings;

impl HeadingPolicy for ReportHeadings {
    fn extract_headings(&self, doc: &NestedDocument) -> Vec<TocEntry> {
        doc.headings.clone()
    }

    fn strip_headings(&self, _doc: &mut NestedDocument) -> Result<(), HeadingPolicyError> {
        Ok(())
    }
}

/// Removes rendered heading elements from nested HTML.
///
/// Only elements whose id belongs to `doc.headings` are removed; raw HTML
/// headings written by the author stay.
#[derive(Clone, Copy, Debug, Default)]
pub struct StripHeadings;

static HEADING_ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<h([1-6]) id="([^"]*)">.*?</h[1-6]>"#).unwrap());

impl HeadingPolicy for StripHeadings {
    fn extract_headings(&self, _doc: &NestedDocument) -> Vec<TocEntry> {
        Vec::new()
    }

    fn strip_headings(&self, doc: &mut NestedDocument) -> Result<(), HeadingPolicyError> {
        if doc.headings.is_empty() {
            return Ok(());
        }
        let ids: HashSet<String> = doc.headings.iter().map(|h| escape_html(&h.id)).collect();
        doc.html = HEADING_ELEMENT
            .replace_all(&doc.html, |caps: &Captures<'_>| {
                if ids.contains(&caps[2]) {
                    String::new()
                } else {
                    caps[0].to_owned()
                }
            })
            .into_owned();
        doc.headings.clear();
        Ok(())
    }
}
