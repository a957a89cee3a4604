//! Code block processor trait for extensible code block handling.
//!
//! Processors are registered with the renderer and checked in order when a
//! fenced code block is encountered. The first processor returning a
//! non-`PassThrough` result wins.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use mdtikz_renderer::{CodeBlockProcessor, ProcessResult};
//!
//! struct Shout;
//!
//! impl CodeBlockProcessor for Shout {
//!     fn process(
//!         &mut self,
//!         language: &str,
//!         _attrs: &HashMap<String, String>,
//!         source: &str,
//!         _index: usize,
//!     ) -> ProcessResult {
//!         if language == "shout" {
//!             ProcessResult::Inline(format!("<p>{}</p>", source.trim().to_uppercase()))
//!         } else {
//!             ProcessResult::PassThrough
//!         }
//!     }
//! }
//! ```

use std::collections::HashMap;

use crate::state::TocEntry;

/// Result of processing a code block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProcessResult {
    /// Replace code block with HTML.
    ///
    /// The processor may rewrite it again in
    /// [`post_process`](CodeBlockProcessor::post_process).
    Inline(String),

    /// Replace code block with the output of a nested document conversion.
    ///
    /// `headings` are appended to the host table of contents at the position
    /// of the code block.
    Nested {
        /// Rendered HTML of the nested document.
        html: String,
        /// Headings the nested document contributes to the host.
        headings: Vec<TocEntry>,
    },

    /// Render as a regular code block.
    PassThrough,
}

/// Trait for processing special code blocks.
pub trait CodeBlockProcessor {
    /// Process a code block and return the result.
    ///
    /// # Arguments
    ///
    /// * `language` - Language identifier from fence info string
    /// * `attrs` - Attributes parsed from fence (key=value pairs)
    /// * `source` - Raw content of the code block
    /// * `index` - Zero-based index of the code block in the document
    fn process(
        &mut self,
        language: &str,
        attrs: &HashMap<String, String>,
        source: &str,
        index: usize,
    ) -> ProcessResult;

    /// Post-process rendered HTML after all events were rendered.
    ///
    /// Default implementation is a no-op.
    fn post_process(&mut self, _html: &mut String) {}

    /// Get warnings generated during processing.
    fn warnings(&self) -> &[String] {
        &[]
    }
}

/// Parse fence info string into language and attributes.
///
/// Format: `language [key=value ...]`. Values may be wrapped in single or
/// double quotes to contain whitespace (`option="scale=2, thick"`).
#[must_use]
pub(crate) fn parse_fence_info(info: &str) -> (String, HashMap<String, String>) {
    let mut words = split_info(info).into_iter();
    let language = words.next().unwrap_or_default();

    let attrs = words
        .filter_map(|word| {
            word.split_once('=')
                .map(|(key, value)| (key.to_owned(), value.to_owned()))
        })
        .collect();

    (language, attrs)
}

/// Split a fence info string on whitespace outside of quotes.
fn split_info(info: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in info.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c.is_whitespace() => {
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
            }
            None => current.push(c),
        }
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fence_info_language_only() {
        let (lang, attrs) = parse_fence_info("tikz");
        assert_eq!(lang, "tikz");
        assert!(attrs.is_empty());
    }

    #[test]
    fn test_parse_fence_info_with_attrs() {
        let (lang, attrs) = parse_fence_info("tikz library=arrows.meta option=scale=2");
        assert_eq!(lang, "tikz");
        assert_eq!(attrs.get("library"), Some(&"arrows.meta".to_owned()));
        assert_eq!(attrs.get("option"), Some(&"scale=2".to_owned()));
    }

    #[test]
    fn test_parse_fence_info_quoted_value_with_spaces() {
        let (lang, attrs) = parse_fence_info(r#"tikz option="scale=2, thick" library='calc'"#);
        assert_eq!(lang, "tikz");
        assert_eq!(attrs.get("option"), Some(&"scale=2, thick".to_owned()));
        assert_eq!(attrs.get("library"), Some(&"calc".to_owned()));
    }

    #[test]
    fn test_parse_fence_info_empty_quoted_value() {
        let (_, attrs) = parse_fence_info(r#"tikz library="""#);
        assert_eq!(attrs.get("library"), Some(&String::new()));
    }

    #[test]
    fn test_parse_fence_info_ignores_bare_words() {
        let (lang, attrs) = parse_fence_info("tikz standalone");
        assert_eq!(lang, "tikz");
        assert!(attrs.is_empty());
    }

    #[test]
    fn test_parse_fence_info_empty() {
        let (lang, attrs) = parse_fence_info("   ");
        assert_eq!(lang, "");
        assert!(attrs.is_empty());
    }
}
