//! Nested document conversion.

use std::fmt;

use mdtikz_renderer::TocEntry;

use crate::builder::SubPipelineBuilder;
use crate::error::ConvertError;
use crate::namespace::NamespaceScope;
use crate::pipeline::Pipeline;
use crate::stash::Stash;

/// HTML produced by a nested conversion.
///
/// Already-safe markup: splice it into the host output without escaping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SafeHtml(String);

impl SafeHtml {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SafeHtml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SafeHtml {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<SafeHtml> for String {
    fn from(html: SafeHtml) -> Self {
        html.0
    }
}

/// Result of [`DocumentConverter::convert_nested`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NestedOutput {
    pub html: SafeHtml,
    /// Headings the heading policy hands to the host TOC.
    pub headings: Vec<TocEntry>,
    /// Warnings from the nested render.
    pub warnings: Vec<String>,
}

/// Converts markdown fragments through an isolated clone of a host pipeline.
///
/// Every call numbers itself with the host's namespace counter and renders
/// under the prefix `<tag>-<n>--` (or an explicit one), so ids of several
/// fragments on one page never collide. Stashed payloads are substituted
/// after rendering and never pass through the markdown grammar.
///
/// # Example
///
/// ```
/// use mdtikz_nested::{DocumentConverter, Pipeline, Stash};
///
/// let converter = DocumentConverter::new(Pipeline::builder().build());
/// let mut stash = Stash::new();
/// let token = stash.stash("<svg>*raw*</svg>");
///
/// let html = converter
///     .convert(&format!("## Plot\n\n{token}"), Some(&stash), None)
///     .unwrap();
///
/// assert_eq!(
///     html.as_str(),
///     r#"<h2 id="tizk-1--plot">Plot</h2><p><svg>*raw*</svg></p>"#
/// );
/// ```
#[derive(Clone, Debug)]
pub struct DocumentConverter {
    pipeline: Pipeline,
}

impl DocumentConverter {
    #[must_use]
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }

    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Convert `text` into safe HTML.
    ///
    /// `id_prefix` overrides the generated prefix. The namespace counter
    /// advances once per call either way, failed calls included.
    pub fn convert(
        &self,
        text: &str,
        stash: Option<&Stash>,
        id_prefix: Option<&str>,
    ) -> Result<SafeHtml, ConvertError> {
        self.convert_nested(text, stash, id_prefix)
            .map(|output| output.html)
    }

    /// Convert `text` and also return headings and warnings of the nested
    /// render.
    pub fn convert_nested(
        &self,
        text: &str,
        stash: Option<&Stash>,
        id_prefix: Option<&str>,
    ) -> Result<NestedOutput, ConvertError> {
        let counter = self.pipeline.counter().advance();
        let prefix = id_prefix.map_or_else(
            || format!("{}-{counter}--", self.pipeline.tag()),
            str::to_owned,
        );
        tracing::debug!(prefix = %prefix, counter, "Converting nested document");

        let mut clone = SubPipelineBuilder::new(&self.pipeline).build()?;
        let rendered = {
            let scope = NamespaceScope::enter(&mut clone, &prefix);
            scope.render(text)?
        };

        for warning in &rendered.warnings {
            tracing::warn!(prefix = %prefix, warning = %warning, "Nested render warning");
        }

        let html = match stash {
            Some(stash) => {
                for token in stash.unused(&rendered.html) {
                    tracing::debug!(prefix = %prefix, token = %token, "Stash token not found in nested output");
                }
                stash.apply(&rendered.html)
            }
            None => rendered.html,
        };

        Ok(NestedOutput {
            html: SafeHtml(html),
            headings: rendered.headings,
            warnings: rendered.warnings,
        })
    }
}
