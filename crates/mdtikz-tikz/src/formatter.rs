//! TikZ block formatting: render, pair with source, convert.

use std::sync::Arc;

use mdtikz_nested::{ConvertError, DocumentConverter, NestedOutput, SourceTabs, Stash};

use crate::backend::{BackendError, FragmentBackend};
use crate::options::TikzOptions;

/// Language of the source tab code block.
const SOURCE_LANGUAGE: &str = "latex";

/// Error formatting a TikZ block.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Convert(#[from] ConvertError),
}

/// Turns TikZ code into a figure/source tab group.
///
/// The figure comes from the backend and reaches the output through the
/// stash, so the SVG markup never passes through the markdown grammar.
pub struct TikzFormatter {
    backend: Arc<dyn FragmentBackend>,
    converter: DocumentConverter,
    tabs: SourceTabs,
}

impl TikzFormatter {
    #[must_use]
    pub fn new(backend: Arc<dyn FragmentBackend>, converter: DocumentConverter) -> Self {
        Self {
            backend,
            converter,
            tabs: SourceTabs::default(),
        }
    }

    /// Override the tab titles.
    #[must_use]
    pub fn with_tabs(mut self, tabs: SourceTabs) -> Self {
        self.tabs = tabs;
        self
    }

    /// Render `code` and convert the tab group to HTML.
    pub fn format(&self, code: &str, options: &TikzOptions) -> Result<NestedOutput, FormatError> {
        let code = code.trim_end_matches('\n');
        let svg = self.backend.generate(code, &options.as_options())?;

        let mut stash = Stash::new();
        let token = stash.stash(svg.trim());
        let fragment = self
            .tabs
            .add_source(&options.source(code), token.as_str(), SOURCE_LANGUAGE);

        Ok(self.converter.convert_nested(&fragment, Some(&stash), None)?)
    }
}
