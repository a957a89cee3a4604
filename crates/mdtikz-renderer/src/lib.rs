//! Markdown renderer used as the host grammar for mdtikz.
//!
//! This crate provides a generic [`MarkdownRenderer`] that turns pulldown-cmark
//! events into HTML through the [`RenderBackend`] trait.
//!
//! # Architecture
//!
//! - [`HtmlBackend`]: semantic HTML5 output
//! - [`CodeBlockProcessor`]: hooks that replace fenced code blocks (diagrams,
//!   embedded documents) with their own markup
//! - [`TabsPreprocessor`] / [`TabsProcessor`]: `=== "Title"` tab blocks
//!
//! Heading ids, fragment links and tab ids can be namespaced with
//! [`MarkdownRenderer::with_id_prefix`] so that several rendered fragments can
//! share one page without id collisions.
//!
//! # Example
//!
//! ```
//! use mdtikz_renderer::{HtmlBackend, MarkdownRenderer};
//!
//! let result = MarkdownRenderer::<HtmlBackend>::new()
//!     .with_id_prefix("doc-1--")
//!     .render_markdown("## Usage\n\nSee [usage](#usage).");
//!
//! assert!(result.html.contains(r#"<h2 id="doc-1--usage">Usage</h2>"#));
//! assert!(result.html.contains(r##"href="#doc-1--usage""##));
//! ```

mod backend;
mod code_block;
mod html;
mod renderer;
mod state;
mod tabs;
mod util;

pub use backend::RenderBackend;
pub use code_block::{CodeBlockProcessor, ProcessResult};
pub use html::HtmlBackend;
pub use renderer::{MarkdownRenderer, RenderResult};
pub use state::{TocEntry, escape_html, slugify};
pub use tabs::{TabMetadata, TabsGroup, TabsPreprocessor, TabsProcessor};
