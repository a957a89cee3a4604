//! Tabbed content blocks for markdown.
//!
//! Recognizes consecutive `=== "Title"` blocks with bodies indented by four
//! spaces as one tab group:
//!
//! ```markdown
//! === "Figure"
//!     Rendered output.
//!
//! === "Code"
//!     ```latex
//!     \draw (0,0) -- (1,1);
//!     ```
//! ```
//!
//! The group ends at the first non-blank line that is neither indented nor a
//! tab header.
//!
//! # Architecture
//!
//! The tabs system uses two-phase processing:
//!
//! 1. **Preprocessing** ([`TabsPreprocessor`]): Converts tab blocks to
//!    intermediate `<tz-tabs>` / `<tz-tab>` HTML elements that pass through
//!    pulldown-cmark unchanged, with the tab bodies dedented in between.
//!
//! 2. **Post-processing** ([`TabsProcessor`]): Transforms the intermediate
//!    elements to accessible HTML with ARIA attributes.
//!
//! # Usage
//!
//! ```
//! use mdtikz_renderer::{HtmlBackend, MarkdownRenderer, TabsPreprocessor, TabsProcessor};
//!
//! let markdown = "=== \"Figure\"\n    Output.\n\n=== \"Code\"\n    Source.\n";
//!
//! // Phase 1: Preprocess tab blocks
//! let mut preprocessor = TabsPreprocessor::new();
//! let processed = preprocessor.process(markdown);
//! let groups = preprocessor.into_groups();
//!
//! // Phase 2: Render with post-processor
//! let result = MarkdownRenderer::<HtmlBackend>::new()
//!     .with_processor(TabsProcessor::new(groups))
//!     .render_markdown(&processed);
//!
//! assert!(result.html.contains(r#"role="tablist""#));
//! ```

mod fence;
mod preprocessor;
mod processor;

pub use preprocessor::{TabMetadata, TabsGroup, TabsPreprocessor};
pub use processor::TabsProcessor;
