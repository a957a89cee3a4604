//! Isolated nested markdown conversion.
//!
//! Renders a markdown fragment with a second, scoped pass of a host
//! pipeline's grammar and merges the result back as safe HTML:
//!
//! - [`Stash`]: opaque [`Token`]s standing in for raw payloads (SVG) that
//!   must not pass through the markdown grammar
//! - [`NamespaceScope`]: activates an id prefix on a pipeline clone for the
//!   duration of one conversion
//! - [`SubPipelineBuilder`]: copies a host [`Pipeline`]'s stages into a
//!   single-use [`PipelineClone`] with an id-prefix stage
//! - [`DocumentConverter`]: numbers, renders and substitutes one fragment
//! - [`tabbed`] / [`SourceTabs`]: tab group fragments pairing source code
//!   with its rendered result
//!
//! # Example
//!
//! ```
//! use mdtikz_nested::{DocumentConverter, Pipeline, SourceTabs, Stage, Stash};
//!
//! let pipeline = Pipeline::builder().with_stage(Stage::tabs(50)).build();
//! let converter = DocumentConverter::new(pipeline);
//!
//! let mut stash = Stash::new();
//! let token = stash.stash("<svg></svg>");
//! let fragment = SourceTabs::default().add_source("\\draw;", token.as_str(), "latex");
//!
//! let html = converter.convert(&fragment, Some(&stash), None).unwrap();
//! assert!(html.as_str().contains(r#"id="tizk-1--tabs-0""#));
//! assert!(html.as_str().contains("<svg></svg>"));
//! ```

mod builder;
mod converter;
mod error;
mod fragment;
mod headings;
mod namespace;
mod pipeline;
mod stage;
mod stash;

pub use builder::{NestedRender, PipelineClone, SubPipelineBuilder};
pub use converter::{DocumentConverter, NestedOutput, SafeHtml};
pub use error::{ConfigurationError, ConvertError, HeadingPolicyError};
pub use fragment::{SourceTabs, code_block, tabbed};
pub use headings::{HeadingPolicy, KeepHeadings, NestedDocument, ReportHeadings, StripHeadings};
pub use namespace::{NamespaceCounter, NamespaceScope};
pub use pipeline::{DEFAULT_TAG, Pipeline, PipelineBuilder};
pub use stage::{ID_PREFIX_PRIORITY, ID_PREFIX_STAGE, ProcessorFactory, Stage};
pub use stash::{Stash, Token};
