//! TikZ figures for markdown.
//!
//! `tikz` code blocks are compiled to SVG with a [`FragmentBackend`]
//! (by default [`LatexBackend`]: `lualatex` followed by `pdf2svg`) and
//! replaced with a tab group showing the figure next to its LaTeX source.
//! Each group is converted with an isolated copy of the host pipeline, so
//! its element ids never collide with the host document or other figures.
//!
//! # Fence attributes
//!
//! ````markdown
//! ```tikz library=arrows.meta option="scale=2"
//! \draw[-Stealth] (0,0) -- (1,1);
//! ```
//! ````
//!
//! - `library`: argument of `\usetikzlibrary`
//! - `option`: options of the `tikzpicture` environment

mod backend;
mod formatter;
mod options;
mod processor;

pub use backend::{BackendError, DEFAULT_TIMEOUT, FragmentBackend, LatexBackend, LatexConfig, latex_document};
pub use formatter::{FormatError, TikzFormatter};
pub use options::TikzOptions;
pub use processor::{TIKZ_LANGUAGE, TikzProcessor, TikzProcessorFactory};
