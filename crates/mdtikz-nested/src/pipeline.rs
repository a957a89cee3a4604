//! Host markdown pipeline.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use mdtikz_renderer::{
    HtmlBackend, MarkdownRenderer, RenderResult, TabsPreprocessor, TabsProcessor,
};

use crate::headings::{HeadingPolicy, KeepHeadings};
use crate::namespace::NamespaceCounter;
use crate::stage::{Stage, sort_stages};

/// Default tag of automatically generated id prefixes.
pub const DEFAULT_TAG: &str = "tizk";

/// Document-wide markdown converter.
///
/// Holds an immutable, priority-ordered list of [`Stage`]s and the render
/// options. Cloning is cheap and clones share the namespace counter.
/// Per-document state lives in a fresh renderer created by every
/// [`render`](Self::render) call, so one pipeline can render many documents,
/// also from several threads.
///
/// # Example
///
/// ```
/// use mdtikz_nested::{Pipeline, Stage};
///
/// let pipeline = Pipeline::builder().with_stage(Stage::tabs(50)).build();
/// let result = pipeline.render("=== \"A\"\n    Alpha.\n");
///
/// assert!(result.html.contains(r#"role="tablist""#));
/// ```
#[derive(Clone)]
pub struct Pipeline {
    inner: Arc<PipelineInner>,
}

struct PipelineInner {
    stages: Vec<Stage>,
    gfm: bool,
    extract_title: bool,
    tag: String,
    heading_policy: Arc<dyn HeadingPolicy>,
    counter: Arc<NamespaceCounter>,
}

impl Pipeline {
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Stages in execution order (descending priority).
    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.inner.stages
    }

    #[must_use]
    pub fn gfm(&self) -> bool {
        self.inner.gfm
    }

    #[must_use]
    pub fn extract_title(&self) -> bool {
        self.inner.extract_title
    }

    /// Tag of automatically generated id prefixes (`<tag>-<n>--`).
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.inner.tag
    }

    #[must_use]
    pub fn heading_policy(&self) -> &dyn HeadingPolicy {
        self.inner.heading_policy.as_ref()
    }

    /// Counter shared by every nested conversion of this pipeline.
    #[must_use]
    pub fn counter(&self) -> &NamespaceCounter {
        &self.inner.counter
    }

    /// Render a markdown document.
    #[must_use]
    pub fn render(&self, text: &str) -> RenderResult {
        run_stages(self, text, self.extract_title(), "")
    }

    /// Pipeline with the same options and a different stage list.
    ///
    /// Title extraction is off: derived pipelines render fragments, not
    /// pages.
    pub(crate) fn derive(&self, mut stages: Vec<Stage>) -> Self {
        sort_stages(&mut stages);
        Self {
            inner: Arc::new(PipelineInner {
                stages,
                gfm: self.inner.gfm,
                extract_title: false,
                tag: self.inner.tag.clone(),
                heading_policy: Arc::clone(&self.inner.heading_policy),
                counter: Arc::clone(&self.inner.counter),
            }),
        }
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.inner.stages)
            .field("gfm", &self.inner.gfm)
            .field("extract_title", &self.inner.extract_title)
            .field("tag", &self.inner.tag)
            .field("counter", &self.inner.counter)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Pipeline`].
///
/// Stage names are not checked here; invalid registrations are reported
/// when a nested conversion tries to clone the pipeline.
pub struct PipelineBuilder {
    stages: Vec<Stage>,
    gfm: bool,
    extract_title: bool,
    tag: String,
    heading_policy: Arc<dyn HeadingPolicy>,
    counter: Option<Arc<NamespaceCounter>>,
}

impl PipelineBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            gfm: true,
            extract_title: false,
            tag: DEFAULT_TAG.to_owned(),
            heading_policy: Arc::new(KeepHeadings),
            counter: None,
        }
    }

    /// Register a stage.
    #[must_use]
    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Enable or disable GitHub Flavored Markdown (enabled by default).
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    /// Report the first H1 as the document title.
    #[must_use]
    pub fn with_title_extraction(mut self, enabled: bool) -> Self {
        self.extract_title = enabled;
        self
    }

    /// Tag of automatically generated id prefixes.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    #[must_use]
    pub fn with_heading_policy(mut self, policy: impl HeadingPolicy + 'static) -> Self {
        self.heading_policy = Arc::new(policy);
        self
    }

    /// Share a namespace counter with other pipelines.
    #[must_use]
    pub fn with_counter(mut self, counter: Arc<NamespaceCounter>) -> Self {
        self.counter = Some(counter);
        self
    }

    #[must_use]
    pub fn build(self) -> Pipeline {
        let mut stages = self.stages;
        sort_stages(&mut stages);
        Pipeline {
            inner: Arc::new(PipelineInner {
                stages,
                gfm: self.gfm,
                extract_title: self.extract_title,
                tag: self.tag,
                heading_policy: self.heading_policy,
                counter: self.counter.unwrap_or_default(),
            }),
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Render `text` through the stages of `pipeline`.
///
/// `id_prefix` only takes effect when the pipeline has an id-prefix stage.
pub(crate) fn run_stages(
    pipeline: &Pipeline,
    text: &str,
    extract_title: bool,
    id_prefix: &str,
) -> RenderResult {
    let stages = pipeline.stages();
    let id_prefix = if stages.iter().any(Stage::is_id_prefix) {
        id_prefix
    } else {
        ""
    };

    let mut warnings = Vec::new();
    let mut groups = Vec::new();
    let source = if stages.iter().any(Stage::is_tabs) {
        let mut preprocessor = TabsPreprocessor::new();
        let processed = preprocessor.process(text);
        warnings.extend_from_slice(preprocessor.warnings());
        groups = preprocessor.into_groups();
        Cow::Owned(processed)
    } else {
        Cow::Borrowed(text)
    };

    let mut renderer = MarkdownRenderer::<HtmlBackend>::new()
        .with_gfm(pipeline.gfm())
        .with_id_prefix(id_prefix);
    if extract_title {
        renderer = renderer.with_title_extraction();
    }

    for stage in stages {
        if stage.is_tabs() {
            let processor =
                TabsProcessor::new(std::mem::take(&mut groups)).with_id_prefix(id_prefix);
            renderer.push_processor(Box::new(processor));
        } else if let Some(factory) = stage.factory() {
            renderer.push_processor(factory.create(pipeline));
        }
    }

    let mut result = renderer.render_markdown(&source);
    warnings.append(&mut result.warnings);
    result.warnings = warnings;
    result
}
