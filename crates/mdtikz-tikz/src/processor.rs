//! Code block processor for `tikz` fences.

use std::collections::HashMap;
use std::sync::Arc;

use mdtikz_nested::{DocumentConverter, Pipeline, ProcessorFactory, SourceTabs};
use mdtikz_renderer::{CodeBlockProcessor, ProcessResult, escape_html};

use crate::backend::FragmentBackend;
use crate::formatter::TikzFormatter;
use crate::options::TikzOptions;

/// Fence language handled by [`TikzProcessor`].
pub const TIKZ_LANGUAGE: &str = "tikz";

/// Replaces `tikz` code blocks with a figure/source tab group.
///
/// Rendering failures do not fail the document: the block is replaced with
/// an error figure and a warning is recorded.
pub struct TikzProcessor {
    formatter: TikzFormatter,
    defaults: TikzOptions,
    warnings: Vec<String>,
}

impl TikzProcessor {
    #[must_use]
    pub fn new(formatter: TikzFormatter, defaults: TikzOptions) -> Self {
        Self {
            formatter,
            defaults,
            warnings: Vec::new(),
        }
    }
}

impl CodeBlockProcessor for TikzProcessor {
    fn process(
        &mut self,
        language: &str,
        attrs: &HashMap<String, String>,
        source: &str,
        index: usize,
    ) -> ProcessResult {
        if language != TIKZ_LANGUAGE {
            return ProcessResult::PassThrough;
        }

        let (options, attr_warnings) = TikzOptions::from_attrs(attrs, &self.defaults);
        for warning in attr_warnings {
            tracing::warn!(index, warning = %warning, "Ignoring tikz attribute");
            self.warnings.push(format!("tikz block {index}: {warning}"));
        }

        match self.formatter.format(source, &options) {
            Ok(output) => {
                self.warnings.extend(
                    output
                        .warnings
                        .into_iter()
                        .map(|w| format!("tikz block {index}: {w}")),
                );
                ProcessResult::Nested {
                    html: output.html.into_string(),
                    headings: output.headings,
                }
            }
            Err(e) => {
                tracing::warn!(index, error = %e, "TikZ rendering failed");
                self.warnings.push(format!("tikz block {index}: {e}"));
                ProcessResult::Inline(error_figure(&e.to_string()))
            }
        }
    }

    fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

fn error_figure(message: &str) -> String {
    format!(
        r#"<figure class="diagram diagram-error"><pre>Diagram rendering failed: {}</pre></figure>"#,
        escape_html(message)
    )
}

/// Registers [`TikzProcessor`] on a [`Pipeline`].
///
/// ```
/// use mdtikz_nested::{Pipeline, Stage};
/// use mdtikz_tikz::{LatexBackend, TikzProcessorFactory};
///
/// let pipeline = Pipeline::builder()
///     .with_stage(Stage::tabs(50))
///     .with_stage(Stage::processor(
///         "tikz",
///         30,
///         TikzProcessorFactory::new(LatexBackend::default()),
///     ))
///     .build();
///
/// assert_eq!(pipeline.stages().len(), 2);
/// ```
#[derive(Clone)]
pub struct TikzProcessorFactory {
    backend: Arc<dyn FragmentBackend>,
    defaults: TikzOptions,
    tabs: SourceTabs,
}

impl TikzProcessorFactory {
    pub fn new(backend: impl FragmentBackend + 'static) -> Self {
        Self::from_shared(Arc::new(backend))
    }

    #[must_use]
    pub fn from_shared(backend: Arc<dyn FragmentBackend>) -> Self {
        Self {
            backend,
            defaults: TikzOptions::default(),
            tabs: SourceTabs::default(),
        }
    }

    /// Options for blocks without `library` or `option` attributes.
    #[must_use]
    pub fn with_defaults(mut self, defaults: TikzOptions) -> Self {
        self.defaults = defaults;
        self
    }

    #[must_use]
    pub fn with_tabs(mut self, tabs: SourceTabs) -> Self {
        self.tabs = tabs;
        self
    }
}

impl ProcessorFactory for TikzProcessorFactory {
    fn create(&self, pipeline: &Pipeline) -> Box<dyn CodeBlockProcessor> {
        let formatter = TikzFormatter::new(
            Arc::clone(&self.backend),
            DocumentConverter::new(pipeline.clone()),
        )
        .with_tabs(self.tabs.clone());
        Box::new(TikzProcessor::new(formatter, self.defaults.clone()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use mdtikz_nested::{ReportHeadings, Stage};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::backend::BackendError;

    struct StubBackend;

    impl FragmentBackend for StubBackend {
        fn generate(
            &self,
            content: &str,
            options: &BTreeMap<String, String>,
        ) -> Result<String, BackendError> {
            Ok(format!(
                r#"<svg data-library="{}">{}</svg>"#,
                options["tikzlibrary"],
                content.len()
            ))
        }
    }

    struct FailingBackend;

    impl FragmentBackend for FailingBackend {
        fn generate(
            &self,
            _content: &str,
            _options: &BTreeMap<String, String>,
        ) -> Result<String, BackendError> {
            Err(BackendError::Timeout {
                program: "lualatex".to_owned(),
                timeout: std::time::Duration::from_secs(60),
            })
        }
    }

    fn pipeline(factory: TikzProcessorFactory) -> Pipeline {
        Pipeline::builder()
            .with_stage(Stage::tabs(50))
            .with_stage(Stage::processor("tikz", 30, factory))
            .build()
    }

    #[test]
    fn test_end_to_end() {
        let pipeline = pipeline(TikzProcessorFactory::new(StubBackend));
        let result = pipeline.render(
            "# Figures\n\n```tikz\n\\draw (0,0) -- (1,1);\n```\n\nAfter the figure.\n",
        );
        let html = &result.html;

        assert!(html.starts_with(r#"<h1 id="figures">Figures</h1><div class="tabs" id="tizk-1--tabs-0">"#));
        assert!(html.contains(r#"aria-selected="true" tabindex="0">Figure</button>"#));
        assert!(html.contains(r#"aria-selected="false" tabindex="-1">Code</button>"#));
        assert!(html.contains(r#"<svg data-library="">21</svg>"#));
        assert!(!html.contains("&lt;svg"));
        assert!(html.contains(r#"<code class="language-latex">\usetikzlibrary{}"#));
        assert!(html.contains(r"\begin{tikzpicture}[]"));
        assert!(html.ends_with("<p>After the figure.</p>"));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_attributes_and_defaults() {
        let factory = TikzProcessorFactory::new(StubBackend)
            .with_defaults(TikzOptions::new("calc", "thick"));
        let pipeline = pipeline(factory);

        let result = pipeline.render("```tikz library=arrows\nx\n```\n\n```tikz\ny\n```\n");
        let html = &result.html;

        assert!(html.contains(r#"<svg data-library="arrows">"#));
        assert!(html.contains(r#"<svg data-library="calc">"#));
        assert!(html.contains(r"\begin{tikzpicture}[thick]"));
    }

    #[test]
    fn test_each_block_gets_own_namespace() {
        let pipeline = pipeline(TikzProcessorFactory::new(StubBackend));
        let result = pipeline.render("```tikz\na\n```\n\n```tikz\nb\n```\n");

        assert!(result.html.contains(r#"id="tizk-1--tabs-0""#));
        assert!(result.html.contains(r#"id="tizk-2--tabs-0""#));
    }

    #[test]
    fn test_host_tabs_and_figure_tabs_do_not_collide() {
        let pipeline = pipeline(TikzProcessorFactory::new(StubBackend));
        let result = pipeline.render("=== \"Host\"\n    text\n\n```tikz\na\n```\n");

        assert!(result.html.contains(r#"<div class="tabs" id="tabs-0">"#));
        assert!(result.html.contains(r#"<div class="tabs" id="tizk-1--tabs-0">"#));
    }

    #[test]
    fn test_unknown_attribute_warns() {
        let pipeline = pipeline(TikzProcessorFactory::new(StubBackend));
        let result = pipeline.render("```tikz width=3cm\nx\n```\n");

        assert_eq!(
            result.warnings,
            ["tikz block 0: unknown tikz attribute 'width' ignored"]
        );
        assert!(result.html.contains("<svg"));
    }

    #[test]
    fn test_backend_failure_renders_error_figure() {
        let pipeline = pipeline(TikzProcessorFactory::new(FailingBackend));
        let result = pipeline.render("Before.\n\n```tikz\nx\n```\n");

        assert_eq!(
            result.html,
            r#"<p>Before.</p><figure class="diagram diagram-error"><pre>Diagram rendering failed: lualatex timed out after 60s</pre></figure>"#
        );
        assert_eq!(
            result.warnings,
            ["tikz block 0: lualatex timed out after 60s"]
        );

        // The host pipeline keeps working
        let again = pipeline.render("## Next");
        assert_eq!(again.html, r#"<h2 id="next">Next</h2>"#);
    }

    #[test]
    fn test_other_languages_pass_through() {
        let pipeline = pipeline(TikzProcessorFactory::new(StubBackend));
        let result = pipeline.render("```latex\n\\draw;\n```");
        assert_eq!(
            result.html,
            r#"<pre><code class="language-latex">\draw;
</code></pre>"#
        );
    }

    #[test]
    fn test_report_policy_keeps_host_toc() {
        let pipeline = Pipeline::builder()
            .with_stage(Stage::tabs(50))
            .with_stage(Stage::processor(
                "tikz",
                30,
                TikzProcessorFactory::new(StubBackend),
            ))
            .with_heading_policy(ReportHeadings)
            .build();

        let result = pipeline.render("## Plot\n\n```tikz\nx\n```\n\n## After");
        let ids: Vec<_> = result.toc.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["plot", "after"]);
    }
}
