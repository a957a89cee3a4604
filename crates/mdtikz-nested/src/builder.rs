//! Pipeline clones for nested conversions.

use std::collections::HashSet;

use mdtikz_renderer::TocEntry;

use crate::error::{ConfigurationError, HeadingPolicyError};
use crate::headings::NestedDocument;
use crate::pipeline::{Pipeline, run_stages};
use crate::stage::{ID_PREFIX_STAGE, Stage};

/// Builds a [`PipelineClone`] from a host pipeline.
pub struct SubPipelineBuilder<'a> {
    host: &'a Pipeline,
}

impl<'a> SubPipelineBuilder<'a> {
    #[must_use]
    pub fn new(host: &'a Pipeline) -> Self {
        Self { host }
    }

    /// Validate the host's stage registration and build the clone.
    ///
    /// The host's stages are copied by value and the id-prefix stage is
    /// installed. An id-prefix stage already present on the host (the host
    /// being a clone itself) is replaced rather than duplicated.
    pub fn build(self) -> Result<PipelineClone, ConfigurationError> {
        let registered: Vec<&Stage> = self
            .host
            .stages()
            .iter()
            .filter(|stage| !stage.is_id_prefix())
            .collect();
        validate_stages(&registered)?;

        let mut stages: Vec<Stage> = registered.into_iter().cloned().collect();
        stages.push(Stage::id_prefix());

        Ok(PipelineClone {
            pipeline: self.host.derive(stages),
            id_prefix: String::new(),
        })
    }
}

fn validate_stages(stages: &[&Stage]) -> Result<(), ConfigurationError> {
    let mut seen = HashSet::with_capacity(stages.len());
    for (position, stage) in stages.iter().enumerate() {
        let name = stage.name();
        if name.is_empty() {
            return Err(ConfigurationError::UnnamedStage { position });
        }
        if name == ID_PREFIX_STAGE {
            return Err(ConfigurationError::ReservedStage(name.to_owned()));
        }
        if !seen.insert(name) {
            return Err(ConfigurationError::DuplicateStage(name.to_owned()));
        }
    }
    Ok(())
}

/// Output of one clone render, before payload substitution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NestedRender {
    /// Rendered HTML after the heading policy ran.
    pub html: String,
    /// Headings the heading policy hands to the host.
    pub headings: Vec<TocEntry>,
    /// Warnings from the nested render.
    pub warnings: Vec<String>,
}

/// Single-use copy of a host pipeline with an id-prefix stage.
///
/// Owns its own active prefix (empty until a
/// [`NamespaceScope`](crate::NamespaceScope) is entered) and never shares
/// per-document state with the host.
#[derive(Debug)]
pub struct PipelineClone {
    pipeline: Pipeline,
    id_prefix: String,
}

impl PipelineClone {
    /// Pipeline the clone renders with.
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    #[must_use]
    pub fn active_prefix(&self) -> &str {
        &self.id_prefix
    }

    pub(crate) fn set_prefix(&mut self, prefix: String) {
        self.id_prefix = prefix;
    }

    /// Render `text` under the active prefix and apply the heading policy.
    pub fn render(&self, text: &str) -> Result<NestedRender, HeadingPolicyError> {
        let result = run_stages(&self.pipeline, text, false, &self.id_prefix);
        let mut doc = NestedDocument {
            html: result.html,
            headings: result.toc,
        };

        let policy = self.pipeline.heading_policy();
        let headings = policy.extract_headings(&doc);
        policy.strip_headings(&mut doc)?;

        Ok(NestedRender {
            html: doc.html,
            headings,
            warnings: result.warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use mdtikz_renderer::{CodeBlockProcessor, ProcessResult};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::headings::{ReportHeadings, StripHeadings};
    use crate::stage::{ID_PREFIX_PRIORITY, ProcessorFactory};

    struct Noop;

    impl CodeBlockProcessor for Noop {
        fn process(
            &mut self,
            _language: &str,
            _attrs: &HashMap<String, String>,
            _source: &str,
            _index: usize,
        ) -> ProcessResult {
            ProcessResult::PassThrough
        }
    }

    struct NoopFactory;

    impl ProcessorFactory for NoopFactory {
        fn create(&self, _pipeline: &Pipeline) -> Box<dyn CodeBlockProcessor> {
            Box::new(Noop)
        }
    }

    #[test]
    fn test_clone_installs_id_prefix_stage() {
        let host = Pipeline::builder()
            .with_stage(Stage::tabs(50))
            .with_stage(Stage::processor("noop", 1, NoopFactory))
            .build();
        let clone = SubPipelineBuilder::new(&host).build().unwrap();

        let order: Vec<_> = clone
            .pipeline()
            .stages()
            .iter()
            .map(|s| (s.name(), s.priority()))
            .collect();
        assert_eq!(
            order,
            [("tabs", 50), (ID_PREFIX_STAGE, ID_PREFIX_PRIORITY), ("noop", 1)]
        );
        assert_eq!(clone.active_prefix(), "");

        // Host registration is untouched
        assert_eq!(host.stages().len(), 2);
    }

    #[test]
    fn test_clone_of_clone_has_single_id_prefix_stage() {
        let host = Pipeline::builder().with_stage(Stage::tabs(50)).build();
        let clone = SubPipelineBuilder::new(&host).build().unwrap();
        let nested = SubPipelineBuilder::new(clone.pipeline()).build().unwrap();

        let prefix_stages = nested
            .pipeline()
            .stages()
            .iter()
            .filter(|s| s.is_id_prefix())
            .count();
        assert_eq!(prefix_stages, 1);
    }

    #[test]
    fn test_duplicate_stage_rejected() {
        let host = Pipeline::builder()
            .with_stage(Stage::tabs(50))
            .with_stage(Stage::tabs(40))
            .build();

        let err = SubPipelineBuilder::new(&host).build().unwrap_err();
        assert_eq!(err, ConfigurationError::DuplicateStage("tabs".to_owned()));
    }

    #[test]
    fn test_unnamed_stage_rejected() {
        let host = Pipeline::builder()
            .with_stage(Stage::processor("", 10, NoopFactory))
            .build();

        let err = SubPipelineBuilder::new(&host).build().unwrap_err();
        assert_eq!(err, ConfigurationError::UnnamedStage { position: 0 });
    }

    #[test]
    fn test_reserved_stage_rejected() {
        let host = Pipeline::builder()
            .with_stage(Stage::processor(ID_PREFIX_STAGE, 10, NoopFactory))
            .build();

        let err = SubPipelineBuilder::new(&host).build().unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::ReservedStage(ID_PREFIX_STAGE.to_owned())
        );
    }

    #[test]
    fn test_clone_never_extracts_title() {
        let host = Pipeline::builder().with_title_extraction(true).build();
        let clone = SubPipelineBuilder::new(&host).build().unwrap();

        assert!(!clone.pipeline().extract_title());
        let rendered = clone.render("# Nested").unwrap();
        assert_eq!(rendered.html, r#"<h1 id="nested">Nested</h1>"#);
    }

    #[test]
    fn test_clone_state_is_fresh_per_render() {
        let host = Pipeline::builder().build();
        let clone = SubPipelineBuilder::new(&host).build().unwrap();

        let first = clone.render("## Axes").unwrap();
        let second = clone.render("## Axes").unwrap();
        assert_eq!(first.html, second.html);
    }

    #[test]
    fn test_render_applies_report_policy() {
        let host = Pipeline::builder()
            .with_heading_policy(ReportHeadings)
            .build();
        let mut clone = SubPipelineBuilder::new(&host).build().unwrap();
        clone.set_prefix("tizk-4--".to_owned());

        let rendered = clone.render("## Axes\n\ntext").unwrap();
        assert_eq!(
            rendered.headings,
            [TocEntry {
                level: 2,
                title: "Axes".to_owned(),
                id: "tizk-4--axes".to_owned(),
            }]
        );
        assert!(rendered.html.contains(r#"<h2 id="tizk-4--axes">"#));
    }

    #[test]
    fn test_render_applies_strip_policy() {
        let host = Pipeline::builder().with_heading_policy(StripHeadings).build();
        let clone = SubPipelineBuilder::new(&host).build().unwrap();

        let rendered = clone.render("## Axes\n\ntext").unwrap();
        assert_eq!(rendered.html, "<p>text</p>");
        assert!(rendered.headings.is_empty());
    }
}
