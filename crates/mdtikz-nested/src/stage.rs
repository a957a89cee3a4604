//! Named, prioritized pipeline stages.

use std::fmt;
use std::sync::Arc;

use mdtikz_renderer::CodeBlockProcessor;

use crate::pipeline::Pipeline;

/// Name reserved for the id-prefixing stage installed by pipeline clones.
pub const ID_PREFIX_STAGE: &str = "id_prefix";

/// Priority of the id-prefixing stage.
pub const ID_PREFIX_PRIORITY: i32 = 4;

/// Creates a fresh code block processor for one render.
///
/// Processors carry per-document state (warnings, counters), so a pipeline
/// stores factories and instantiates processors on every render. `pipeline`
/// is the pipeline being rendered; processors that run nested conversions
/// use it as their host.
pub trait ProcessorFactory: Send + Sync {
    /// Create a processor for one render of `pipeline`.
    fn create(&self, pipeline: &Pipeline) -> Box<dyn CodeBlockProcessor>;
}

#[derive(Clone)]
enum StageKind {
    /// `=== "Title"` tab blocks.
    Tabs,
    /// Fenced code block processor.
    Processor(Arc<dyn ProcessorFactory>),
    /// Id namespacing for nested conversions.
    IdPrefix,
}

/// A named stage of a [`Pipeline`].
///
/// Stages are immutable once created and are copied by value into pipeline
/// clones.
#[derive(Clone)]
pub struct Stage {
    name: String,
    priority: i32,
    kind: StageKind,
}

impl Stage {
    /// Tab block stage, registered under the name `tabs`.
    #[must_use]
    pub fn tabs(priority: i32) -> Self {
        Self {
            name: "tabs".to_owned(),
            priority,
            kind: StageKind::Tabs,
        }
    }

    /// Code block processor stage.
    #[must_use]
    pub fn processor(
        name: impl Into<String>,
        priority: i32,
        factory: impl ProcessorFactory + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            priority,
            kind: StageKind::Processor(Arc::new(factory)),
        }
    }

    pub(crate) fn id_prefix() -> Self {
        Self {
            name: ID_PREFIX_STAGE.to_owned(),
            priority: ID_PREFIX_PRIORITY,
            kind: StageKind::IdPrefix,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub(crate) fn is_tabs(&self) -> bool {
        matches!(self.kind, StageKind::Tabs)
    }

    pub(crate) fn is_id_prefix(&self) -> bool {
        matches!(self.kind, StageKind::IdPrefix)
    }

    pub(crate) fn factory(&self) -> Option<&dyn ProcessorFactory> {
        match &self.kind {
            StageKind::Processor(factory) => Some(factory.as_ref()),
            StageKind::Tabs | StageKind::IdPrefix => None,
        }
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            StageKind::Tabs => "tabs",
            StageKind::Processor(_) => "processor",
            StageKind::IdPrefix => "id_prefix",
        };
        f.debug_struct("Stage")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("kind", &kind)
            .finish()
    }
}

/// Sort stages by descending priority, keeping registration order on ties.
pub(crate) fn sort_stages(stages: &mut [Stage]) {
    stages.sort_by_key(|stage| std::cmp::Reverse(stage.priority));
}
