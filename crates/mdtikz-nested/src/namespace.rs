//! Id namespaces for nested conversions.
//!
//! Every nested conversion renders with its own id prefix so that headings
//! and tab ids of several embedded fragments never collide on one page.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::builder::{NestedRender, PipelineClone};
use crate::error::HeadingPolicyError;

/// Monotonic counter numbering nested conversions.
///
/// Starts at 0 and is never reset. The first [`advance`](Self::advance)
/// returns 1.
#[derive(Debug, Default)]
pub struct NamespaceCounter {
    value: AtomicU64,
}

impl NamespaceCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the counter and return the new value.
    pub fn advance(&self) -> u64 {
        self.value.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Number of conversions counted so far.
    #[must_use]
    pub fn current(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Active id prefix of a pipeline clone.
///
/// Entering the scope activates the prefix on the clone; dropping it
/// restores the empty prefix on every exit path, early returns and panics
/// included.
pub struct NamespaceScope<'a> {
    clone: &'a mut PipelineClone,
}

impl<'a> NamespaceScope<'a> {
    /// Activate `prefix` on `clone` until the scope is dropped.
    pub fn enter(clone: &'a mut PipelineClone, prefix: &str) -> Self {
        debug_assert!(
            clone.active_prefix().is_empty(),
            "namespace scope entered on a clone with an active prefix"
        );
        clone.set_prefix(prefix.to_owned());
        Self { clone }
    }

    /// Prefix active in this scope.
    #[must_use]
    pub fn prefix(&self) -> &str {
        self.clone.active_prefix()
    }

    /// Render `text` with the clone under the active prefix.
    pub fn render(&self, text: &str) -> Result<NestedRender, HeadingPolicyError> {
        self.clone.render(text)
    }
}

impl Drop for NamespaceScope<'_> {
    fn drop(&mut self) {
        self.clone.set_prefix(String::new());
    }
}
