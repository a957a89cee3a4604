//! Code fence tracking for tab block parsing.
//!
//! Tab headers (`=== "Title"`) that appear inside fenced code blocks are
//! literal code and must not open or switch tabs.

/// Tracks code fence state during line-by-line processing.
///
/// Fences use three or more backticks or tildes. The closing fence must use
/// the same character and be at least as long as the opening one.
#[derive(Debug, Default)]
pub(crate) struct FenceTracker {
    /// Fence character and length of the open fence.
    open: Option<(char, usize)>,
}

impl FenceTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn in_fence(&self) -> bool {
        self.open.is_some()
    }

    /// Forget any open fence.
    pub(crate) fn reset(&mut self) {
        self.open = None;
    }

    /// Update fence state with the next line.
    ///
    /// Returns `true` if the line opens or closes a fence.
    pub(crate) fn update(&mut self, line: &str) -> bool {
        let trimmed = line.trim_start();
        match self.open {
            Some((ch, len)) => {
                let closes = fence_run(trimmed).is_some_and(|(c, n)| {
                    c == ch && n >= len && trimmed[n..].chars().all(char::is_whitespace)
                });
                if closes {
                    self.open = None;
                }
                closes
            }
            None => {
                self.open = fence_run(trimmed);
                self.open.is_some()
            }
        }
    }
}

/// Leading run of fence characters, if long enough to be a fence.
fn fence_run(trimmed: &str) -> Option<(char, usize)> {
    let first = trimmed.chars().next().filter(|&c| c == '`' || c == '~')?;
    let count = trimmed.chars().take_while(|&c| c == first).count();
    (count >= 3).then_some((first, count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_fence_initially() {
        let tracker = FenceTracker::new();
        assert!(!tracker.in_fence());
    }

    #[test]
    fn test_backtick_fence() {
        let mut tracker = FenceTracker::new();

        assert!(tracker.update("```latex"));
        assert!(tracker.in_fence());

        assert!(!tracker.update("=== \"Not a tab\""));
        assert!(tracker.in_fence());

        assert!(tracker.update("```"));
        assert!(!tracker.in_fence());
    }

    #[test]
    fn test_tilde_fence() {
        let mut tracker = FenceTracker::new();

        assert!(tracker.update("~~~tikz"));
        assert!(!tracker.update("\\draw (0,0) circle (1);"));
        assert!(tracker.update("~~~"));
        assert!(!tracker.in_fence());
    }

    #[test]
    fn test_shorter_fence_not_closing() {
        let mut tracker = FenceTracker::new();

        assert!(tracker.update("````"));
        assert!(!tracker.update("```"));
        assert!(tracker.in_fence());
        assert!(tracker.update("`````"));
        assert!(!tracker.in_fence());
    }

    #[test]
    fn test_mixed_fence_chars() {
        let mut tracker = FenceTracker::new();

        assert!(tracker.update("```"));
        assert!(!tracker.update("~~~"));
        assert!(tracker.in_fence());
    }

    #[test]
    fn test_closing_fence_with_info_is_content() {
        let mut tracker = FenceTracker::new();

        assert!(tracker.update("```"));
        assert!(!tracker.update("```latex"));
        assert!(tracker.in_fence());
    }

    #[test]
    fn test_indented_fence_and_reset() {
        let mut tracker = FenceTracker::new();

        assert!(tracker.update("   ```latex"));
        assert!(tracker.in_fence());

        tracker.reset();
        assert!(!tracker.in_fence());
    }

    #[test]
    fn test_two_backticks_not_fence() {
        let mut tracker = FenceTracker::new();

        assert!(!tracker.update("``inline``"));
        assert!(!tracker.in_fence());
    }
}
