//! Shared utility functions for markdown rendering.

use pulldown_cmark::HeadingLevel;

/// Convert heading level enum to number (1-6).
#[must_use]
pub(crate) fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Prefix the target of a same-document fragment link.
///
/// Links that don't start with `#` are returned unchanged.
pub(crate) fn prefix_fragment_link(url: &str, prefix: &str) -> String {
    match url.strip_prefix('#') {
        Some(fragment) if !prefix.is_empty() && !fragment.is_empty() => {
            format!("#{prefix}{fragment}")
        }
        _ => url.to_owned(),
    }
}
