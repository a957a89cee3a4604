//! Tabs post-processor for transforming `<tz-tabs>` to accessible HTML.
//!
//! Transforms the intermediate `<tz-tabs>` / `<tz-tab>` elements created by
//! [`TabsPreprocessor`](super::TabsPreprocessor) into accessible HTML with
//! ARIA attributes.

use std::collections::HashMap;
use std::fmt::Write;

use crate::code_block::{CodeBlockProcessor, ProcessResult};
use crate::state::escape_html;

use super::TabsGroup;

/// Post-processor that transforms `<tz-tabs>` elements to accessible HTML.
///
/// # Output HTML Structure
///
/// ```html
/// <div class="tabs" id="tabs-0">
///   <div class="tabs-buttons" role="tablist">
///     <button role="tab" id="tab-0-0" aria-controls="panel-0-0"
///             aria-selected="true" tabindex="0">Figure</button>
///     <button role="tab" id="tab-0-1" aria-controls="panel-0-1"
///             aria-selected="false" tabindex="-1">Code</button>
///   </div>
///   <div role="tabpanel" id="panel-0-0" aria-labelledby="tab-0-0">
///     <!-- content -->
///   </div>
///   <div role="tabpanel" id="panel-0-1" aria-labelledby="tab-0-1" hidden>
///     <!-- content -->
///   </div>
/// </div>
/// ```
///
/// With an id prefix every `id`, `aria-controls` and `aria-labelledby` value
/// starts with the prefix.
pub struct TabsProcessor {
    /// Map from group ID to group metadata.
    groups: HashMap<usize, TabsGroup>,
    id_prefix: String,
    warnings: Vec<String>,
}

impl TabsProcessor {
    /// Create a new processor with the given tab groups.
    #[must_use]
    pub fn new(groups: Vec<TabsGroup>) -> Self {
        Self {
            groups: groups.into_iter().map(|g| (g.id, g)).collect(),
            id_prefix: String::new(),
            warnings: Vec::new(),
        }
    }

    /// Prefix every generated id.
    ///
    /// The prefix is stored escaped, the same way heading ids are written.
    #[must_use]
    pub fn with_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = escape_html(&prefix.into());
        self
    }

    /// Transform a single `<tz-tabs>` block to accessible HTML.
    fn transform_tabs(&mut self, group_id: usize, inner_content: &str) -> String {
        let Some(group) = self.groups.get(&group_id) else {
            self.warnings.push(format!(
                "tabs group {group_id} not found in metadata, passing through"
            ));
            return format!(r#"<tz-tabs data-id="{group_id}">{inner_content}</tz-tabs>"#);
        };
        let prefix = &self.id_prefix;

        let mut output = String::with_capacity(inner_content.len() + 512);
        write!(output, r#"<div class="tabs" id="{prefix}tabs-{group_id}">"#).unwrap();

        output.push_str(r#"<div class="tabs-buttons" role="tablist">"#);
        for (idx, tab) in group.tabs.iter().enumerate() {
            let selected = idx == 0;
            write!(
                output,
                r#"<button role="tab" id="{prefix}tab-{group_id}-{id}" aria-controls="{prefix}panel-{group_id}-{id}" aria-selected="{selected}" tabindex="{tabindex}">{label}</button>"#,
                id = tab.id,
                tabindex = if selected { "0" } else { "-1" },
                label = escape_html(&tab.label)
            )
            .unwrap();
        }
        output.push_str("</div>");

        let panels = parse_tab_panels(inner_content);
        for (idx, (panel_tab_id, content)) in panels.iter().enumerate() {
            if !group.tabs.iter().any(|t| t.id == *panel_tab_id) {
                self.warnings.push(format!(
                    "tab {panel_tab_id} not found in group {group_id} metadata"
                ));
            }

            let hidden = if idx == 0 { "" } else { " hidden" };
            write!(
                output,
                r#"<div role="tabpanel" id="{prefix}panel-{group_id}-{panel_tab_id}" aria-labelledby="{prefix}tab-{group_id}-{panel_tab_id}"{hidden}>{content}</div>"#
            )
            .unwrap();
        }

        output.push_str("</div>");
        output
    }
}

impl CodeBlockProcessor for TabsProcessor {
    fn process(
        &mut self,
        _language: &str,
        _attrs: &HashMap<String, String>,
        _source: &str,
        _index: usize,
    ) -> ProcessResult {
        // Only post-processing
        ProcessResult::PassThrough
    }

    fn post_process(&mut self, html: &mut String) {
        const CLOSE_TAG: &str = "</tz-tabs>";

        let mut result = String::with_capacity(html.len());
        let mut remaining = html.as_str();

        while let Some(start) = remaining.find("<tz-tabs") {
            result.push_str(&remaining[..start]);

            let Some(tag_end) = remaining[start..].find('>').map(|i| start + i + 1) else {
                result.push_str(&remaining[start..]);
                remaining = "";
                break;
            };
            let group_id = parse_data_id(&remaining[start..tag_end]);

            let Some(close_start) = remaining[tag_end..].find(CLOSE_TAG).map(|i| tag_end + i)
            else {
                result.push_str(&remaining[start..]);
                remaining = "";
                break;
            };
            let inner_content = &remaining[tag_end..close_start];
            let close_end = close_start + CLOSE_TAG.len();

            if let Some(id) = group_id {
                let transformed = self.transform_tabs(id, inner_content);
                result.push_str(&transformed);
            } else {
                self.warnings.push("tz-tabs element without data-id".to_owned());
                result.push_str(&remaining[start..close_end]);
            }

            remaining = &remaining[close_end..];
        }

        result.push_str(remaining);
        *html = result;
    }

    fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

/// Parse data-id attribute from an opening tag.
fn parse_data_id(tag: &str) -> Option<usize> {
    let value_start = tag.find("data-id=\"")? + "data-id=\"".len();
    let value_end = tag[value_start..].find('"').map(|i| value_start + i)?;
    tag[value_start..value_end].parse().ok()
}

/// Parse `<tz-tab>` elements from inner content.
///
/// Returns `(tab_id, content)` pairs with surrounding whitespace trimmed.
fn parse_tab_panels(content: &str) -> Vec<(usize, String)> {
    const CLOSE_TAG: &str = "</tz-tab>";

    let mut panels = Vec::new();
    let mut remaining = content;

    while let Some(start) = remaining.find("<tz-tab ") {
        let Some(tag_end) = remaining[start..].find('>').map(|i| start + i + 1) else {
            break;
        };
        let tab_id = parse_data_id(&remaining[start..tag_end]);

        let Some(close_start) = remaining[tag_end..].find(CLOSE_TAG).map(|i| tag_end + i) else {
            break;
        };

        if let Some(id) = tab_id {
            panels.push((id, remaining[tag_end..close_start].trim().to_owned()));
        }

        remaining = &remaining[close_start + CLOSE_TAG.len()..];
    }

    panels
}
