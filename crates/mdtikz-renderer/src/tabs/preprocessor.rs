//! Tabs preprocessor for converting `=== "Title"` blocks to HTML elements.
//!
//! Converts tab blocks to `<tz-tabs>` / `<tz-tab>` elements that pass through
//! pulldown-cmark unchanged. Tab bodies are dedented so they render as
//! regular markdown between the elements.

use super::fence::FenceTracker;

/// Metadata for a single tab within a tab group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TabMetadata {
    /// Unique ID for this tab within the document.
    pub id: usize,
    /// Display label for the tab button.
    pub label: String,
    /// Line number of the tab header (1-indexed).
    pub line: usize,
}

/// Metadata for a tab group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TabsGroup {
    /// Unique ID for this tab group.
    pub id: usize,
    /// Tabs within this group.
    pub tabs: Vec<TabMetadata>,
}

/// Parser state for tab block processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Normal markdown processing.
    Normal,
    /// Inside the body of a tab.
    InTab,
}

/// Preprocessor that converts tab blocks to HTML elements.
///
/// - first `=== "Label"` → `<tz-tabs data-id="N">` + `<tz-tab data-id="M">`
/// - following `=== "Label"` → closes the previous tab, opens the next one
/// - first non-indented, non-header line → `</tz-tab></tz-tabs>`
///
/// # Example
///
/// ```
/// use mdtikz_renderer::TabsPreprocessor;
///
/// let mut preprocessor = TabsPreprocessor::new();
/// let output = preprocessor.process(
///     "=== \"Figure\"\n    <svg/>\n\n=== \"Code\"\n    Source.\n\nAfter.\n",
/// );
///
/// assert!(output.contains("<tz-tabs"));
/// assert!(output.contains("\nAfter.\n"));
///
/// let groups = preprocessor.into_groups();
/// assert_eq!(groups.len(), 1);
/// assert_eq!(groups[0].tabs.len(), 2);
/// ```
pub struct TabsPreprocessor {
    state: State,
    fence: FenceTracker,
    warnings: Vec<String>,
    groups: Vec<TabsGroup>,
    current_group: Option<TabsGroup>,
    next_group_id: usize,
    next_tab_id: usize,
    /// Blank lines seen inside a tab and not yet emitted.
    pending_blank: usize,
}

impl TabsPreprocessor {
    /// Create a new preprocessor.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: State::Normal,
            fence: FenceTracker::new(),
            warnings: Vec::new(),
            groups: Vec::new(),
            current_group: None,
            next_group_id: 0,
            next_tab_id: 0,
            pending_blank: 0,
        }
    }

    /// Process markdown text and return transformed output.
    ///
    /// Metadata is collected and can be retrieved with
    /// [`into_groups`](Self::into_groups). A missing trailing newline in
    /// `input` stays missing in the output.
    #[must_use]
    pub fn process(&mut self, input: &str) -> String {
        let mut output = String::with_capacity(input.len() + 128);

        for (idx, line) in input.lines().enumerate() {
            self.process_line(line, idx + 1, &mut output);
        }
        self.finalize(&mut output);

        if !input.ends_with('\n') && output.ends_with('\n') {
            output.pop();
        }
        output
    }

    /// Get warnings generated during processing.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Consume the preprocessor and return collected tab groups.
    #[must_use]
    pub fn into_groups(self) -> Vec<TabsGroup> {
        self.groups
    }

    fn process_line(&mut self, line: &str, line_num: usize, output: &mut String) {
        match self.state {
            State::Normal => self.process_normal(line, line_num, output),
            State::InTab => self.process_in_tab(line, line_num, output),
        }
    }

    fn process_normal(&mut self, line: &str, line_num: usize, output: &mut String) {
        if self.fence.update(line) || self.fence.in_fence() {
            push_line(output, line);
            return;
        }

        match parse_header(line) {
            Some(Header::Tab(label)) => {
                let group_id = self.next_group_id;
                self.next_group_id += 1;
                self.current_group = Some(TabsGroup {
                    id: group_id,
                    tabs: Vec::new(),
                });
                let tab_id = self.push_tab(label, line_num);
                self.state = State::InTab;
                // Blank lines around tags for pulldown-cmark block parsing
                output.push_str(&format!(
                    "\n<tz-tabs data-id=\"{group_id}\">\n<tz-tab data-id=\"{tab_id}\">\n\n"
                ));
            }
            Some(Header::Unquoted) => {
                self.warnings.push(format!(
                    "line {line_num}: tab title must be quoted, passing through"
                ));
                push_line(output, line);
            }
            None => push_line(output, line),
        }
    }

    fn process_in_tab(&mut self, line: &str, line_num: usize, output: &mut String) {
        if line.trim().is_empty() {
            self.pending_blank += 1;
            return;
        }

        if let Some(body) = dedent(line) {
            for _ in 0..std::mem::take(&mut self.pending_blank) {
                output.push('\n');
            }
            self.fence.update(body);
            push_line(output, body);
            return;
        }

        if !self.fence.in_fence()
            && let Some(Header::Tab(label)) = parse_header(line)
        {
            self.pending_blank = 0;
            let tab_id = self.push_tab(label, line_num);
            output.push_str(&format!("\n</tz-tab>\n<tz-tab data-id=\"{tab_id}\">\n\n"));
            return;
        }

        self.close_group(output);
        self.process_normal(line, line_num, output);
    }

    fn push_tab(&mut self, label: String, line_num: usize) -> usize {
        let tab_id = self.next_tab_id;
        self.next_tab_id += 1;
        if let Some(ref mut group) = self.current_group {
            group.tabs.push(TabMetadata {
                id: tab_id,
                label,
                line: line_num,
            });
        }
        tab_id
    }

    /// Close the open tab and its group.
    fn close_group(&mut self, output: &mut String) {
        if self.fence.in_fence() {
            let line = self
                .current_group
                .as_ref()
                .and_then(|g| g.tabs.last())
                .map_or(0, |t| t.line);
            self.warnings
                .push(format!("line {line}: unclosed code fence in tab"));
        }
        if let Some(group) = self.current_group.take() {
            self.groups.push(group);
        }
        self.fence.reset();
        self.pending_blank = 0;
        self.state = State::Normal;
        output.push_str("\n</tz-tab>\n</tz-tabs>\n\n");
    }

    /// Close a group left open at end of input.
    fn finalize(&mut self, output: &mut String) {
        if self.state == State::InTab {
            self.close_group(output);
        }
    }
}

impl Default for TabsPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

fn push_line(output: &mut String, line: &str) {
    output.push_str(line);
    output.push('\n');
}

/// Parsed tab header line.
#[derive(Debug, PartialEq, Eq)]
enum Header {
    Tab(String),
    Unquoted,
}

/// Parse a non-indented `=== "Title"` line.
fn parse_header(line: &str) -> Option<Header> {
    let rest = line.strip_prefix("===")?;
    if !rest.starts_with([' ', '\t']) {
        return None;
    }
    let rest = rest.trim();
    if rest.len() >= 2 && rest.starts_with('"') && rest.ends_with('"') {
        Some(Header::Tab(rest[1..rest.len() - 1].to_owned()))
    } else {
        Some(Header::Unquoted)
    }
}

/// Strip one level of tab body indentation (four spaces or a tab).
fn dedent(line: &str) -> Option<&str> {
    line.strip_prefix("    ").or_else(|| line.strip_prefix('\t'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_header() {
        assert_eq!(
            parse_header(r#"=== "Figure""#),
            Some(Header::Tab("Figure".to_owned()))
        );
        assert_eq!(
            parse_header("===   \"Code\"  "),
            Some(Header::Tab("Code".to_owned()))
        );
        assert_eq!(
            parse_header(r#"=== "a | b""#),
            Some(Header::Tab("a | b".to_owned()))
        );
        assert_eq!(parse_header(r#"=== """#), Some(Header::Tab(String::new())));
        assert_eq!(parse_header("=== Figure"), Some(Header::Unquoted));
        assert_eq!(parse_header("===\"Figure\""), None);
        assert_eq!(parse_header("    === \"Figure\""), None);
        assert_eq!(parse_header("regular text"), None);
    }

    #[test]
    fn test_dedent() {
        assert_eq!(dedent("    body"), Some("body"));
        assert_eq!(dedent("        nested"), Some("    nested"));
        assert_eq!(dedent("\tbody"), Some("body"));
        assert_eq!(dedent("  short"), None);
        assert_eq!(dedent("body"), None);
    }

    #[test]
    fn test_simple_tabs() {
        let mut pp = TabsPreprocessor::new();
        let output = pp.process("=== \"Figure\"\n    Output.\n\n=== \"Code\"\n    Source.\n");

        assert_eq!(
            output,
            "\n<tz-tabs data-id=\"0\">\n<tz-tab data-id=\"0\">\n\nOutput.\n\
             \n</tz-tab>\n<tz-tab data-id=\"1\">\n\nSource.\n\
             \n</tz-tab>\n</tz-tabs>\n\n"
        );
        assert!(pp.warnings().is_empty());

        let groups = pp.into_groups();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].id, 0);
        assert_eq!(groups[0].tabs[0].label, "Figure");
        assert_eq!(groups[0].tabs[0].line, 1);
        assert_eq!(groups[0].tabs[1].label, "Code");
        assert_eq!(groups[0].tabs[1].line, 4);
    }

    #[test]
    fn test_group_closed_by_unindented_line() {
        let mut pp = TabsPreprocessor::new();
        let output = pp.process("Before.\n\n=== \"A\"\n    One.\n\nAfter.");

        assert!(output.starts_with("Before.\n\n\n<tz-tabs"));
        assert!(output.contains("One.\n\n</tz-tab>\n</tz-tabs>\n\nAfter."));
        assert!(!output.ends_with('\n'));
    }

    #[test]
    fn test_blank_lines_inside_tab_body_are_kept() {
        let mut pp = TabsPreprocessor::new();
        let output = pp.process("=== \"A\"\n    First.\n\n\n    Second.\n");

        assert!(output.contains("First.\n\n\nSecond.\n"));
    }

    #[test]
    fn test_fenced_block_inside_tab() {
        let mut pp = TabsPreprocessor::new();
        let output = pp.process(
            "=== \"Code\"\n    ```latex\n    \\draw (0,0);\n\n    === \"Not a tab\"\n    ```\n",
        );

        assert!(output.contains("```latex\n\\draw (0,0);\n\n=== \"Not a tab\"\n```\n"));
        let groups = pp.into_groups();
        assert_eq!(groups[0].tabs.len(), 1);
    }

    #[test]
    fn test_header_inside_fence_is_literal() {
        let mut pp = TabsPreprocessor::new();
        let output = pp.process("```markdown\n=== \"A\"\n    body\n```\n");

        assert_eq!(output, "```markdown\n=== \"A\"\n    body\n```\n");
        assert!(pp.into_groups().is_empty());
    }

    #[test]
    fn test_consecutive_groups_get_distinct_ids() {
        let mut pp = TabsPreprocessor::new();
        let output = pp.process("=== \"A\"\n    a\n\nBreak.\n\n=== \"B\"\n    b\n");

        assert!(output.contains(r#"<tz-tabs data-id="0">"#));
        assert!(output.contains(r#"<tz-tabs data-id="1">"#));
        assert!(output.contains(r#"<tz-tab data-id="1">"#));

        let groups = pp.into_groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1].tabs[0].id, 1);
    }

    #[test]
    fn test_unquoted_title_warning() {
        let mut pp = TabsPreprocessor::new();
        let output = pp.process("=== Figure\n    body\n");

        assert!(pp.warnings().iter().any(|w| w.contains("quoted")));
        assert!(output.contains("=== Figure"));
        assert!(pp.into_groups().is_empty());
    }

    #[test]
    fn test_unclosed_fence_warning() {
        let mut pp = TabsPreprocessor::new();
        let _output = pp.process("=== \"Code\"\n    ```latex\n    \\draw;\nAfter.\n");

        assert!(pp.warnings().iter().any(|w| w.contains("unclosed")));
    }

    #[test]
    fn test_no_tabs_passthrough() {
        let mut pp = TabsPreprocessor::new();
        let input = "# Title\n\nSome text with === inside.\n";
        assert_eq!(pp.process(input), input);
    }

    #[test]
    fn test_empty_input() {
        let mut pp = TabsPreprocessor::new();
        assert_eq!(pp.process(""), "");
    }
}
