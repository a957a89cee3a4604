//! State structs tracking context during event processing.

use std::collections::{HashMap, HashSet};

use pulldown_cmark::Alignment;

/// State for tracking code block rendering.
#[derive(Default)]
pub(crate) struct CodeBlockState {
    active: bool,
    language: Option<String>,
    buffer: String,
}

impl CodeBlockState {
    /// Start a new code block with optional language.
    pub(crate) fn start(&mut self, language: Option<String>) {
        self.active = true;
        self.language = language;
        self.buffer.clear();
    }

    /// End the current code block and return (language, content).
    pub(crate) fn end(&mut self) -> (Option<String>, String) {
        self.active = false;
        (self.language.take(), std::mem::take(&mut self.buffer))
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn push_str(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    pub(crate) fn push_newline(&mut self) {
        self.buffer.push('\n');
    }
}

/// State for tracking table rendering.
#[derive(Default)]
pub(crate) struct TableState {
    in_head: bool,
    alignments: Vec<Alignment>,
    cell_index: usize,
}

impl TableState {
    pub(crate) fn start(&mut self, alignments: Vec<Alignment>) {
        self.alignments = alignments;
        self.in_head = false;
        self.cell_index = 0;
    }

    pub(crate) fn start_head(&mut self) {
        self.in_head = true;
        self.cell_index = 0;
    }

    pub(crate) fn end_head(&mut self) {
        self.in_head = false;
    }

    pub(crate) fn start_row(&mut self) {
        self.cell_index = 0;
    }

    pub(crate) fn next_cell(&mut self) {
        self.cell_index += 1;
    }

    pub(crate) fn is_in_head(&self) -> bool {
        self.in_head
    }

    /// Get the alignment style for the current cell.
    pub(crate) fn current_alignment_style(&self) -> &'static str {
        match self.alignments.get(self.cell_index) {
            Some(Alignment::Left) => r#" style="text-align:left""#,
            Some(Alignment::Center) => r#" style="text-align:center""#,
            Some(Alignment::Right) => r#" style="text-align:right""#,
            Some(Alignment::None) | None => "",
        }
    }
}

/// State for tracking image alt text capture.
#[derive(Default)]
pub(crate) struct ImageState {
    active: bool,
    alt_text: String,
}

impl ImageState {
    pub(crate) fn start(&mut self) {
        self.active = true;
        self.alt_text.clear();
    }

    pub(crate) fn end(&mut self) -> String {
        self.active = false;
        std::mem::take(&mut self.alt_text)
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn push_str(&mut self, text: &str) {
        self.alt_text.push_str(text);
    }
}

/// Table of contents entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TocEntry {
    /// Heading level (1-6).
    pub level: u8,
    /// Heading text.
    pub title: String,
    /// Anchor ID for linking (including any id prefix).
    pub id: String,
}

/// A heading that finished rendering.
pub(crate) struct CompletedHeading {
    pub(crate) level: u8,
    pub(crate) id: String,
    pub(crate) html: String,
}

/// State for tracking headings, ids and title extraction.
pub(crate) struct HeadingState {
    /// Whether to extract title from first H1.
    extract_title: bool,
    /// Prefix prepended to every generated id.
    id_prefix: String,
    title: Option<String>,
    /// Current heading level being processed (None if not in a heading).
    current_level: Option<u8>,
    /// Plain text of the current heading (for ToC and slug).
    text: String,
    /// HTML of the current heading (with inline formatting).
    html: String,
    toc: Vec<TocEntry>,
    /// Last suffix tried for each slug.
    id_counts: HashMap<String, usize>,
    /// Ids emitted so far, without the prefix.
    used_ids: HashSet<String>,
}

impl HeadingState {
    pub(crate) fn new(extract_title: bool, id_prefix: String) -> Self {
        Self {
            extract_title,
            id_prefix,
            title: None,
            current_level: None,
            text: String::new(),
            html: String::new(),
            toc: Vec::new(),
            id_counts: HashMap::new(),
            used_ids: HashSet::new(),
        }
    }

    pub(crate) fn set_extract_title(&mut self, extract_title: bool) {
        self.extract_title = extract_title;
    }

    pub(crate) fn set_id_prefix(&mut self, prefix: String) {
        self.id_prefix = prefix;
    }

    pub(crate) fn id_prefix(&self) -> &str {
        &self.id_prefix
    }

    /// Check if we're currently inside a heading.
    pub(crate) fn is_active(&self) -> bool {
        self.current_level.is_some()
    }

    pub(crate) fn start_heading(&mut self, level: u8) {
        self.current_level = Some(level);
        self.text.clear();
        self.html.clear();
    }

    /// Complete heading and record its table of contents entry.
    ///
    /// The first H1 becomes the title when title extraction is enabled; it is
    /// still rendered but left out of the ToC.
    pub(crate) fn complete_heading(&mut self) -> Option<CompletedHeading> {
        let level = self.current_level.take()?;
        let text = std::mem::take(&mut self.text);
        let html = std::mem::take(&mut self.html);
        let id = self.generate_id(&text);

        let is_title = self.extract_title && level == 1 && self.title.is_none();
        if is_title {
            self.title = Some(text.trim().to_owned());
        } else {
            self.toc.push(TocEntry {
                level,
                title: text.trim().to_owned(),
                id: id.clone(),
            });
        }

        Some(CompletedHeading { level, id, html })
    }

    /// Generate a unique, prefixed ID for a heading.
    fn generate_id(&mut self, text: &str) -> String {
        let base_id = slugify(text);
        let mut id = base_id.clone();
        while self.used_ids.contains(&id) {
            let count = self.id_counts.entry(base_id.clone()).or_default();
            *count += 1;
            id = format!("{base_id}-{count}");
        }
        self.used_ids.insert(id.clone());
        format!("{}{id}", self.id_prefix)
    }

    /// Append entries contributed by an embedded document.
    pub(crate) fn push_toc(&mut self, entries: Vec<TocEntry>) {
        self.toc.extend(entries);
    }

    pub(crate) fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub(crate) fn push_html(&mut self, html: &str) {
        self.html.push_str(html);
    }

    pub(crate) fn html_buffer(&mut self) -> &mut String {
        &mut self.html
    }

    pub(crate) fn take_title(&mut self) -> Option<String> {
        self.title.take()
    }

    pub(crate) fn take_toc(&mut self) -> Vec<TocEntry> {
        std::mem::take(&mut self.toc)
    }
}

/// Convert text to URL-safe slug.
///
/// Converts to lowercase, replaces whitespace/dashes/underscores with single dashes,
/// and removes other non-alphanumeric characters.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut result = String::new();
    let mut last_was_dash = true;

    for c in text.trim().chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c.to_ascii_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') {
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}
