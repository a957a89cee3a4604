//! Markdown to HTML conversion with id prefixing and block processors.

use std::collections::HashMap;
use std::fmt::Write;
use std::marker::PhantomData;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::backend::RenderBackend;
use crate::code_block::{CodeBlockProcessor, ProcessResult, parse_fence_info};
use crate::state::{CodeBlockState, HeadingState, ImageState, TableState, TocEntry, escape_html};
use crate::util::{heading_level_to_num, prefix_fragment_link};

/// Output of one document conversion.
#[derive(Clone, Debug)]
pub struct RenderResult {
    pub html: String,
    /// Text of the first H1, when title extraction is on.
    pub title: Option<String>,
    /// Headings in document order, including ones reported by nested blocks.
    pub toc: Vec<TocEntry>,
    /// Messages collected from code block processors.
    pub warnings: Vec<String>,
}

/// Converts one markdown document, writing leaf elements through `B`.
///
/// Heading id counters, the TOC and processor state all live here, so a
/// renderer is used for a single document. Fenced blocks are offered to the
/// processors in registration order; the first one that does not pass the
/// block through produces its output.
pub struct MarkdownRenderer<B: RenderBackend> {
    output: String,
    list_stack: Vec<bool>,
    code: CodeBlockState,
    table: TableState,
    image: ImageState,
    heading: HeadingState,
    pending_image: Option<(String, String)>,
    processors: Vec<Box<dyn CodeBlockProcessor>>,
    code_block_index: usize,
    pending_attrs: HashMap<String, String>,
    gfm: bool,
    _backend: PhantomData<B>,
}

impl<B: RenderBackend> MarkdownRenderer<B> {
    /// Renderer with GFM on, no prefix and no processors.
    #[must_use]
    pub fn new() -> Self {
        Self {
            output: String::with_capacity(4096),
            list_stack: Vec::new(),
            code: CodeBlockState::default(),
            table: TableState::default(),
            image: ImageState::default(),
            heading: HeadingState::new(false, String::new()),
            pending_image: None,
            processors: Vec::new(),
            code_block_index: 0,
            pending_attrs: HashMap::new(),
            gfm: true,
            _backend: PhantomData,
        }
    }

    /// Report the first H1 as [`RenderResult::title`] instead of a TOC entry.
    ///
    /// The heading itself stays in the HTML.
    #[must_use]
    pub fn with_title_extraction(mut self) -> Self {
        self.heading.set_extract_title(true);
        self
    }

    /// Prefix every generated element id.
    ///
    /// Applies to heading ids, ToC entries and same-document fragment links
    /// (`#anchor`). Processors that generate ids receive the prefix on their
    /// own construction.
    #[must_use]
    pub fn with_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.heading.set_id_prefix(prefix.into());
        self
    }

    /// Toggle tables, strikethrough and task lists (on by default).
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    #[must_use]
    pub fn parser_options(&self) -> Options {
        if self.gfm {
            Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_GFM
        } else {
            Options::empty()
        }
    }

    #[must_use]
    pub fn create_parser<'a>(&self, markdown: &'a str) -> Parser<'a> {
        Parser::new_ext(markdown, self.parser_options())
    }

    /// Parse `markdown` with [`parser_options`](Self::parser_options) and render it.
    pub fn render_markdown(&mut self, markdown: &str) -> RenderResult {
        self.render(self.create_parser(markdown))
    }

    #[must_use]
    pub fn with_processor<P: CodeBlockProcessor + 'static>(mut self, processor: P) -> Self {
        self.processors.push(Box::new(processor));
        self
    }

    /// Register a processor built elsewhere, such as by a stage factory.
    pub fn push_processor(&mut self, processor: Box<dyn CodeBlockProcessor>) {
        self.processors.push(processor);
    }

    pub fn processor_warnings(&self) -> impl Iterator<Item = String> + '_ {
        self.processors.iter().flat_map(|p| p.warnings()).cloned()
    }

    /// Inline markup goes to the heading buffer while a heading is open.
    fn push_inline(&mut self, content: &str) {
        if self.heading.is_active() {
            self.heading.push_html(content);
        } else {
            self.output.push_str(content);
        }
    }

    /// Render an event stream, then let each processor rewrite the full HTML.
    pub fn render<'a, I>(&mut self, events: I) -> RenderResult
    where
        I: Iterator<Item = Event<'a>>,
    {
        for event in events {
            self.process_event(event);
        }

        let mut html = std::mem::take(&mut self.output);
        for processor in &mut self.processors {
            processor.post_process(&mut html);
        }

        RenderResult {
            html,
            title: self.heading.take_title(),
            toc: self.heading.take_toc(),
            warnings: self.processor_warnings().collect(),
        }
    }

    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.inline_code(&code),
            Event::Html(html) | Event::InlineHtml(html) => self.raw_html(&html),
            Event::SoftBreak => self.soft_break(),
            Event::HardBreak => B::hard_break(&mut self.output),
            Event::Rule => B::horizontal_rule(&mut self.output),
            Event::TaskListMarker(checked) => B::task_list_marker(checked, &mut self.output),
            Event::FootnoteReference(_) | Event::InlineMath(_) | Event::DisplayMath(_) => {}
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                if !self.code.is_active() {
                    self.output.push_str("<p>");
                }
            }
            Tag::Heading { level, .. } => {
                // Opening tag is written in end_tag once the id is known.
                self.heading.start_heading(heading_level_to_num(level));
            }
            Tag::BlockQuote(_) => B::blockquote_start(&mut self.output),
            Tag::CodeBlock(kind) => {
                let (lang, attrs) = match kind {
                    CodeBlockKind::Fenced(ref info) if !info.is_empty() => {
                        let (lang, attrs) = parse_fence_info(info);
                        (if lang.is_empty() { None } else { Some(lang) }, attrs)
                    }
                    _ => (None, HashMap::new()),
                };
                self.pending_attrs = attrs;
                self.code.start(lang);
            }
            Tag::List(start) => {
                self.list_stack.push(start.is_some());
                match start {
                    Some(1) => self.output.push_str("<ol>"),
                    Some(n) => write!(self.output, r#"<ol start="{n}">"#).unwrap(),
                    None => self.output.push_str("<ul>"),
                }
            }
            Tag::Item => self.output.push_str("<li>"),
            Tag::FootnoteDefinition(_) | Tag::HtmlBlock | Tag::MetadataBlock(_) => {}
            Tag::DefinitionList => self.output.push_str("<dl>"),
            Tag::DefinitionListTitle => self.output.push_str("<dt>"),
            Tag::DefinitionListDefinition => self.output.push_str("<dd>"),
            Tag::Table(alignments) => {
                self.table.start(alignments);
                self.output.push_str("<table>");
            }
            Tag::TableHead => {
                self.table.start_head();
                self.output.push_str("<thead><tr>");
            }
            Tag::TableRow => {
                self.table.start_row();
                self.output.push_str("<tr>");
            }
            Tag::TableCell => {
                let align = self.table.current_alignment_style();
                let tag = if self.table.is_in_head() { "th" } else { "td" };
                write!(self.output, "<{tag}{align}>").unwrap();
            }
            Tag::Emphasis => self.push_inline("<em>"),
            Tag::Strong => self.push_inline("<strong>"),
            Tag::Strikethrough => self.push_inline("<s>"),
            Tag::Link { dest_url, .. } => {
                let href = prefix_fragment_link(&dest_url, self.heading.id_prefix());
                let mut link_tag = String::new();
                B::link_start(&href, &mut link_tag);
                self.push_inline(&link_tag);
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                // Alt text is collected until the end tag
                self.image.start();
                self.pending_image = Some((dest_url.to_string(), title.to_string()));
            }
            Tag::Superscript => self.push_inline("<sup>"),
            Tag::Subscript => self.push_inline("<sub>"),
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                if !self.code.is_active() {
                    self.output.push_str("</p>");
                }
            }
            TagEnd::Heading(_level) => {
                if let Some(heading) = self.heading.complete_heading() {
                    B::heading(
                        heading.level,
                        &heading.id,
                        heading.html.trim(),
                        &mut self.output,
                    );
                }
            }
            TagEnd::BlockQuote(_) => B::blockquote_end(&mut self.output),
            TagEnd::CodeBlock => self.end_code_block(),
            TagEnd::List(ordered) => {
                self.list_stack.pop();
                self.output
                    .push_str(if ordered { "</ol>" } else { "</ul>" });
            }
            TagEnd::Item => self.output.push_str("</li>"),
            TagEnd::FootnoteDefinition | TagEnd::HtmlBlock | TagEnd::MetadataBlock(_) => {}
            TagEnd::Image => {
                let alt = self.image.end();
                if let Some((src, title)) = self.pending_image.take() {
                    B::image(&src, &alt, &title, &mut self.output);
                }
            }
            TagEnd::DefinitionList => self.output.push_str("</dl>"),
            TagEnd::DefinitionListTitle => self.output.push_str("</dt>"),
            TagEnd::DefinitionListDefinition => self.output.push_str("</dd>"),
            TagEnd::Table => self.output.push_str("</tbody></table>"),
            TagEnd::TableHead => {
                self.output.push_str("</tr></thead><tbody>");
                self.table.end_head();
            }
            TagEnd::TableRow => self.output.push_str("</tr>"),
            TagEnd::TableCell => {
                self.output.push_str(if self.table.is_in_head() {
                    "</th>"
                } else {
                    "</td>"
                });
                self.table.next_cell();
            }
            TagEnd::Emphasis => self.push_inline("</em>"),
            TagEnd::Strong => self.push_inline("</strong>"),
            TagEnd::Strikethrough => self.push_inline("</s>"),
            TagEnd::Link => self.push_inline("</a>"),
            TagEnd::Superscript => self.push_inline("</sup>"),
            TagEnd::Subscript => self.push_inline("</sub>"),
        }
    }

    fn end_code_block(&mut self) {
        let (lang, content) = self.code.end();
        let attrs = std::mem::take(&mut self.pending_attrs);
        let index = self.code_block_index;
        self.code_block_index += 1;

        // Unclaimed blocks fall back to the backend.
        let processed = lang.as_ref().is_some_and(|lang_str| {
            self.processors.iter_mut().any(|processor| {
                match processor.process(lang_str, &attrs, &content, index) {
                    ProcessResult::Inline(html) => {
                        self.output.push_str(&html);
                        true
                    }
                    ProcessResult::Nested { html, headings } => {
                        self.output.push_str(&html);
                        self.heading.push_toc(headings);
                        true
                    }
                    ProcessResult::PassThrough => false,
                }
            })
        });

        if !processed {
            B::code_block(lang.as_deref(), &content, &mut self.output);
        }
    }

    fn text(&mut self, text: &str) {
        if self.code.is_active() {
            self.code.push_str(text);
        } else if self.image.is_active() {
            self.image.push_str(text);
        } else if self.heading.is_active() {
            self.heading.push_text(text);
            self.heading.push_html(&escape_html(text));
        } else {
            self.output.push_str(&escape_html(text));
        }
    }

    fn inline_code(&mut self, code: &str) {
        if self.heading.is_active() {
            self.heading.push_text(code);
            write!(
                self.heading.html_buffer(),
                "<code>{}</code>",
                escape_html(code)
            )
            .unwrap();
        } else {
            write!(self.output, "<code>{}</code>", escape_html(code)).unwrap();
        }
    }

    fn raw_html(&mut self, html: &str) {
        self.push_inline(html);
    }

    fn soft_break(&mut self) {
        if self.code.is_active() {
            self.code.push_newline();
        } else {
            self.push_inline("\n");
        }
    }
}

impl<B: RenderBackend> Default for MarkdownRenderer<B> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HtmlBackend;
    use pretty_assertions::assert_eq;

    fn render_html(markdown: &str) -> RenderResult {
        MarkdownRenderer::<HtmlBackend>::new().render_markdown(markdown)
    }

    #[test]
    fn test_html_basic_paragraph() {
        let result = render_html("Hello, world!");
        assert_eq!(result.html, "<p>Hello, world!</p>");
    }

    #[test]
    fn test_html_heading_with_id() {
        let result = render_html("## Section Title");
        assert_eq!(result.html, r#"<h2 id="section-title">Section Title</h2>"#);
        assert_eq!(result.toc.len(), 1);
        assert_eq!(result.toc[0].level, 2);
        assert_eq!(result.toc[0].title, "Section Title");
        assert_eq!(result.toc[0].id, "section-title");
    }

    #[test]
    fn test_heading_with_id_prefix() {
        let result = MarkdownRenderer::<HtmlBackend>::new()
            .with_id_prefix("tizk-7--")
            .render_markdown("## Grid\n\n## Grid");
        assert_eq!(
            result.html,
            r#"<h2 id="tizk-7--grid">Grid</h2><h2 id="tizk-7--grid-1">Grid</h2>"#
        );
        assert_eq!(result.toc[1].id, "tizk-7--grid-1");
    }

    #[test]
    fn test_fragment_link_with_id_prefix() {
        let result = MarkdownRenderer::<HtmlBackend>::new()
            .with_id_prefix("tizk-7--")
            .render_markdown("[up](#grid) and [out](https://example.com)");
        assert!(result.html.contains(r##"<a href="#tizk-7--grid">up</a>"##));
        assert!(
            result
                .html
                .contains(r#"<a href="https://example.com">out</a>"#)
        );
    }

    #[test]
    fn test_quoted_prefix_is_escaped_in_heading_and_link() {
        let result = MarkdownRenderer::<HtmlBackend>::new()
            .with_id_prefix("a\"b-")
            .render_markdown("[up](#h)\n\n## H");
        assert_eq!(
            result.html,
            r##"<p><a href="#a&quot;b-h">up</a></p><h2 id="a&quot;b-h">H</h2>"##
        );
        assert_eq!(result.toc[0].id, "a\"b-h");
    }

    #[test]
    fn test_html_title_extraction() {
        let result = MarkdownRenderer::<HtmlBackend>::new()
            .with_title_extraction()
            .render_markdown("# My Title\n\nSome content\n\n## Section");

        assert_eq!(result.title, Some("My Title".to_owned()));
        assert!(result.html.contains(r#"<h1 id="my-title">My Title</h1>"#));
        assert_eq!(result.toc.len(), 1);
        assert_eq!(result.toc[0].level, 2);
    }

    #[test]
    fn test_html_code_block() {
        let result = render_html("```latex\n\\draw (0,0) -- (1,1);\n```");
        assert!(result.html.contains(r#"class="language-latex""#));
        assert!(result.html.contains("\\draw (0,0) -- (1,1);"));
    }

    #[test]
    fn test_raw_html_passes_through() {
        let result = render_html("<div class=\"figure\">\n<svg/>\n</div>");
        assert!(result.html.contains("<svg/>"));
    }

    #[test]
    fn test_html_table() {
        let result = render_html("| A | B |\n|---|---|\n| 1 | 2 |");
        assert!(result.html.contains("<table>"));
        assert!(result.html.contains("<th>"));
        assert!(result.html.contains("<td>"));
    }

    #[test]
    fn test_gfm_disabled() {
        let mut renderer = MarkdownRenderer::<HtmlBackend>::new().with_gfm(false);
        let result = renderer.render_markdown("| A | B |\n|---|---|\n| 1 | 2 |");
        assert!(!result.html.contains("<table>"));
    }

    #[test]
    fn test_heading_with_inline_code() {
        let result = render_html("## Install `lualatex`");
        assert!(result.html.contains("<code>lualatex</code>"));
        assert_eq!(result.toc[0].title, "Install lualatex");
    }

    #[test]
    fn test_task_list_html() {
        let result = render_html("- [ ] Unchecked\n- [x] Checked");
        assert!(result.html.contains(r#"<input type="checkbox" disabled>"#));
        assert!(
            result
                .html
                .contains(r#"<input type="checkbox" checked disabled>"#)
        );
    }

    /// Marks `figure` blocks and fills them in once the document is rendered.
    #[derive(Default)]
    struct FigureProcessor {
        seen: Vec<(usize, String)>,
    }

    impl CodeBlockProcessor for FigureProcessor {
        fn process(
            &mut self,
            language: &str,
            attrs: &HashMap<String, String>,
            _source: &str,
            index: usize,
        ) -> ProcessResult {
            if language == "figure" {
                let format = attrs.get("format").cloned().unwrap_or_default();
                self.seen.push((index, format));
                ProcessResult::Inline(format!("<!--figure-{index}-->"))
            } else {
                ProcessResult::PassThrough
            }
        }

        fn post_process(&mut self, html: &mut String) {
            for (index, format) in &self.seen {
                *html = html.replace(
                    &format!("<!--figure-{index}-->"),
                    &format!(r#"<figure data-index="{index}" data-format="{format}"></figure>"#),
                );
            }
        }
    }

    struct NestedProcessor;

    impl CodeBlockProcessor for NestedProcessor {
        fn process(
            &mut self,
            language: &str,
            _attrs: &HashMap<String, String>,
            _source: &str,
            _index: usize,
        ) -> ProcessResult {
            if language == "nested" {
                ProcessResult::Nested {
                    html: r#"<h3 id="n-1--inner">Inner</h3>"#.to_owned(),
                    headings: vec![TocEntry {
                        level: 3,
                        title: "Inner".to_owned(),
                        id: "n-1--inner".to_owned(),
                    }],
                }
            } else {
                ProcessResult::PassThrough
            }
        }
    }

    #[test]
    fn test_processor_post_process() {
        let mut renderer =
            MarkdownRenderer::<HtmlBackend>::new().with_processor(FigureProcessor::default());
        let result = renderer.render_markdown("Intro\n\n```figure format=svg\nA -> B\n```");

        assert_eq!(
            result.html,
            r#"<p>Intro</p><figure data-index="0" data-format="svg"></figure>"#
        );
    }

    #[test]
    fn test_processor_passthrough() {
        let mut renderer =
            MarkdownRenderer::<HtmlBackend>::new().with_processor(FigureProcessor::default());
        let result = renderer.render_markdown("```rust\nfn main() {}\n```");
        assert!(result.html.contains(r#"class="language-rust""#));
    }

    #[test]
    fn test_code_block_index_counts_all_blocks() {
        let mut renderer =
            MarkdownRenderer::<HtmlBackend>::new().with_processor(FigureProcessor::default());
        let result = renderer.render_markdown("```rust\nx\n```\n\n```figure\ny\n```");
        assert!(
            result
                .html
                .ends_with(r#"<figure data-index="1" data-format=""></figure>"#)
        );
    }

    #[test]
    fn test_nested_result_extends_toc_in_order() {
        let mut renderer = MarkdownRenderer::<HtmlBackend>::new();
        renderer.push_processor(Box::new(NestedProcessor));
        let result = renderer.render_markdown("## Before\n\n```nested\nx\n```\n\n## After");

        assert!(result.html.contains(r#"<h3 id="n-1--inner">Inner</h3>"#));
        let ids: Vec<_> = result.toc.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["before", "n-1--inner", "after"]);
    }

    #[test]
    fn test_render_result_empty_warnings_by_default() {
        let result = render_html("Hello");
        assert!(result.warnings.is_empty());
    }
}
