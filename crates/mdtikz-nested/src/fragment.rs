//! Markdown fragments pairing source code with its rendered result.

/// Fenced code block with the given language.
#[must_use]
pub fn code_block(language: &str, code: &str) -> String {
    format!("```{language}\n{code}\n```")
}

/// Tab group markdown for `(title, body)` pairs, in order.
///
/// Titles have `\|` unescaped to `|` and are trimmed. Bodies are indented by
/// four spaces; whitespace-only lines are left as they are.
///
/// ```
/// use mdtikz_nested::tabbed;
///
/// let text = tabbed([("Figure", "out"), ("Code", "a\n\nb")]);
/// assert_eq!(text, "=== \"Figure\"\n    out\n\n=== \"Code\"\n    a\n\n    b\n");
/// ```
pub fn tabbed<'a, I>(tabs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut parts = Vec::new();
    for (title, body) in tabs {
        let title = title.replace(r"\|", "|");
        parts.push(format!("=== \"{}\"", title.trim()));
        parts.push(indent(body, "    "));
        parts.push(String::new());
    }
    parts.join("\n")
}

fn indent(text: &str, prefix: &str) -> String {
    let mut out = String::with_capacity(text.len() + prefix.len() * 4);
    for line in text.split_inclusive('\n') {
        if !line.trim().is_empty() {
            out.push_str(prefix);
        }
        out.push_str(line);
    }
    out
}

/// Titles of the two tabs produced by [`SourceTabs::add_source`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceTabs {
    pub source_title: String,
    pub result_title: String,
}

impl Default for SourceTabs {
    fn default() -> Self {
        Self {
            source_title: "Code".to_owned(),
            result_title: "Figure".to_owned(),
        }
    }
}

impl SourceTabs {
    #[must_use]
    pub fn new(source_title: impl Into<String>, result_title: impl Into<String>) -> Self {
        Self {
            source_title: source_title.into(),
            result_title: result_title.into(),
        }
    }

    /// Result tab first, then the source as a fenced code block.
    #[must_use]
    pub fn add_source(&self, source: &str, output: &str, language: &str) -> String {
        let code = code_block(language, source);
        tabbed([
            (self.result_title.as_str(), output),
            (self.source_title.as_str(), code.as_str()),
        ])
    }
}
